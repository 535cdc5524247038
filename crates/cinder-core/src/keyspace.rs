//! The keyspace: cinder's core key-value state.
//!
//! A `Keyspace` owns a flat `AHashMap<Bytes, Entry>` plus an index of
//! the keys that currently carry an expiration. Keys are opaque byte
//! strings — compared and hashed by raw bytes, never required to be
//! UTF-8. All operations here are single-threaded; concurrent access
//! goes through [`crate::store::Store`].
//!
//! Expired entries are removed lazily by mutating operations and by the
//! bounded [`Keyspace::sweep`] that the background task runs. Read
//! operations treat an expired entry as absent and leave the removal to
//! the next writer or sweep.

use std::collections::VecDeque;
use std::time::Duration;

use ahash::{AHashMap, AHashSet};
use bytes::Bytes;
use rand::seq::IteratorRandom;

use crate::error::WrongType;
use crate::time;
use crate::types::{normalize_range, Value};

/// Outcome of a SET: applied, or blocked by an NX/XX precondition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetOutcome {
    /// The entry was created or replaced.
    Applied,
    /// The NX/XX condition was not met; nothing changed.
    Blocked,
}

/// A single entry: a tagged value plus an absolute expiration timestamp
/// (0 = never).
#[derive(Debug, Clone)]
struct Entry {
    value: Value,
    expires_at_ns: u64,
}

impl Entry {
    fn new(value: Value, ttl: Option<Duration>) -> Self {
        Self {
            value,
            expires_at_ns: time::expiry_from_ttl(ttl),
        }
    }

    fn is_expired(&self) -> bool {
        time::is_expired(self.expires_at_ns)
    }
}

/// The core key-value store. Single-threaded; no internal locking.
pub struct Keyspace {
    entries: AHashMap<Bytes, Entry>,
    /// Keys with a non-zero expiration. A superset of the truly-expiring
    /// keys — stale members are pruned when the sweep visits them.
    expirable: AHashSet<Bytes>,
}

impl Keyspace {
    /// Creates a new, empty keyspace.
    pub fn new() -> Self {
        Self {
            entries: AHashMap::new(),
            expirable: AHashSet::new(),
        }
    }

    /// Stores a key as a string entry, creating or replacing.
    ///
    /// - `nx`: only set if the key does NOT already exist
    /// - `xx`: only set if the key DOES already exist
    ///
    /// Replacing an existing key of any type resets both value and
    /// expiration; a `ttl` of `None` clears any prior expiration.
    /// Expired entries count as absent for the NX/XX checks.
    pub fn set(
        &mut self,
        key: Bytes,
        value: Bytes,
        ttl: Option<Duration>,
        nx: bool,
        xx: bool,
    ) -> SetOutcome {
        let exists = self
            .entries
            .get(&key)
            .map(|e| !e.is_expired())
            .unwrap_or(false);
        if (nx && exists) || (xx && !exists) {
            return SetOutcome::Blocked;
        }

        if ttl.is_some() {
            self.expirable.insert(key.clone());
        } else {
            self.expirable.remove(&key);
        }
        self.entries
            .insert(key, Entry::new(Value::String(value), ttl));
        SetOutcome::Applied
    }

    /// Retrieves the string value for `key`, or `None` if missing or
    /// expired. Returns `Err(WrongType)` if the key holds a list.
    pub fn get(&self, key: &[u8]) -> Result<Option<Bytes>, WrongType> {
        match self.entries.get(key) {
            Some(e) if e.is_expired() => Ok(None),
            Some(e) => match &e.value {
                Value::String(data) => Ok(Some(data.clone())),
                Value::List(_) => Err(WrongType),
            },
            None => Ok(None),
        }
    }

    /// Removes a key. Returns `true` if a live entry was removed.
    ///
    /// Any expirable-index member is left behind for the sweep to prune.
    pub fn del(&mut self, key: &[u8]) -> bool {
        if self.remove_if_expired(key) {
            return false;
        }
        self.entries.remove(key).is_some()
    }

    /// Returns `true` if the key exists and hasn't expired.
    pub fn exists(&self, key: &[u8]) -> bool {
        self.entries
            .get(key)
            .map(|e| !e.is_expired())
            .unwrap_or(false)
    }

    /// Sets an expiration on an existing key. Returns `true` if the key
    /// is present and not expired (and the TTL was applied).
    pub fn expire(&mut self, key: &Bytes, ttl: Duration) -> bool {
        if self.remove_if_expired(key) {
            return false;
        }
        match self.entries.get_mut(key.as_ref()) {
            Some(entry) => {
                entry.expires_at_ns = time::expiry_from_ttl(Some(ttl));
                self.expirable.insert(key.clone());
                true
            }
            None => false,
        }
    }

    /// Pushes one or more values onto a list, creating it if absent.
    ///
    /// A fresh list never starts with an expiration, including one that
    /// replaces an entry removed by lazy expiry. With `front` set the
    /// values are pushed one-by-one onto the head, so `a b c` ends up as
    /// `c b a`; otherwise they are appended in order. Returns the new
    /// length, or `Err(WrongType)` if the key holds a string.
    pub fn push(
        &mut self,
        key: &Bytes,
        values: &[Bytes],
        front: bool,
    ) -> Result<usize, WrongType> {
        self.remove_if_expired(key.as_ref());

        let entry = self
            .entries
            .entry(key.clone())
            .or_insert_with(|| Entry::new(Value::List(VecDeque::new()), None));
        let Value::List(deque) = &mut entry.value else {
            return Err(WrongType);
        };

        for val in values {
            if front {
                deque.push_front(val.clone());
            } else {
                deque.push_back(val.clone());
            }
        }
        Ok(deque.len())
    }

    /// Pops a value from the head (`front`) or tail of a list.
    ///
    /// Returns `Ok(None)` if the key is absent, expired, or the list is
    /// empty. An emptied list keeps its entry and its type: LLEN sees 0
    /// and GET still answers WRONGTYPE.
    pub fn pop(&mut self, key: &[u8], front: bool) -> Result<Option<Bytes>, WrongType> {
        if self.remove_if_expired(key) {
            return Ok(None);
        }
        let Some(entry) = self.entries.get_mut(key) else {
            return Ok(None);
        };
        let Value::List(deque) = &mut entry.value else {
            return Err(WrongType);
        };

        Ok(if front {
            deque.pop_front()
        } else {
            deque.pop_back()
        })
    }

    /// Returns the length of a list, or 0 if the key is absent/expired.
    pub fn llen(&self, key: &[u8]) -> Result<usize, WrongType> {
        match self.entries.get(key) {
            Some(e) if e.is_expired() => Ok(0),
            Some(e) => match &e.value {
                Value::List(deque) => Ok(deque.len()),
                Value::String(_) => Err(WrongType),
            },
            None => Ok(0),
        }
    }

    /// Returns a range of list elements over an inclusive signed range.
    ///
    /// `None` when the key is absent or expired. Negative indices count
    /// from the tail; start clamps to 0, stop to `len - 1`; an inverted
    /// range after clamping is empty.
    pub fn lrange(
        &self,
        key: &[u8],
        start: i64,
        stop: i64,
    ) -> Result<Option<Vec<Bytes>>, WrongType> {
        match self.entries.get(key) {
            Some(entry) if entry.is_expired() => Ok(None),
            Some(entry) => match &entry.value {
                Value::List(deque) => {
                    let len = deque.len() as i64;
                    let (s, e) = normalize_range(start, stop, len);
                    // inverted after clamping: out-of-bounds start or
                    // the empty-list case
                    if s > e {
                        return Ok(Some(vec![]));
                    }
                    Ok(Some(
                        deque
                            .iter()
                            .skip(s as usize)
                            .take((e - s + 1) as usize)
                            .cloned()
                            .collect(),
                    ))
                }
                Value::String(_) => Err(WrongType),
            },
            None => Ok(None),
        }
    }

    /// Runs one bounded sweep pass.
    ///
    /// Samples up to `batch` keys from the expirable index, evicts those
    /// that have expired, and prunes index members whose entry has
    /// vanished or no longer carries an expiration. Returns the number
    /// of keys evicted.
    pub fn sweep(&mut self, batch: usize) -> usize {
        if self.expirable.is_empty() {
            return 0;
        }

        let mut rng = rand::rng();
        let sampled: Vec<Bytes> = self
            .expirable
            .iter()
            .choose_multiple(&mut rng, batch)
            .into_iter()
            .cloned()
            .collect();

        let mut removed = 0;
        for key in &sampled {
            if self.remove_if_expired(key.as_ref()) {
                self.expirable.remove(key);
                removed += 1;
                continue;
            }
            // stale index member: the key was deleted or its expiration
            // was cleared since it was indexed
            let live = self
                .entries
                .get(key.as_ref())
                .map(|e| e.expires_at_ns != time::NO_EXPIRY)
                .unwrap_or(false);
            if !live {
                self.expirable.remove(key);
            }
        }
        removed
    }

    /// Returns the number of entries, including any not yet swept.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if the keyspace has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns the size of the expirable index, stale members included.
    pub fn expirable_len(&self) -> usize {
        self.expirable.len()
    }

    /// Checks if a key is expired and removes it if so. Returns `true`
    /// if an expired entry was removed.
    ///
    /// Only the entry is removed; the expirable index keeps its member
    /// until a sweep visits it.
    fn remove_if_expired(&mut self, key: &[u8]) -> bool {
        let expired = self
            .entries
            .get(key)
            .map(|e| e.is_expired())
            .unwrap_or(false);

        if expired {
            self.entries.remove(key);
        }
        expired
    }
}

impl Default for Keyspace {
    fn default() -> Self {
        Self::new()
    }
}
