//! The concurrent store handle shared by every connection.
//!
//! Wraps a [`Keyspace`] in a readers/writer lock. Reads (`get`,
//! `exists`, `llen`, `lrange`) share the lock and treat expired entries
//! as absent, leaving eviction to the next mutation or the sweep.
//! Mutations take the lock exclusively and evict lazily before
//! proceeding. Lock holds are brief and never cross an await point.
//!
//! `Store::new` spawns the background sweep task; `close()` signals it
//! and turns every subsequent operation into a no-op.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Duration;

use bytes::Bytes;
use tokio::sync::Notify;

use crate::error::WrongType;
use crate::expiry;
use crate::keyspace::{Keyspace, SetOutcome};

/// Tuning for the background sweep.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// How often the sweeper wakes.
    pub sweep_interval: Duration,
    /// Maximum expirable keys inspected per pass.
    pub sweep_batch: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            sweep_interval: Duration::from_millis(250),
            sweep_batch: 25,
        }
    }
}

pub(crate) struct Shared {
    pub(crate) keyspace: RwLock<Keyspace>,
    closed: AtomicBool,
    /// Signalled once by `close()`. The sweeper waits on this rather
    /// than polling the flag, so it exits promptly on shutdown.
    pub(crate) shutdown: Notify,
}

impl Shared {
    /// Acquires the keyspace for writing, absorbing lock poisoning.
    /// Keyspace operations don't panic; a poisoned lock must not take
    /// the whole server down.
    pub(crate) fn keyspace_mut(&self) -> RwLockWriteGuard<'_, Keyspace> {
        self.keyspace.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn keyspace_ref(&self) -> RwLockReadGuard<'_, Keyspace> {
        self.keyspace.read().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Handle to the store. `Clone` is cheap (an `Arc` bump); one instance
/// is shared by the dispatcher and the sweep task.
#[derive(Clone)]
pub struct Store {
    shared: Arc<Shared>,
}

impl Store {
    /// Creates a store and spawns its sweep task.
    ///
    /// Must be called from within a tokio runtime.
    pub fn new(config: StoreConfig) -> Self {
        let shared = Arc::new(Shared {
            keyspace: RwLock::new(Keyspace::new()),
            closed: AtomicBool::new(false),
            shutdown: Notify::new(),
        });

        tokio::spawn(expiry::run(Arc::clone(&shared), config));

        Self { shared }
    }

    /// Creates or replaces a string entry. See [`Keyspace::set`].
    ///
    /// On a closed store this is a no-op that reports `Applied`.
    pub fn set(
        &self,
        key: Bytes,
        value: Bytes,
        ttl: Option<Duration>,
        nx: bool,
        xx: bool,
    ) -> SetOutcome {
        if self.is_closed() {
            return SetOutcome::Applied;
        }
        self.shared.keyspace_mut().set(key, value, ttl, nx, xx)
    }

    /// Fetches a string value. Nil on a closed store.
    pub fn get(&self, key: &[u8]) -> Result<Option<Bytes>, WrongType> {
        if self.is_closed() {
            return Ok(None);
        }
        self.shared.keyspace_ref().get(key)
    }

    /// Removes each existing entry once; returns the count removed.
    /// Duplicate keys count at most once — the second lookup sees
    /// absence.
    pub fn del(&self, keys: &[Bytes]) -> i64 {
        if self.is_closed() {
            return 0;
        }
        let mut ks = self.shared.keyspace_mut();
        keys.iter().filter(|key| ks.del(key)).count() as i64
    }

    /// Counts the input positions whose entry is present and not
    /// expired. Duplicates count each time.
    pub fn exists(&self, keys: &[Bytes]) -> i64 {
        if self.is_closed() {
            return 0;
        }
        let ks = self.shared.keyspace_ref();
        keys.iter().filter(|key| ks.exists(key)).count() as i64
    }

    /// Sets an expiration on an existing key. False if the key is
    /// missing, expired, or the store is closed.
    pub fn expire(&self, key: &Bytes, ttl: Duration) -> bool {
        if self.is_closed() {
            return false;
        }
        self.shared.keyspace_mut().expire(key, ttl)
    }

    /// Pushes values onto a list. See [`Keyspace::push`].
    pub fn push(&self, key: &Bytes, values: &[Bytes], front: bool) -> Result<usize, WrongType> {
        if self.is_closed() {
            return Ok(0);
        }
        self.shared.keyspace_mut().push(key, values, front)
    }

    /// Pops a value from a list. See [`Keyspace::pop`].
    pub fn pop(&self, key: &[u8], front: bool) -> Result<Option<Bytes>, WrongType> {
        if self.is_closed() {
            return Ok(None);
        }
        self.shared.keyspace_mut().pop(key, front)
    }

    /// Returns the length of a list, 0 when absent.
    pub fn llen(&self, key: &[u8]) -> Result<usize, WrongType> {
        if self.is_closed() {
            return Ok(0);
        }
        self.shared.keyspace_ref().llen(key)
    }

    /// Returns a clamped inclusive range of a list, `None` when the key
    /// is absent.
    pub fn lrange(
        &self,
        key: &[u8],
        start: i64,
        stop: i64,
    ) -> Result<Option<Vec<Bytes>>, WrongType> {
        if self.is_closed() {
            return Ok(None);
        }
        self.shared.keyspace_ref().lrange(key, start, stop)
    }

    /// Number of entries currently held, swept or not.
    pub fn len(&self) -> usize {
        self.shared.keyspace_ref().len()
    }

    /// Returns `true` if the store holds no entries.
    pub fn is_empty(&self) -> bool {
        self.shared.keyspace_ref().is_empty()
    }

    /// Marks the store closed and releases the sweep task. Idempotent;
    /// in-progress operations complete, later ones become no-ops.
    pub fn close(&self) {
        if !self.shared.closed.swap(true, Ordering::SeqCst) {
            self.shared.shutdown.notify_one();
        }
    }

    /// Returns `true` once `close()` has been called.
    pub fn is_closed(&self) -> bool {
        self.shared.closed.load(Ordering::SeqCst)
    }
}
