//! The dispatcher: single consumer of the inbound command queue.
//!
//! One task owns the set of connected clients and serializes command
//! execution. Readers enqueue commands in arrival order and the
//! per-client writer preserves reply order, so commands and replies on
//! a single connection stay in lockstep; no ordering is promised across
//! connections.
//!
//! On shutdown the dispatcher closes the store (which releases the
//! sweep task), drops every client handle (ending the writer tasks),
//! and returns.

use std::collections::HashMap;
use std::time::Duration;

use bytes::{Bytes, BytesMut};
use cinder_core::{SetOutcome, Store, WrongType};
use cinder_protocol::{Command, Frame, SetCondition, SetExpire};
use tokio::sync::{mpsc, watch};
use tracing::{debug, error, info};

/// A connected client as the dispatcher sees it: an id for the map and
/// the sender side of its writer queue.
#[derive(Debug)]
pub struct ClientHandle {
    pub id: u64,
    pub sender: mpsc::Sender<Bytes>,
}

/// Events flowing into the dispatcher from the accept loop and the
/// reader tasks.
#[derive(Debug)]
pub enum Event {
    /// A new connection was accepted.
    Register(ClientHandle),
    /// A reader task finished; forget the client.
    Deregister(u64),
    /// A parsed command from one client.
    Command { client: u64, command: Command },
}

/// Runs the dispatch loop until shutdown or until every event sender is
/// gone.
pub async fn run(store: Store, mut events: mpsc::Receiver<Event>, mut shutdown: watch::Receiver<bool>) {
    let mut clients: HashMap<u64, mpsc::Sender<Bytes>> = HashMap::new();

    loop {
        tokio::select! {
            event = events.recv() => match event {
                Some(Event::Register(client)) => {
                    debug!(client = client.id, "client registered");
                    clients.insert(client.id, client.sender);
                }
                Some(Event::Deregister(id)) => {
                    debug!(client = id, "client deregistered");
                    clients.remove(&id);
                }
                Some(Event::Command { client, command }) => {
                    let reply = execute(&store, command);
                    if let Some(sender) = clients.get(&client) {
                        send_reply(sender, client, &reply);
                    }
                }
                None => break, // every sender dropped — server is done
            },
            _ = shutdown.changed() => {
                info!("dispatcher shutting down");
                store.close();
                clients.clear();
                break;
            }
        }
    }
}

/// Executes a command against the store and builds the reply frame.
fn execute(store: &Store, command: Command) -> Frame {
    match command {
        Command::Ping(None) => Frame::Simple("PONG".into()),
        Command::Ping(Some(msg)) => Frame::Simple(msg),

        Command::Set {
            key,
            value,
            condition,
            expire,
        } => {
            let ttl = expire.map(|e| match e {
                SetExpire::Ex(secs) => Duration::from_secs(secs),
                SetExpire::Px(millis) => Duration::from_millis(millis),
            });
            let (nx, xx) = match condition {
                Some(SetCondition::Nx) => (true, false),
                Some(SetCondition::Xx) => (false, true),
                None => (false, false),
            };
            match store.set(key, value, ttl, nx, xx) {
                SetOutcome::Applied => Frame::Simple("OK".into()),
                // precondition failure is success-shaped on the wire:
                // a nil bulk string, not an error
                SetOutcome::Blocked => Frame::Null,
            }
        }

        Command::Get { key } => match store.get(&key) {
            Ok(Some(data)) => Frame::Bulk(data),
            Ok(None) => Frame::Null,
            Err(e) => wrong_type(e),
        },

        Command::Del { keys } => Frame::Integer(store.del(&keys)),

        Command::Exists { keys } => Frame::Integer(store.exists(&keys)),

        Command::Expire { key, ttl } => Frame::Integer(i64::from(store.expire(&key, ttl))),

        Command::Push { key, values, front } => match store.push(&key, &values, front) {
            Ok(len) => Frame::Integer(len as i64),
            Err(e) => wrong_type(e),
        },

        Command::Pop { key, front } => match store.pop(&key, front) {
            Ok(Some(data)) => Frame::Bulk(data),
            Ok(None) => Frame::Null,
            Err(e) => wrong_type(e),
        },

        Command::LLen { key } => match store.llen(&key) {
            Ok(len) => Frame::Integer(len as i64),
            Err(e) => wrong_type(e),
        },

        Command::LRange { key, start, stop } => match store.lrange(&key, start, stop) {
            Ok(Some(items)) => Frame::Array(items.into_iter().map(Frame::Bulk).collect()),
            Ok(None) => Frame::NullArray,
            Err(e) => wrong_type(e),
        },
    }
}

fn wrong_type(err: WrongType) -> Frame {
    Frame::Error(err.to_string())
}

/// Encodes a reply and queues it on the client's writer without
/// blocking. A full queue drops the reply — one slow client must not
/// stall the dispatcher for everyone else.
fn send_reply(sender: &mpsc::Sender<Bytes>, client: u64, frame: &Frame) {
    let mut buf = BytesMut::new();
    frame.serialize(&mut buf);
    match sender.try_send(buf.freeze()) {
        Ok(()) => {}
        Err(mpsc::error::TrySendError::Full(_)) => {
            error!(client, "reply queue full, dropping reply");
        }
        Err(mpsc::error::TrySendError::Closed(_)) => {
            debug!(client, "reply queue closed, client is gone");
        }
    }
}
