//! TCP server: accept loop and client wiring.
//!
//! Binds the listener, spawns the dispatcher, and accepts connections
//! until the shutdown watch flips. Each accepted socket gets a fresh
//! client id, a bounded reply queue, and a reader/writer task pair.

use std::net::SocketAddr;

use bytes::Bytes;
use cinder_core::Store;
use tokio::net::TcpListener;
use tokio::sync::{mpsc, watch};
use tracing::{error, info};

use crate::connection;
use crate::dispatcher::{self, ClientHandle, Event};

/// Capacity of the dispatcher's inbound event queue.
const EVENT_QUEUE: usize = 1024;

/// Binds to `addr` and runs the accept loop until shutdown.
pub async fn run(
    addr: SocketAddr,
    store: Store,
    send_queue: usize,
    shutdown: watch::Receiver<bool>,
) -> std::io::Result<()> {
    let listener = TcpListener::bind(addr).await?;
    info!(%addr, "listening");

    let (events_tx, events_rx) = mpsc::channel(EVENT_QUEUE);
    let dispatcher = tokio::spawn(dispatcher::run(store, events_rx, shutdown.clone()));

    let mut next_id: u64 = 0;
    let mut accept_shutdown = shutdown.clone();

    loop {
        tokio::select! {
            accepted = listener.accept() => {
                let (stream, peer) = match accepted {
                    Ok(pair) => pair,
                    Err(e) => {
                        error!("failed to accept connection: {e}");
                        continue;
                    }
                };

                next_id += 1;
                let id = next_id;
                info!(client = id, %peer, "client connected");

                let (reply_tx, reply_rx) = mpsc::channel::<Bytes>(send_queue);
                let handle = ClientHandle { id, sender: reply_tx.clone() };
                if events_tx.send(Event::Register(handle)).await.is_err() {
                    break; // dispatcher is gone
                }

                let (read_half, write_half) = stream.into_split();
                tokio::spawn(connection::write_loop(write_half, id, reply_rx));
                tokio::spawn(connection::read_loop(
                    read_half,
                    id,
                    events_tx.clone(),
                    reply_tx,
                    shutdown.clone(),
                ));
            }
            _ = accept_shutdown.changed() => {
                info!("accept loop stopping");
                break;
            }
        }
    }

    // readers exit via the shutdown watch; once their event senders are
    // gone the dispatcher drains and returns
    drop(events_tx);
    let _ = dispatcher.await;
    Ok(())
}
