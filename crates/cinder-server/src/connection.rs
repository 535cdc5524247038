//! Per-connection reader and writer tasks.
//!
//! The reader owns the read half: it parses complete frames out of a
//! growing buffer (so pipelined commands in a single read all get
//! processed), requires each top-level frame to be a non-empty array,
//! and forwards typed commands to the dispatcher. The writer owns the
//! write half and drains a bounded queue of encoded replies, flushing
//! after each.
//!
//! Error handling follows the protocol taxonomy: a command-shape error
//! gets an error reply and the connection stays open; a framing error
//! gets one error reply and then the connection closes, because the
//! byte stream is no longer at a safe resync point.

use bytes::{Bytes, BytesMut};
use cinder_protocol::{parse_frame, Command, Frame};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::sync::{mpsc, watch};
use tracing::{debug, error};

use crate::dispatcher::Event;

/// Initial read buffer capacity. 4KB covers most commands comfortably.
const BUF_CAPACITY: usize = 4096;

/// Maximum buffered bytes for a single frame before the client is cut
/// off. Prevents a slow or malicious client from consuming unbounded
/// memory with an incomplete frame.
const MAX_BUF_SIZE: usize = 64 * 1024 * 1024;

/// Drives the read side of one client connection to completion.
///
/// Exits on client disconnect, framing error, server shutdown, or
/// dispatcher teardown, and deregisters the client on the way out.
pub async fn read_loop(
    mut stream: OwnedReadHalf,
    client: u64,
    events: mpsc::Sender<Event>,
    replies: mpsc::Sender<Bytes>,
    mut shutdown: watch::Receiver<bool>,
) {
    let mut buf = BytesMut::with_capacity(BUF_CAPACITY);

    'conn: loop {
        if buf.len() > MAX_BUF_SIZE {
            send_error(&replies, client, "ERR max buffer size exceeded, closing connection");
            break;
        }

        tokio::select! {
            read = stream.read_buf(&mut buf) => match read {
                Ok(0) => {
                    // clean disconnect; leftover bytes are a short read
                    if !buf.is_empty() {
                        debug!(client, "connection closed mid-frame");
                    }
                    break;
                }
                Ok(_) => {}
                Err(e) => {
                    debug!(client, "read error: {e}");
                    break;
                }
            },
            _ = shutdown.changed() => break,
        }

        // drain every complete frame in the buffer (pipelining)
        loop {
            match parse_frame(&buf) {
                Ok(Some((frame, consumed))) => {
                    let _ = buf.split_to(consumed);
                    if !handle_frame(frame, client, &events, &replies).await {
                        break 'conn;
                    }
                }
                Ok(None) => break, // need more data
                Err(e) => {
                    send_error(&replies, client, &format!("ERR protocol error: {e}"));
                    break 'conn;
                }
            }
        }
    }

    let _ = events.send(Event::Deregister(client)).await;
}

/// Interprets one top-level frame. Returns `false` when the connection
/// must close.
async fn handle_frame(
    frame: Frame,
    client: u64,
    events: &mpsc::Sender<Event>,
    replies: &mpsc::Sender<Bytes>,
) -> bool {
    // a request must be a non-empty array; anything else means the
    // client is not speaking the request protocol
    if !matches!(&frame, Frame::Array(items) if !items.is_empty()) {
        send_error(replies, client, "ERR expected a non-empty command array");
        return false;
    }

    match Command::from_frame(frame) {
        Ok(command) => events
            .send(Event::Command { client, command })
            .await
            .is_ok(),
        Err(e) => {
            // shape errors are recoverable: reply and keep reading
            send_error(replies, client, &e.to_string());
            true
        }
    }
}

/// Drives the write side of one client connection.
///
/// Exits when every sender for the reply queue is gone (reader finished
/// and dispatcher dropped its handle) or the socket fails.
pub async fn write_loop(mut stream: OwnedWriteHalf, client: u64, mut replies: mpsc::Receiver<Bytes>) {
    while let Some(msg) = replies.recv().await {
        if let Err(e) = stream.write_all(&msg).await {
            debug!(client, "write error: {e}");
            break;
        }
        if let Err(e) = stream.flush().await {
            debug!(client, "flush error: {e}");
            break;
        }
    }
}

/// Encodes an error frame and queues it without blocking.
fn send_error(replies: &mpsc::Sender<Bytes>, client: u64, msg: &str) {
    let mut buf = BytesMut::new();
    Frame::Error(msg.into()).serialize(&mut buf);
    if replies.try_send(buf.freeze()).is_err() {
        error!(client, "failed to queue error reply");
    }
}
