//! Error types for the storage engine.

use thiserror::Error;

/// Returned when an operation targets a key holding the wrong kind of
/// value — a list command against a string key, or GET against a list.
///
/// The display text is the exact message that goes on the wire.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[error("WRONGTYPE Operation against a key holding the wrong kind of value")]
pub struct WrongType;
