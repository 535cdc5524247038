//! Protocol error types.
//!
//! One enum covers both layers: framing errors raised while decoding
//! bytes into frames (fatal to the connection — the stream has no safe
//! resync point), and command-shape errors raised while interpreting a
//! well-framed array as a command (recoverable — the client gets an
//! error reply and the connection stays open).

use thiserror::Error;

/// Errors that can occur when parsing the RESP wire format or
/// interpreting a frame as a command.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    /// The input buffer doesn't contain a complete frame yet.
    /// The caller should read more data and try again.
    #[error("incomplete frame: need more data")]
    Incomplete,

    /// The first byte of a frame didn't match any known RESP type prefix.
    #[error("invalid type prefix: {0:#04x}")]
    InvalidPrefix(u8),

    /// Failed to parse an integer value from the frame content.
    #[error("invalid integer encoding")]
    InvalidInteger,

    /// A bulk string or array declared an invalid length. Exactly -1 is
    /// the nil sentinel; any other negative length is a framing error.
    #[error("invalid frame length: {0}")]
    InvalidFrameLength(i64),

    /// A bulk string payload was not followed by exactly `\r\n`.
    #[error("bulk string not terminated by CRLF")]
    InvalidTerminator,

    /// Arrays nested deeper than the parser allows.
    #[error("frame nesting exceeds {0} levels")]
    NestingTooDeep(usize),

    /// An array declared more elements than the parser allows.
    #[error("array declares too many elements: {0}")]
    TooManyElements(usize),

    /// A bulk string declared a length beyond the allowed maximum.
    #[error("bulk string too large: {0} bytes")]
    BulkStringTooLarge(usize),

    /// A well-framed array could not be interpreted as a command:
    /// wrong element types, malformed options, or bad argument values.
    #[error("ERR {0}")]
    InvalidCommandFrame(String),

    /// A known command was called with the wrong number of arguments.
    #[error("ERR wrong number of arguments for '{0}' command")]
    WrongArity(String),

    /// The command name is not one we implement.
    #[error("ERR unknown command '{0}'")]
    UnknownCommand(String),
}
