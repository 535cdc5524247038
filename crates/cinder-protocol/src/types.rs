//! RESP frame types.
//!
//! The [`Frame`] enum represents a single parsed RESP value.
//! Bulk strings use `Bytes` for reference-counted storage that avoids
//! unnecessary copies when moving data through the pipeline.

use bytes::Bytes;

/// A single RESP protocol frame.
///
/// Five wire kinds, each tagged by a leading byte, plus the two nil
/// forms (`$-1` for a nil bulk string, `*-1` for a nil array).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    /// Simple string response, e.g. `+OK\r\n`.
    /// Used for short, non-binary status replies.
    Simple(String),

    /// Error response, e.g. `-ERR unknown command\r\n`.
    Error(String),

    /// 64-bit signed integer, e.g. `:42\r\n`.
    Integer(i64),

    /// Bulk (binary-safe) string, e.g. `$5\r\nhello\r\n`.
    Bulk(Bytes),

    /// Ordered array of frames, e.g. `*2\r\n+hello\r\n+world\r\n`.
    /// Arrays nest.
    Array(Vec<Frame>),

    /// Nil bulk string, `$-1\r\n`. The "no value" reply for GET, LPOP
    /// and friends.
    Null,

    /// Nil array, `*-1\r\n`. The "no such list" reply for LRANGE.
    NullArray,
}

impl Frame {
    /// Returns `true` if this frame is one of the nil forms.
    pub fn is_null(&self) -> bool {
        matches!(self, Frame::Null | Frame::NullArray)
    }
}
