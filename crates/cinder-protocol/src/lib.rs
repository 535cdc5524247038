//! cinder-protocol: RESP wire protocol implementation.
//!
//! Provides incremental parsing and direct-to-buffer serialization of
//! the RESP protocol used for client-server communication, plus the
//! command layer that turns a parsed frame into a typed [`Command`].
//!
//! # quick start
//!
//! ```
//! use bytes::BytesMut;
//! use cinder_protocol::{parse_frame, Frame};
//!
//! // parse a simple string
//! let input = b"+OK\r\n";
//! let (frame, consumed) = parse_frame(input).unwrap().unwrap();
//! assert_eq!(frame, Frame::Simple("OK".into()));
//!
//! // serialize a frame
//! let mut buf = BytesMut::new();
//! frame.serialize(&mut buf);
//! assert_eq!(&buf[..], b"+OK\r\n");
//! ```

pub mod command;
pub mod error;
pub mod parse;
mod serialize;
pub mod types;

pub use command::{Command, SetCondition, SetExpire};
pub use error::ProtocolError;
pub use parse::parse_frame;
pub use types::Frame;
