//! Command parsing from RESP frames.
//!
//! Converts a parsed [`Frame`] (expected to be a non-empty array of
//! bulk strings) into a typed [`Command`]. This keeps protocol-level
//! concerns separate from the store that actually executes commands.
//!
//! Command names are matched case-sensitively in their uppercase
//! canonical form — `get` is an unknown command, as are the lowercase
//! spellings of the SET option tokens.

use std::time::Duration;

use bytes::Bytes;

use crate::error::ProtocolError;
use crate::types::Frame;

/// Conditional clause for the SET command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetCondition {
    /// NX — only set if the key does not already exist.
    Nx,
    /// XX — only set if the key already exists.
    Xx,
}

/// Expiration option for the SET command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetExpire {
    /// EX seconds — expire after N seconds.
    Ex(u64),
    /// PX milliseconds — expire after N milliseconds.
    Px(u64),
}

/// A parsed client command, ready for execution.
///
/// Keys and values are opaque `Bytes` — binary-safe, never required to
/// be UTF-8.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// PING with an optional message. Returns PONG or echoes the message
    /// as a simple string.
    Ping(Option<String>),

    /// SET <key> <value> [NX|XX] [EX seconds | PX milliseconds].
    Set {
        key: Bytes,
        value: Bytes,
        condition: Option<SetCondition>,
        expire: Option<SetExpire>,
    },

    /// GET <key>. Returns the string value or nil.
    Get { key: Bytes },

    /// DEL <key> [key ...]. Returns the number of keys removed.
    Del { keys: Vec<Bytes> },

    /// EXISTS <key> [key ...]. Returns the number of keys that exist;
    /// duplicates count each time.
    Exists { keys: Vec<Bytes> },

    /// EXPIRE <key> <seconds> / PEXPIRE <key> <milliseconds>.
    /// The command name selects the unit; both carry a duration here.
    Expire { key: Bytes, ttl: Duration },

    /// LPUSH / RPUSH <key> <value> [value ...]. `front` is true for LPUSH.
    Push {
        key: Bytes,
        values: Vec<Bytes>,
        front: bool,
    },

    /// LPOP / RPOP <key>. `front` is true for LPOP.
    Pop { key: Bytes, front: bool },

    /// LLEN <key>. Returns the length of a list, 0 if the key is absent.
    LLen { key: Bytes },

    /// LRANGE <key> <start> <stop>. Inclusive signed range.
    LRange { key: Bytes, start: i64, stop: i64 },
}

impl Command {
    /// Parses a [`Frame`] into a [`Command`].
    ///
    /// Expects an array frame where the first element is a bulk string
    /// naming the command and every other element is a bulk string
    /// argument.
    pub fn from_frame(frame: Frame) -> Result<Command, ProtocolError> {
        let frames = match frame {
            Frame::Array(frames) => frames,
            _ => {
                return Err(ProtocolError::InvalidCommandFrame(
                    "expected array frame".into(),
                ));
            }
        };

        if frames.is_empty() {
            return Err(ProtocolError::InvalidCommandFrame(
                "empty command array".into(),
            ));
        }

        let name = extract_bulk(&frames[0])?;
        let args = &frames[1..];

        // exact match against the uppercase canonical names; a name
        // that isn't valid text can't be a command either way
        let name = String::from_utf8_lossy(&name);
        match name.as_ref() {
            "PING" => parse_ping(args),
            "SET" => parse_set(args),
            "GET" => parse_get(args),
            "DEL" => parse_keys(args, "DEL").map(|keys| Command::Del { keys }),
            "EXISTS" => parse_keys(args, "EXISTS").map(|keys| Command::Exists { keys }),
            "EXPIRE" => parse_expire(args, false),
            "PEXPIRE" => parse_expire(args, true),
            "LPUSH" => parse_push(args, true),
            "RPUSH" => parse_push(args, false),
            "LPOP" => parse_pop(args, true),
            "RPOP" => parse_pop(args, false),
            "LLEN" => parse_llen(args),
            "LRANGE" => parse_lrange(args),
            _ => Err(ProtocolError::UnknownCommand(name.into_owned())),
        }
    }
}

/// Extracts the payload of a bulk string frame. Every command element —
/// name and arguments alike — must be a bulk string.
fn extract_bulk(frame: &Frame) -> Result<Bytes, ProtocolError> {
    match frame {
        Frame::Bulk(data) => Ok(data.clone()),
        _ => Err(ProtocolError::InvalidCommandFrame(
            "expected bulk string argument".into(),
        )),
    }
}

/// Parses a bulk string argument as an i64.
fn parse_i64_arg(frame: &Frame, cmd: &str) -> Result<i64, ProtocolError> {
    let data = extract_bulk(frame)?;
    std::str::from_utf8(&data)
        .ok()
        .and_then(|s| s.parse::<i64>().ok())
        .ok_or_else(|| {
            ProtocolError::InvalidCommandFrame(format!(
                "value is not a valid integer for '{cmd}'"
            ))
        })
}

/// Parses a bulk string argument as a strictly positive integer.
/// Zero and negative values are rejected.
fn parse_positive_arg(frame: &Frame, cmd: &str) -> Result<u64, ProtocolError> {
    let val = parse_i64_arg(frame, cmd)?;
    if val <= 0 {
        return Err(ProtocolError::InvalidCommandFrame(format!(
            "invalid expire time in '{cmd}' command"
        )));
    }
    Ok(val as u64)
}

fn parse_ping(args: &[Frame]) -> Result<Command, ProtocolError> {
    match args.len() {
        0 => Ok(Command::Ping(None)),
        1 => {
            let msg = extract_bulk(&args[0])?;
            // the reply is a simple string, so the payload must be text
            // free of CR/LF — anything else would corrupt the stream
            let msg = std::str::from_utf8(&msg)
                .ok()
                .filter(|s| !s.contains('\r') && !s.contains('\n'))
                .map(str::to_owned)
                .ok_or_else(|| {
                    ProtocolError::InvalidCommandFrame(
                        "PING message must be text without CR or LF".into(),
                    )
                })?;
            Ok(Command::Ping(Some(msg)))
        }
        _ => Err(ProtocolError::WrongArity("PING".into())),
    }
}

fn parse_set(args: &[Frame]) -> Result<Command, ProtocolError> {
    if args.len() < 2 {
        return Err(ProtocolError::WrongArity("SET".into()));
    }

    let key = extract_bulk(&args[0])?;
    let value = extract_bulk(&args[1])?;

    // options are position-independent after the value; at most one of
    // NX/XX and at most one of EX/PX
    let mut condition = None;
    let mut expire = None;

    let mut idx = 2;
    while idx < args.len() {
        let opt = extract_bulk(&args[idx])?;
        // option tokens are matched exactly, uppercase only
        match String::from_utf8_lossy(&opt).as_ref() {
            "NX" | "XX" => {
                if condition.is_some() {
                    return Err(ProtocolError::InvalidCommandFrame(
                        "SET allows at most one of NX and XX".into(),
                    ));
                }
                condition = Some(if opt.as_ref() == b"NX" {
                    SetCondition::Nx
                } else {
                    SetCondition::Xx
                });
                idx += 1;
            }
            "EX" | "PX" => {
                if expire.is_some() {
                    return Err(ProtocolError::InvalidCommandFrame(
                        "SET allows at most one of EX and PX".into(),
                    ));
                }
                let Some(amount) = args.get(idx + 1) else {
                    return Err(ProtocolError::InvalidCommandFrame(
                        "SET option EX/PX requires an expiration time".into(),
                    ));
                };
                let amount = parse_positive_arg(amount, "SET")?;
                expire = Some(if opt.as_ref() == b"EX" {
                    SetExpire::Ex(amount)
                } else {
                    SetExpire::Px(amount)
                });
                idx += 2;
            }
            other => {
                return Err(ProtocolError::InvalidCommandFrame(format!(
                    "unknown SET option '{other}'"
                )));
            }
        }
    }

    Ok(Command::Set {
        key,
        value,
        condition,
        expire,
    })
}

fn parse_get(args: &[Frame]) -> Result<Command, ProtocolError> {
    if args.len() != 1 {
        return Err(ProtocolError::WrongArity("GET".into()));
    }
    let key = extract_bulk(&args[0])?;
    Ok(Command::Get { key })
}

/// Shared by DEL and EXISTS: one or more key arguments.
fn parse_keys(args: &[Frame], cmd: &str) -> Result<Vec<Bytes>, ProtocolError> {
    if args.is_empty() {
        return Err(ProtocolError::WrongArity(cmd.into()));
    }
    args.iter().map(extract_bulk).collect()
}

fn parse_expire(args: &[Frame], millis: bool) -> Result<Command, ProtocolError> {
    let cmd = if millis { "PEXPIRE" } else { "EXPIRE" };
    if args.len() != 2 {
        return Err(ProtocolError::WrongArity(cmd.into()));
    }
    let key = extract_bulk(&args[0])?;
    let amount = parse_positive_arg(&args[1], cmd)?;

    let ttl = if millis {
        Duration::from_millis(amount)
    } else {
        Duration::from_secs(amount)
    };

    Ok(Command::Expire { key, ttl })
}

fn parse_push(args: &[Frame], front: bool) -> Result<Command, ProtocolError> {
    let cmd = if front { "LPUSH" } else { "RPUSH" };
    if args.len() < 2 {
        return Err(ProtocolError::WrongArity(cmd.into()));
    }
    let key = extract_bulk(&args[0])?;
    let values = args[1..]
        .iter()
        .map(extract_bulk)
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Command::Push { key, values, front })
}

fn parse_pop(args: &[Frame], front: bool) -> Result<Command, ProtocolError> {
    let cmd = if front { "LPOP" } else { "RPOP" };
    if args.len() != 1 {
        return Err(ProtocolError::WrongArity(cmd.into()));
    }
    let key = extract_bulk(&args[0])?;
    Ok(Command::Pop { key, front })
}

fn parse_llen(args: &[Frame]) -> Result<Command, ProtocolError> {
    if args.len() != 1 {
        return Err(ProtocolError::WrongArity("LLEN".into()));
    }
    let key = extract_bulk(&args[0])?;
    Ok(Command::LLen { key })
}

fn parse_lrange(args: &[Frame]) -> Result<Command, ProtocolError> {
    if args.len() != 3 {
        return Err(ProtocolError::WrongArity("LRANGE".into()));
    }
    let key = extract_bulk(&args[0])?;
    let start = parse_i64_arg(&args[1], "LRANGE")?;
    let stop = parse_i64_arg(&args[2], "LRANGE")?;
    Ok(Command::LRange { key, start, stop })
}
