//! Compact monotonic time utilities.
//!
//! Timestamps are nanoseconds on a process-local monotonic clock,
//! stored as a bare `u64` (8 bytes vs 16 for `Option<Instant>`).
//! Zero is the "never expires" sentinel.

use std::sync::OnceLock;
use std::time::Instant;

/// Sentinel value meaning "no expiry".
pub const NO_EXPIRY: u64 = 0;

/// Returns current monotonic time in nanoseconds since process start.
#[inline]
pub fn now_ns() -> u64 {
    static START: OnceLock<Instant> = OnceLock::new();
    let start = START.get_or_init(Instant::now);
    start.elapsed().as_nanos() as u64
}

/// Returns true if the given expiry timestamp has passed.
#[inline]
pub fn is_expired(expires_at_ns: u64) -> bool {
    expires_at_ns != NO_EXPIRY && now_ns() >= expires_at_ns
}

/// Converts an optional TTL to an absolute expiry timestamp.
#[inline]
pub fn expiry_from_ttl(ttl: Option<std::time::Duration>) -> u64 {
    ttl.map(|d| now_ns().saturating_add(d.as_nanos() as u64))
        .unwrap_or(NO_EXPIRY)
}
