//! Time-related utilities with clock abstraction for testability.
//!
//! Envelope timestamps on the wire are Unix seconds; the HTTP views render
//! millisecond timestamps as RFC 3339 in UTC.

use chrono::{SecondsFormat, TimeZone, Utc};

/// Clock trait for dependency injection and testing
pub trait Clock: Send + Sync {
    /// Current Unix timestamp in seconds
    fn now_unix_seconds(&self) -> i64;

    /// Current Unix timestamp in milliseconds
    fn now_unix_millis(&self) -> i64;
}

/// System clock implementation (uses actual system time)
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_unix_seconds(&self) -> i64 {
        unix_seconds()
    }

    fn now_unix_millis(&self) -> i64 {
        unix_millis()
    }
}

/// Fixed clock implementation for testing (returns a fixed time)
#[derive(Debug, Clone, Copy)]
pub struct FixedClock {
    fixed_millis: i64,
}

impl FixedClock {
    /// Create a new fixed clock at the given Unix timestamp in milliseconds
    pub fn new(fixed_millis: i64) -> Self {
        Self { fixed_millis }
    }
}

impl Clock for FixedClock {
    fn now_unix_seconds(&self) -> i64 {
        self.fixed_millis / 1000
    }

    fn now_unix_millis(&self) -> i64 {
        self.fixed_millis
    }
}

/// Current Unix timestamp in seconds
pub fn unix_seconds() -> i64 {
    Utc::now().timestamp()
}

/// Current Unix timestamp in milliseconds
pub fn unix_millis() -> i64 {
    Utc::now().timestamp_millis()
}

/// Convert a Unix timestamp (milliseconds) to RFC 3339 in UTC.
///
/// Out-of-range values render as the Unix epoch.
pub fn timestamp_to_rfc3339(timestamp_millis: i64) -> String {
    Utc.timestamp_millis_opt(timestamp_millis)
        .single()
        .unwrap_or_default()
        .to_rfc3339_opts(SecondsFormat::Millis, true)
}
