// crates/lifeledger-core/src/core/time.rs
// ============================================================================
// Module: Lifeledger Time Model
// Description: Managed timestamps for datasets and records.
// Purpose: Provide millisecond instants with an RFC 3339 wire form.
// Dependencies: serde, time
// ============================================================================

//! ## Overview
//! Timestamps are stored as unix epoch milliseconds and rendered as RFC 3339
//! text on the wire. The engine obtains them from an injected
//! [`crate::interfaces::Clock`] so tests can control the passage of time.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use serde::Deserialize;
use serde::Deserializer;
use serde::Serialize;
use serde::Serializer;
use serde::de::Error as _;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

// ============================================================================
// SECTION: Time Values
// ============================================================================

/// Unix epoch milliseconds.
///
/// # Invariants
/// - Serialized as RFC 3339 text in UTC.
/// - Ordering follows the underlying millisecond value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Timestamp(i64);

impl Timestamp {
    /// Creates a timestamp from unix epoch milliseconds.
    #[must_use]
    pub const fn from_unix_millis(millis: i64) -> Self {
        Self(millis)
    }

    /// Returns the current wall-clock time.
    #[must_use]
    pub fn now() -> Self {
        let nanos = OffsetDateTime::now_utc().unix_timestamp_nanos();
        Self(i64::try_from(nanos / 1_000_000).unwrap_or(i64::MAX))
    }

    /// Returns the timestamp as unix epoch milliseconds.
    #[must_use]
    pub const fn as_unix_millis(self) -> i64 {
        self.0
    }

    /// Renders the timestamp as RFC 3339 text.
    ///
    /// Falls back to the raw millisecond value when the instant is outside the
    /// representable calendar range.
    #[must_use]
    pub fn to_rfc3339(self) -> String {
        OffsetDateTime::from_unix_timestamp_nanos(i128::from(self.0) * 1_000_000)
            .ok()
            .and_then(|value| value.format(&Rfc3339).ok())
            .unwrap_or_else(|| self.0.to_string())
    }

    /// Parses RFC 3339 text into a timestamp.
    ///
    /// # Errors
    ///
    /// Returns [`time::error::Parse`] when the text is not valid RFC 3339.
    pub fn parse_rfc3339(text: &str) -> Result<Self, time::error::Parse> {
        let value = OffsetDateTime::parse(text, &Rfc3339)?;
        let millis = value.unix_timestamp_nanos() / 1_000_000;
        Ok(Self(i64::try_from(millis).unwrap_or(i64::MAX)))
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_rfc3339())
    }
}

impl Serialize for Timestamp {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_rfc3339())
    }
}

impl<'de> Deserialize<'de> for Timestamp {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        Self::parse_rfc3339(&text).map_err(D::Error::custom)
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, reason = "Test-only assertions are permitted.")]

    use super::Timestamp;

    #[test]
    fn rfc3339_round_trip_keeps_millisecond_precision() {
        let stamp = Timestamp::from_unix_millis(1_704_067_200_123);
        let text = stamp.to_rfc3339();
        assert_eq!(text, "2024-01-01T00:00:00.123Z");
        assert_eq!(Timestamp::parse_rfc3339(&text).unwrap(), stamp);
    }

    #[test]
    fn serde_uses_rfc3339_text() {
        let stamp = Timestamp::from_unix_millis(0);
        assert_eq!(serde_json::to_string(&stamp).unwrap(), "\"1970-01-01T00:00:00Z\"");
    }
}
