//! Event timestamp parsing.

use chrono::{DateTime, Utc};

const NANOS_PER_SEC: i64 = 1_000_000_000;

/// Parse a connector timestamp.
///
/// Accepts RFC 3339 (with or without fractional seconds) or a Unix integer
/// whose unit is inferred from its magnitude: seconds below 1e10,
/// milliseconds below 1e13, microseconds below 1e16, nanoseconds otherwise.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }
    let value: i64 = raw.parse().ok()?;
    let magnitude = value.unsigned_abs();
    let units_per_sec = if magnitude < 10_000_000_000 {
        1
    } else if magnitude < 10_000_000_000_000 {
        1_000
    } else if magnitude < 10_000_000_000_000_000 {
        1_000_000
    } else {
        NANOS_PER_SEC
    };
    let secs = value.div_euclid(units_per_sec);
    let nanos = value.rem_euclid(units_per_sec) * (NANOS_PER_SEC / units_per_sec);
    DateTime::from_timestamp(secs, u32::try_from(nanos).ok()?)
}

/// Parse `raw`, falling back to `received_at`.
pub fn timestamp_or(raw: &str, received_at: DateTime<Utc>) -> DateTime<Utc> {
    parse_timestamp(raw).unwrap_or(received_at)
}
