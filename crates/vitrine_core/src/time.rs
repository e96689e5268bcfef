//! Millisecond timestamp helpers.
//!
//! Stored timestamps are truncated to whole milliseconds so the value
//! embedded in a capability token compares exactly with the value read
//! back from the database.

use chrono::{DateTime, DurationRound, TimeDelta, Utc};

/// Current UTC time truncated to millisecond precision.
pub fn now_millis() -> DateTime<Utc> {
    let now = Utc::now();
    now.duration_trunc(TimeDelta::milliseconds(1)).unwrap_or(now)
}

/// Milliseconds since the Unix epoch.
pub fn to_millis(time: &DateTime<Utc>) -> i64 {
    time.timestamp_millis()
}

/// Inverse of [`to_millis`]; `None` when out of chrono's range.
pub fn from_millis(millis: i64) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp_millis(millis)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn now_has_no_sub_millisecond_part() {
        let now = now_millis();
        assert_eq!(now.timestamp_subsec_nanos() % 1_000_000, 0);
    }

    #[test]
    fn millis_roundtrip() {
        let now = now_millis();
        assert_eq!(from_millis(to_millis(&now)), Some(now));
    }
}
