//! Timestamp utilities

use crate::{Error, Result};
use chrono::{DateTime, Datelike, Duration, SecondsFormat, Utc};

const SECONDS_PER_DAY: f64 = 86_400.0;

/// Get current UTC timestamp
pub fn now() -> DateTime<Utc> {
    Utc::now()
}

/// Fractional days elapsed from `earlier` to `later`
///
/// Negative when `earlier` is in the future relative to `later`.
pub fn days_between(earlier: DateTime<Utc>, later: DateTime<Utc>) -> f64 {
    let elapsed = later.signed_duration_since(earlier);
    // Millisecond precision keeps sub-second clock skew from flipping thresholds
    elapsed.num_milliseconds() as f64 / 1000.0 / SECONDS_PER_DAY
}

/// Start of a lookback window ending at `now`
///
/// Fails with `Config` when the window reaches past the representable range.
pub fn window_start(now: DateTime<Utc>, lookback_days: u32) -> Result<DateTime<Utc>> {
    Duration::try_days(i64::from(lookback_days))
        .and_then(|span| now.checked_sub_signed(span))
        .ok_or_else(|| Error::Config(format!("lookback of {} days is out of range", lookback_days)))
}

/// Whether a timestamp keeps the fixed-width storage format (years 0000 to 9999)
pub fn is_storable(at: DateTime<Utc>) -> bool {
    (0..=9999).contains(&at.year())
}

/// Format a timestamp for storage
///
/// Fixed-width RFC 3339 with microseconds and a `Z` suffix, so stored values
/// compare correctly as text in range queries.
pub fn to_db_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Parse a timestamp written by [`to_db_timestamp`]
pub fn from_db_timestamp(value: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| Error::Internal(format!("Invalid stored timestamp '{}': {}", value, e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_now_returns_valid_timestamp() {
        let timestamp = now();
        // Should be a reasonable timestamp (after year 2000)
        assert!(timestamp.timestamp() > 946_684_800);
    }

    #[test]
    fn test_days_between_whole_days() {
        let later = now();
        let earlier = later - Duration::days(3);
        assert!((days_between(earlier, later) - 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_days_between_fractional() {
        let later = now();
        let earlier = later - Duration::hours(36);
        assert!((days_between(earlier, later) - 1.5).abs() < 1e-9);
    }

    #[test]
    fn test_days_between_future_is_negative() {
        let earlier = now();
        let later = earlier - Duration::hours(12);
        assert!(days_between(earlier, later) < 0.0);
    }

    #[test]
    fn test_window_start() {
        let end = now();
        let start = window_start(end, 20).unwrap();
        assert_eq!(end - start, Duration::days(20));
    }

    #[test]
    fn test_db_timestamp_is_fixed_width() {
        let whole = DateTime::parse_from_rfc3339("2026-03-01T10:00:00Z")
            .unwrap()
            .with_timezone(&Utc);
        let fractional = whole + Duration::milliseconds(500);

        let a = to_db_timestamp(whole);
        let b = to_db_timestamp(fractional);
        assert_eq!(a.len(), b.len());
        assert!(a < b, "text order must follow time order");
        assert_eq!(from_db_timestamp(&b).unwrap(), fractional);
    }

    #[test]
    fn test_from_db_timestamp_rejects_garbage() {
        assert!(from_db_timestamp("yesterday").is_err());
    }

    #[test]
    fn test_window_start_zero_days() {
        let end = now();
        assert_eq!(window_start(end, 0).unwrap(), end);
    }

    #[test]
    fn test_window_start_overflow_is_error() {
        let result = window_start(now(), u32::MAX);
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_storable_year_range() {
        let year = |y: i32| {
            DateTime::parse_from_rfc3339("2026-03-01T10:00:00Z")
                .unwrap()
                .with_timezone(&Utc)
                .with_year(y)
                .unwrap()
        };
        assert!(is_storable(year(0)));
        assert!(is_storable(year(9999)));
        assert!(!is_storable(year(10000)));
        assert!(!is_storable(year(-1)));
        assert_eq!(to_db_timestamp(year(9999)).len(), to_db_timestamp(year(2026)).len());
    }
}
