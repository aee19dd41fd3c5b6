//! Day-granularity timestamp arithmetic.

use chrono::{DateTime, Utc};

pub const SECONDS_PER_DAY: i64 = 60 * 60 * 24;

/// Truncate a unix timestamp to the start of its UTC day.
///
/// Division truncates toward zero, so the result never exceeds the input in
/// magnitude and cannot overflow. Timestamps before the epoch are always in
/// the past either way.
pub fn day_floor(timestamp: i64) -> i64 {
    (timestamp / SECONDS_PER_DAY) * SECONDS_PER_DAY
}

/// Start of the UTC day containing `now`.
pub fn today(now: DateTime<Utc>) -> i64 {
    day_floor(now.timestamp())
}

/// ISO date (`YYYY-MM-DD`) of a unix timestamp, for logging.
pub fn format_day(timestamp: i64) -> String {
    DateTime::from_timestamp(timestamp, 0)
        .map(|dt| dt.date_naive().to_string())
        .unwrap_or_else(|| timestamp.to_string())
}
