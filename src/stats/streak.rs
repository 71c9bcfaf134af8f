//! Consecutive-day streak accounting.
//!
//! Days roll over at midnight at a fixed UTC offset supplied by the engine
//! config, so the boundary is deterministic across devices. Hosts that want
//! device-local midnight pass the device's offset.

use chrono::{DateTime, Duration, FixedOffset, NaiveDate, Utc};

use super::types::UserStats;

/// Calendar day of `instant` under a fixed offset in minutes.
pub fn activity_day(instant: DateTime<Utc>, offset_minutes: i32) -> NaiveDate {
    let offset = FixedOffset::east_opt(offset_minutes * 60)
        .unwrap_or_else(|| FixedOffset::east_opt(0).expect("zero offset is valid"));
    instant.with_timezone(&offset).date_naive()
}

/// Advance the streak counters for activity at `instant`.
///
/// Same day: no change. Next day: streak +1. First ever activity or a
/// skipped day: streak resets to 1.
pub fn touch(stats: &mut UserStats, instant: DateTime<Utc>, offset_minutes: i32) {
    let today = activity_day(instant, offset_minutes);

    match stats.last_active_date {
        Some(last) if last == today => {}
        Some(last) if last + Duration::days(1) == today => {
            stats.consecutive_days += 1;
            stats.last_active_date = Some(today);
        }
        _ => {
            stats.consecutive_days = 1;
            stats.last_active_date = Some(today);
        }
    }
}
