//! Calendar-day arithmetic for release scheduling
//!
//! Schedules are anchored to a purchase's confirmation timestamp and
//! release on whole-day offsets from it. This module provides the two
//! anchoring rules used by the factory:
//!
//! - Benefit day `d` (0-based) releases on `start_at + (d + 1)` days —
//!   the first payout lands one full day after confirmation.
//! - Commission day-index `k` releases on `start_at + k` days — a
//!   `D+9` unlock stores `day_index = 8` and releases 8 days after
//!   confirmation.

use chrono::{DateTime, Duration, Utc};

/// Add a whole number of days to a schedule's anchor timestamp
///
/// # Example
/// ```
/// use accrual_engine_rs::core::time::date_for_day;
/// use chrono::{TimeZone, Utc};
///
/// let start = Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap();
/// let due = date_for_day(start, 3);
/// assert_eq!(due, Utc.with_ymd_and_hms(2024, 1, 4, 12, 0, 0).unwrap());
/// ```
pub fn date_for_day(start_at: DateTime<Utc>, offset_days: usize) -> DateTime<Utc> {
    start_at + Duration::days(offset_days as i64)
}

/// Scheduled date for benefit day `day` (0-based)
///
/// Day 0 releases one full day after `start_at`; day `d` releases
/// `d + 1` days after.
pub fn benefit_day_date(start_at: DateTime<Utc>, day: usize) -> DateTime<Utc> {
    date_for_day(start_at, day + 1)
}

/// Scheduled date for a commission schedule's single day-index
///
/// A `D+9` unlock is stored as `day_index = 8` (0-based) and releases
/// exactly 8 days after `start_at`.
pub fn commission_day_date(start_at: DateTime<Utc>, day_index: usize) -> DateTime<Utc> {
    date_for_day(start_at, day_index)
}
