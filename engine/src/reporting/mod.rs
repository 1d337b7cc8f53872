//! Completion & metrics aggregator
//!
//! Read-only projections over schedule state for dashboards and
//! reporting collaborators. Everything here takes `&Schedule` or
//! `&ScheduleBook`; nothing can mutate the accrual model.

use chrono::{DateTime, Utc};

use crate::models::book::ScheduleBook;
use crate::models::schedule::{Schedule, ScheduleKind};

/// Amount still owed on a schedule (i64 cents)
///
/// `daily_amount × days − total_released`. Failed days keep their
/// amount in the remainder; remediation is out-of-band.
pub fn remaining_amount(schedule: &Schedule) -> i64 {
    schedule.daily_amount() * schedule.days() as i64 - schedule.total_released()
}

/// Fraction of release events completed, as a percentage
///
/// Percent is a display value, not money, so f64 is fine here.
pub fn completion_percent(schedule: &Schedule) -> f64 {
    schedule.days_released() as f64 / schedule.days() as f64 * 100.0
}

/// Schedules of `kind` with at least one pending day due on or before
/// `date`
///
/// Sorted by schedule id for stable dashboard output.
pub fn find_due_on_or_before(
    book: &ScheduleBook,
    date: DateTime<Utc>,
    kind: ScheduleKind,
) -> Vec<String> {
    let mut ids: Vec<String> = book
        .schedules()
        .filter(|s| s.kind() == kind && s.is_active() && s.due_days(date).next().is_some())
        .map(|s| s.id().to_string())
        .collect();
    ids.sort();
    ids
}

/// Sum released across all schedules of one kind (i64 cents)
pub fn total_released_for_kind(book: &ScheduleBook, kind: ScheduleKind) -> i64 {
    book.schedules()
        .filter(|s| s.kind() == kind)
        .map(Schedule::total_released)
        .sum()
}

/// Number of active schedules of one kind
pub fn active_count(book: &ScheduleBook, kind: ScheduleKind) -> usize {
    book.schedules()
        .filter(|s| s.kind() == kind && s.is_active())
        .count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::purchase::Purchase;
    use chrono::Duration;

    fn book_with_benefit() -> (ScheduleBook, String, DateTime<Utc>) {
        let mut book = ScheduleBook::new();
        let t0 = Utc::now();
        book.upsert_purchase(Purchase::confirmed("P-1", "U-1", 100_000, t0));
        let id = book
            .insert_schedule(Schedule::new_benefit("P-1", "U-1", 100_000, 1_250, 8, t0))
            .unwrap();
        (book, id, t0)
    }

    #[test]
    fn test_remaining_and_completion_fresh() {
        let (book, id, _) = book_with_benefit();
        let s = book.get_schedule(&id).unwrap();

        assert_eq!(remaining_amount(s), 100_000);
        assert_eq!(completion_percent(s), 0.0);
    }

    #[test]
    fn test_remaining_and_completion_partial() {
        let (mut book, id, t0) = book_with_benefit();
        let s = book.get_schedule_mut(&id).unwrap();
        s.mark_day_released(0, t0, "L-0").unwrap();
        s.mark_day_released(1, t0, "L-1").unwrap();

        let s = book.get_schedule(&id).unwrap();
        assert_eq!(remaining_amount(s), 75_000);
        assert_eq!(completion_percent(s), 25.0);
    }

    #[test]
    fn test_find_due_on_or_before() {
        let (book, id, t0) = book_with_benefit();

        // Nothing due at confirmation time
        assert!(find_due_on_or_before(&book, t0, ScheduleKind::Benefit).is_empty());

        // Day 0 due one day out
        assert_eq!(
            find_due_on_or_before(&book, t0 + Duration::days(1), ScheduleKind::Benefit),
            vec![id]
        );

        // Wrong kind stays empty
        assert!(
            find_due_on_or_before(&book, t0 + Duration::days(1), ScheduleKind::Referrer)
                .is_empty()
        );
    }

    #[test]
    fn test_kind_totals() {
        let (mut book, id, t0) = book_with_benefit();
        book.get_schedule_mut(&id)
            .unwrap()
            .mark_day_released(0, t0, "L-0")
            .unwrap();

        assert_eq!(total_released_for_kind(&book, ScheduleKind::Benefit), 12_500);
        assert_eq!(total_released_for_kind(&book, ScheduleKind::Referrer), 0);
        assert_eq!(active_count(&book, ScheduleKind::Benefit), 1);
    }
}
