//! Schedule factory tests
//!
//! Idempotent creation, commission-offset derivation, and the rate
//! configuration fallback path.

use accrual_engine_rs::config::UnavailableRates;
use accrual_engine_rs::{
    on_purchase_confirmed, CachedRates, CreationError, Purchase, RateConfig, ScheduleBook,
    ScheduleKind, StaticRates,
};
use chrono::{DateTime, Duration, Utc};

// ============================================================================
// Test Helpers
// ============================================================================

fn default_rates() -> CachedRates<StaticRates> {
    CachedRates::new(StaticRates(RateConfig::default()), 300)
}

fn purchase(id: &str, principal: i64, at: DateTime<Utc>) -> Purchase {
    Purchase::confirmed(id, "U-BUYER", principal, at)
}

// ============================================================================
// Idempotent Creation
// ============================================================================

#[test]
fn test_confirmation_creates_benefit_and_commissions() {
    let mut book = ScheduleBook::new();
    let mut rates = default_rates();
    let now = Utc::now();

    let outcome = on_purchase_confirmed(
        &mut book,
        purchase("P-1", 100_000, now),
        Some("U-REF"),
        Some("U-PAR"),
        &mut rates,
        now,
    )
    .unwrap();

    assert_eq!(outcome.created.len(), 3);
    assert!(outcome.already_present.is_empty());
    assert_eq!(book.num_schedules(), 3);
    assert!(book
        .find_schedule_id("P-1", ScheduleKind::Benefit, None)
        .is_some());
    assert!(book
        .find_schedule_id("P-1", ScheduleKind::Referrer, Some(8))
        .is_some());
    assert!(book
        .find_schedule_id("P-1", ScheduleKind::Parent, Some(16))
        .is_some());
}

#[test]
fn test_retried_confirmation_is_a_no_op() {
    let mut book = ScheduleBook::new();
    let mut rates = default_rates();
    let now = Utc::now();

    let first = on_purchase_confirmed(
        &mut book,
        purchase("P-1", 100_000, now),
        Some("U-REF"),
        Some("U-PAR"),
        &mut rates,
        now,
    )
    .unwrap();

    let second = on_purchase_confirmed(
        &mut book,
        purchase("P-1", 100_000, now),
        Some("U-REF"),
        Some("U-PAR"),
        &mut rates,
        now,
    )
    .unwrap();

    // Same schedules, no new ones, no error
    assert!(second.created.is_empty());
    let mut expected = first.created.clone();
    expected.sort();
    let mut reported = second.already_present.clone();
    reported.sort();
    assert_eq!(reported, expected);
    assert_eq!(book.num_schedules(), 3);
}

#[test]
fn test_no_upline_means_benefit_only() {
    let mut book = ScheduleBook::new();
    let mut rates = default_rates();
    let now = Utc::now();

    let outcome =
        on_purchase_confirmed(&mut book, purchase("P-1", 100_000, now), None, None, &mut rates, now)
            .unwrap();

    assert_eq!(outcome.created.len(), 1);
    assert_eq!(book.num_schedules(), 1);
}

#[test]
fn test_referrer_without_parent() {
    let mut book = ScheduleBook::new();
    let mut rates = default_rates();
    let now = Utc::now();

    on_purchase_confirmed(
        &mut book,
        purchase("P-1", 100_000, now),
        Some("U-REF"),
        None,
        &mut rates,
        now,
    )
    .unwrap();

    assert_eq!(book.num_schedules(), 2);
    assert!(book
        .find_schedule_id("P-1", ScheduleKind::Parent, Some(16))
        .is_none());
}

#[test]
fn test_non_positive_principal_is_fatal() {
    let mut book = ScheduleBook::new();
    let mut rates = default_rates();
    let now = Utc::now();

    for bad in [0, -100_000] {
        let err = on_purchase_confirmed(
            &mut book,
            purchase("P-BAD", bad, now),
            None,
            None,
            &mut rates,
            now,
        )
        .unwrap_err();

        assert_eq!(
            err,
            CreationError::InvalidPurchaseState {
                purchase_id: "P-BAD".to_string(),
                principal: bad,
            }
        );
    }
    assert_eq!(book.num_schedules(), 0);
    assert_eq!(book.num_purchases(), 0);
}

// ============================================================================
// Commission Derivation
// ============================================================================

#[test]
fn test_commission_offsets_and_amounts() {
    let mut book = ScheduleBook::new();
    let mut rates = default_rates();
    let t0 = Utc::now();

    on_purchase_confirmed(
        &mut book,
        purchase("P-1", 100_000, t0),
        Some("U-REF"),
        Some("U-PAR"),
        &mut rates,
        t0,
    )
    .unwrap();

    // D+9 direct unlock: day_index 8, scheduled at start + 8 days
    let ref_id = book
        .find_schedule_id("P-1", ScheduleKind::Referrer, Some(8))
        .unwrap()
        .to_string();
    let referrer = book.get_schedule(&ref_id).unwrap();
    assert_eq!(referrer.days(), 1);
    assert_eq!(referrer.user_id(), "U-REF");
    assert_eq!(referrer.daily_amount(), 10_000); // 10% of 1,000.00
    assert_eq!(
        referrer.day_record(0).unwrap().scheduled_date,
        t0 + Duration::days(8)
    );

    // D+17 parent unlock: day_index 16
    let par_id = book
        .find_schedule_id("P-1", ScheduleKind::Parent, Some(16))
        .unwrap()
        .to_string();
    let parent = book.get_schedule(&par_id).unwrap();
    assert_eq!(
        parent.day_record(0).unwrap().scheduled_date,
        t0 + Duration::days(16)
    );
    assert_eq!(parent.daily_amount(), 10_000);
}

#[test]
fn test_custom_rates_flow_through() {
    let mut book = ScheduleBook::new();
    let custom = RateConfig {
        direct_percent_bps: 500,   // 5%
        direct_unlock_days: 5,     // D+5
        benefit_daily_rate_bps: 2_000, // 20%/day
        benefit_days: 5,
        ..RateConfig::default()
    };
    let mut rates = CachedRates::new(StaticRates(custom), 300);
    let t0 = Utc::now();

    on_purchase_confirmed(
        &mut book,
        purchase("P-1", 100_000, t0),
        Some("U-REF"),
        None,
        &mut rates,
        t0,
    )
    .unwrap();

    let benefit_id = book
        .find_schedule_id("P-1", ScheduleKind::Benefit, None)
        .unwrap()
        .to_string();
    let benefit = book.get_schedule(&benefit_id).unwrap();
    assert_eq!(benefit.days(), 5);
    assert_eq!(benefit.daily_amount(), 20_000);

    let ref_id = book
        .find_schedule_id("P-1", ScheduleKind::Referrer, Some(4))
        .unwrap()
        .to_string();
    let referrer = book.get_schedule(&ref_id).unwrap();
    assert_eq!(referrer.daily_amount(), 5_000);
    assert_eq!(
        referrer.day_record(0).unwrap().scheduled_date,
        t0 + Duration::days(4)
    );
}

// ============================================================================
// Configuration Fallback
// ============================================================================

#[test]
fn test_unavailable_rate_store_falls_back_to_defaults() {
    let mut book = ScheduleBook::new();
    let mut rates = CachedRates::new(UnavailableRates, 300);
    let now = Utc::now();

    // Creation must succeed on defaults even with the store down
    let outcome = on_purchase_confirmed(
        &mut book,
        purchase("P-1", 100_000, now),
        Some("U-REF"),
        None,
        &mut rates,
        now,
    )
    .unwrap();

    assert_eq!(outcome.created.len(), 2);

    let benefit_id = book
        .find_schedule_id("P-1", ScheduleKind::Benefit, None)
        .unwrap()
        .to_string();
    let benefit = book.get_schedule(&benefit_id).unwrap();
    assert_eq!(benefit.days(), 8);
    assert_eq!(benefit.daily_amount(), 12_500);
}
