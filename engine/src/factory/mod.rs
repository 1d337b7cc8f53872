//! Schedule factory — derives entitlement schedules from a confirmed
//! purchase
//!
//! One confirmed purchase produces:
//! - exactly one `Benefit` schedule (daily principal return), and
//! - zero-or-one `Referrer` plus zero-or-one `Parent` commission
//!   schedule, depending on the buyer's upline chain.
//!
//! Creation only establishes future obligations; no ledger posting
//! happens here. The purchase workflow may deliver the same
//! confirmation more than once, so [`on_purchase_confirmed`] is
//! idempotent: a schedule that already exists is reported as such, not
//! recreated and not an error.

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::config::{CachedRates, RateConfig, RateSource};
use crate::models::book::{BookError, ScheduleBook};
use crate::models::purchase::Purchase;
use crate::models::schedule::{Schedule, ScheduleKind};

/// Errors from schedule creation
#[derive(Debug, Error, PartialEq)]
pub enum CreationError {
    #[error("Purchase {purchase_id} has non-positive principal {principal}")]
    InvalidPurchaseState { purchase_id: String, principal: i64 },
}

/// Whether a creation call made a new schedule or found an existing one
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Created {
    /// A new schedule was persisted
    New(String),

    /// A schedule with the same (purchase, kind, day_index) already
    /// existed; its id is returned and nothing changed
    Existing(String),
}

impl Created {
    /// Schedule id, whether new or pre-existing
    pub fn id(&self) -> &str {
        match self {
            Created::New(id) | Created::Existing(id) => id,
        }
    }
}

/// What a confirmation event produced
///
/// A first delivery fills `created`; a retried delivery fills
/// `already_present` and leaves the book untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfirmationOutcome {
    /// Schedule ids newly created by this call
    pub created: Vec<String>,

    /// Schedule ids that already existed for this purchase
    pub already_present: Vec<String>,
}

impl ConfirmationOutcome {
    fn record(&mut self, created: Created) {
        match created {
            Created::New(id) => self.created.push(id),
            Created::Existing(id) => self.already_present.push(id),
        }
    }
}

fn validate_principal(purchase: &Purchase) -> Result<(), CreationError> {
    if purchase.principal_amount <= 0 {
        return Err(CreationError::InvalidPurchaseState {
            purchase_id: purchase.id.clone(),
            principal: purchase.principal_amount,
        });
    }
    Ok(())
}

fn insert_idempotent(book: &mut ScheduleBook, schedule: Schedule) -> Created {
    match book.insert_schedule(schedule) {
        Ok(id) => Created::New(id),
        Err(BookError::DuplicateSchedule { existing_id, .. }) => Created::Existing(existing_id),
    }
}

/// Create the purchase's benefit schedule
///
/// `days = rates.benefit_days` pending records at
/// `rates.benefit_daily_rate_bps`, anchored at the purchase's
/// confirmation time (day `d` due at `start + (d+1)` days).
///
/// Idempotent: if the purchase already has a benefit schedule, returns
/// `Created::Existing` without touching the book.
///
/// # Errors
/// `CreationError::InvalidPurchaseState` if the principal is
/// non-positive.
pub fn create_benefit_schedule(
    book: &mut ScheduleBook,
    purchase: &Purchase,
    rates: &RateConfig,
) -> Result<Created, CreationError> {
    validate_principal(purchase)?;

    let schedule = Schedule::new_benefit(
        &purchase.id,
        &purchase.buyer_user_id,
        purchase.principal_amount,
        rates.benefit_daily_rate_bps,
        rates.benefit_days,
        purchase.confirmed_at,
    );
    Ok(insert_idempotent(book, schedule))
}

/// Create commission schedules for whichever upline ids are present
///
/// Each present upline yields one single-day schedule:
/// - Referrer: `rates.direct_percent_bps` of principal, unlocking on
///   `D + direct_unlock_days` (stored day_index `direct_unlock_days-1`)
/// - Parent: `rates.parent_percent_bps`, unlocking on
///   `D + parent_unlock_days`
///
/// Idempotent per schedule, like
/// [`create_benefit_schedule`].
///
/// # Errors
/// `CreationError::InvalidPurchaseState` if the principal is
/// non-positive.
pub fn create_commission_schedules(
    book: &mut ScheduleBook,
    purchase: &Purchase,
    referrer_user_id: Option<&str>,
    parent_user_id: Option<&str>,
    rates: &RateConfig,
) -> Result<Vec<Created>, CreationError> {
    validate_principal(purchase)?;

    let mut results = Vec::new();

    if let Some(referrer) = referrer_user_id {
        let schedule = Schedule::new_commission(
            &purchase.id,
            referrer,
            ScheduleKind::Referrer,
            purchase.principal_amount,
            rates.direct_percent_bps,
            rates.direct_unlock_days,
            purchase.confirmed_at,
        );
        results.push(insert_idempotent(book, schedule));
    }

    if let Some(parent) = parent_user_id {
        let schedule = Schedule::new_commission(
            &purchase.id,
            parent,
            ScheduleKind::Parent,
            purchase.principal_amount,
            rates.parent_percent_bps,
            rates.parent_unlock_days,
            purchase.confirmed_at,
        );
        results.push(insert_idempotent(book, schedule));
    }

    Ok(results)
}

/// Inbound entry point: a purchase was confirmed
///
/// Registers the purchase and derives its benefit and commission
/// schedules, reading the current rate configuration through the
/// injected cache (a failing configuration store falls back to
/// defaults and never fails this call).
///
/// Safe to receive more than once for the same purchase: the retried
/// call reports every schedule under `already_present` and creates
/// nothing.
///
/// # Errors
/// `CreationError::InvalidPurchaseState` if the principal is
/// non-positive — the only fatal condition.
///
/// # Example
/// ```
/// use accrual_engine_rs::config::{CachedRates, RateConfig, StaticRates};
/// use accrual_engine_rs::factory::on_purchase_confirmed;
/// use accrual_engine_rs::models::book::ScheduleBook;
/// use accrual_engine_rs::models::purchase::Purchase;
/// use chrono::Utc;
///
/// let mut book = ScheduleBook::new();
/// let mut rates = CachedRates::new(StaticRates(RateConfig::default()), 300);
/// let now = Utc::now();
///
/// let purchase = Purchase::confirmed("P-1", "U-1", 100_000, now);
/// let outcome =
///     on_purchase_confirmed(&mut book, purchase, Some("U-REF"), None, &mut rates, now)
///         .unwrap();
/// assert_eq!(outcome.created.len(), 2); // benefit + referrer
/// ```
pub fn on_purchase_confirmed<S: RateSource>(
    book: &mut ScheduleBook,
    purchase: Purchase,
    referrer_user_id: Option<&str>,
    parent_user_id: Option<&str>,
    rates: &mut CachedRates<S>,
    now: DateTime<Utc>,
) -> Result<ConfirmationOutcome, CreationError> {
    validate_principal(&purchase)?;

    let config = rates.current(now);
    book.upsert_purchase(purchase.clone());

    let mut outcome = ConfirmationOutcome::default();
    outcome.record(create_benefit_schedule(book, &purchase, &config)?);
    for created in create_commission_schedules(
        book,
        &purchase,
        referrer_user_id,
        parent_user_id,
        &config,
    )? {
        outcome.record(created);
    }

    Ok(outcome)
}
