//! Schedule model — the day-indexed accrual state machine
//!
//! A Schedule is one entitlement stream derived from a confirmed
//! purchase: either the daily benefit payout (`Benefit`) or a
//! single-day referral commission (`Referrer`/`Parent`). Each schedule
//! owns a dense array of day records, one per scheduled release event,
//! and the two terminal transitions a day can take:
//!
//! - `Pending → Released` (ledger posting confirmed)
//! - `Pending → Failed` (ledger posting definitively rejected)
//!
//! Both mutators are **silent no-ops when the day is not Pending**.
//! That no-op rule is the idempotency primitive the sweep engine and
//! any overlapping invocation rely on: re-applying a transition never
//! double-credits and never rewrites history.
//!
//! # Critical Invariants
//!
//! 1. All money values are i64 (cents); rates are integer basis points
//! 2. A day record transitions out of `Pending` exactly once and never
//!    leaves a terminal state
//! 3. `total_released == daily_amount() * days_released` at all times
//! 4. `status == Completed` exactly when `days_released == days`, and
//!    `Completed` never regresses

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::time::{benefit_day_date, commission_day_date};

/// Which entitlement stream a schedule represents
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ScheduleKind {
    /// Daily principal-return payouts to the buyer
    Benefit,

    /// Direct-referral commission, one release on a fixed day offset
    Referrer,

    /// Upline commission, one release on a (later) fixed day offset
    Parent,
}

/// Status of a single scheduled release day
///
/// `Released` and `Failed` are terminal; remediation of a failed day
/// happens out-of-band, never by re-opening the record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum DayStatus {
    /// Not yet settled; eligible for release once its date is due
    Pending,

    /// Credit posted to the ledger
    Released {
        /// When the ledger posting was confirmed
        released_at: DateTime<Utc>,
        /// Reference id returned by the ledger
        ledger_ref: String,
    },

    /// Ledger definitively rejected the posting; this day's credit is
    /// permanently excluded from `total_released`
    Failed {
        /// Rejection reason reported by the ledger
        error_message: String,
    },
}

/// One scheduled release event within a schedule
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayRecord {
    /// Current status (Pending until settled)
    pub status: DayStatus,

    /// Calendar date on or after which this day may release
    pub scheduled_date: DateTime<Utc>,
}

impl DayRecord {
    fn pending(scheduled_date: DateTime<Utc>) -> Self {
        Self {
            status: DayStatus::Pending,
            scheduled_date,
        }
    }

    /// Whether this day is still awaiting settlement
    pub fn is_pending(&self) -> bool {
        matches!(self.status, DayStatus::Pending)
    }
}

/// Lifecycle status of a whole schedule
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScheduleStatus {
    /// Has unsettled days (or failed days that will never settle)
    Active,

    /// Every day released; terminal
    Completed,

    /// Cancelled out-of-band; the sweep never selects it
    Cancelled,
}

/// Whether a mutator actually changed state
///
/// The sweep counts a release only when the transition was `Applied`,
/// so a duplicate sweep converges instead of double-counting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DayTransition {
    /// The day was Pending and has now transitioned
    Applied,

    /// The day was already terminal; nothing changed
    NoOp,
}

/// Errors from schedule operations
#[derive(Debug, Error, PartialEq)]
pub enum ScheduleError {
    #[error("Day index {day} out of range for schedule with {days} days")]
    DayOutOfRange { day: usize, days: usize },
}

/// One entitlement stream: the schedule entity plus its day records
///
/// # Example
/// ```
/// use accrual_engine_rs::models::schedule::{Schedule, ScheduleKind};
/// use chrono::Utc;
///
/// let s = Schedule::new_benefit("P-1", "U-1", 100_000, 1_250, 8, Utc::now());
/// assert_eq!(s.kind(), ScheduleKind::Benefit);
/// assert_eq!(s.daily_amount(), 12_500); // 12.5% of 1,000.00
/// assert_eq!(s.days(), 8);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Schedule {
    /// Unique schedule identifier (UUID)
    id: String,

    /// Originating purchase
    purchase_id: String,

    /// Beneficiary of every release in this stream
    user_id: String,

    /// Entitlement stream kind
    kind: ScheduleKind,

    /// Effective start (normally payment-confirmation time)
    start_at: DateTime<Utc>,

    /// Total number of scheduled release events
    days: usize,

    /// Per-day rate in basis points of principal
    rate_bps: u32,

    /// Principal in i64 cents; immutable once the schedule exists
    principal_amount: i64,

    /// Single offset day for commission kinds (0-based); None for
    /// Benefit, which releases on every day 0..days-1
    day_index: Option<usize>,

    /// Dense per-day records, indexed 0..days-1
    day_records: Vec<DayRecord>,

    /// Sum of released amounts (i64 cents)
    total_released: i64,

    /// Count of released days
    days_released: usize,

    /// Lifecycle status
    status: ScheduleStatus,
}

impl Schedule {
    /// Create a benefit schedule: `days` pending records, day `d`
    /// scheduled at `start_at + (d + 1)` days
    ///
    /// # Panics
    /// Panics if principal <= 0 or days == 0 (the factory validates
    /// purchase state before constructing).
    pub fn new_benefit(
        purchase_id: &str,
        user_id: &str,
        principal_amount: i64,
        rate_bps: u32,
        days: usize,
        start_at: DateTime<Utc>,
    ) -> Self {
        assert!(principal_amount > 0, "principal must be positive");
        assert!(days > 0, "benefit schedule needs at least one day");

        let day_records = (0..days)
            .map(|d| DayRecord::pending(benefit_day_date(start_at, d)))
            .collect();

        Self {
            id: uuid::Uuid::new_v4().to_string(),
            purchase_id: purchase_id.to_string(),
            user_id: user_id.to_string(),
            kind: ScheduleKind::Benefit,
            start_at,
            days,
            rate_bps,
            principal_amount,
            day_index: None,
            day_records,
            total_released: 0,
            days_released: 0,
            status: ScheduleStatus::Active,
        }
    }

    /// Create a single-day commission schedule
    ///
    /// `unlock_days` is the human-facing `D+n` offset; the stored
    /// `day_index` is `unlock_days - 1` (0-based) and the single record
    /// is scheduled at `start_at + day_index` days.
    ///
    /// # Panics
    /// Panics if principal <= 0, unlock_days == 0, or the kind is
    /// `Benefit`.
    pub fn new_commission(
        purchase_id: &str,
        user_id: &str,
        kind: ScheduleKind,
        principal_amount: i64,
        rate_bps: u32,
        unlock_days: usize,
        start_at: DateTime<Utc>,
    ) -> Self {
        assert!(principal_amount > 0, "principal must be positive");
        assert!(unlock_days > 0, "unlock_days must be positive");
        assert!(
            kind != ScheduleKind::Benefit,
            "commission constructor cannot build a Benefit schedule"
        );

        let day_index = unlock_days - 1;
        let day_records = vec![DayRecord::pending(commission_day_date(start_at, day_index))];

        Self {
            id: uuid::Uuid::new_v4().to_string(),
            purchase_id: purchase_id.to_string(),
            user_id: user_id.to_string(),
            kind,
            start_at,
            days: 1,
            rate_bps,
            principal_amount,
            day_index: Some(day_index),
            day_records,
            total_released: 0,
            days_released: 0,
            status: ScheduleStatus::Active,
        }
    }

    /// Get schedule ID
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Get originating purchase ID
    pub fn purchase_id(&self) -> &str {
        &self.purchase_id
    }

    /// Get beneficiary user ID
    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    /// Get entitlement kind
    pub fn kind(&self) -> ScheduleKind {
        self.kind
    }

    /// Get effective start timestamp
    pub fn start_at(&self) -> DateTime<Utc> {
        self.start_at
    }

    /// Get total number of scheduled release events
    pub fn days(&self) -> usize {
        self.days
    }

    /// Get per-day rate in basis points
    pub fn rate_bps(&self) -> u32 {
        self.rate_bps
    }

    /// Get principal amount (i64 cents)
    pub fn principal_amount(&self) -> i64 {
        self.principal_amount
    }

    /// Get the single offset day for commission kinds (None for Benefit)
    pub fn day_index(&self) -> Option<usize> {
        self.day_index
    }

    /// Per-day credit amount, derived — never stored
    ///
    /// `principal_amount × rate_bps / 10_000`, exact integer math.
    pub fn daily_amount(&self) -> i64 {
        self.principal_amount * self.rate_bps as i64 / 10_000
    }

    /// Get the day record at `day`, if in range
    pub fn day_record(&self, day: usize) -> Option<&DayRecord> {
        self.day_records.get(day)
    }

    /// Get all day records, indexed 0..days-1
    pub fn day_records(&self) -> &[DayRecord] {
        &self.day_records
    }

    /// Get sum of released amounts (i64 cents)
    pub fn total_released(&self) -> i64 {
        self.total_released
    }

    /// Get count of released days
    pub fn days_released(&self) -> usize {
        self.days_released
    }

    /// Get lifecycle status
    pub fn status(&self) -> ScheduleStatus {
        self.status
    }

    /// Whether the sweep should consider this schedule at all
    pub fn is_active(&self) -> bool {
        self.status == ScheduleStatus::Active
    }

    /// Days still Pending whose scheduled date is on or before `as_of`
    ///
    /// Ascending day order; a pure function of current state and the
    /// supplied date, so the sequence is restartable across sweeps.
    /// Due-ness is uniformly `scheduled_date <= as_of` for every kind.
    ///
    /// # Example
    /// ```
    /// use accrual_engine_rs::models::schedule::Schedule;
    /// use chrono::{Duration, Utc};
    ///
    /// let start = Utc::now();
    /// let s = Schedule::new_benefit("P-1", "U-1", 100_000, 1_250, 8, start);
    ///
    /// let due: Vec<usize> = s.due_days(start + Duration::days(3)).collect();
    /// assert_eq!(due, vec![0, 1, 2]);
    /// ```
    pub fn due_days(&self, as_of: DateTime<Utc>) -> impl Iterator<Item = usize> + '_ {
        self.day_records
            .iter()
            .enumerate()
            .filter(move |(_, record)| record.is_pending() && record.scheduled_date <= as_of)
            .map(|(day, _)| day)
    }

    /// Transition a day `Pending → Released`
    ///
    /// Stamps the release time and ledger reference, advances the
    /// aggregates, and flips the schedule to `Completed` when every day
    /// has released.
    ///
    /// **Idempotency**: if the day is not Pending this is a silent
    /// no-op returning `DayTransition::NoOp` — re-invoking settlement
    /// for an already-settled day neither double-credits nor rewrites
    /// history.
    ///
    /// # Errors
    /// `ScheduleError::DayOutOfRange` if `day >= days`.
    pub fn mark_day_released(
        &mut self,
        day: usize,
        released_at: DateTime<Utc>,
        ledger_ref: &str,
    ) -> Result<DayTransition, ScheduleError> {
        let days = self.days;
        let record = self
            .day_records
            .get_mut(day)
            .ok_or(ScheduleError::DayOutOfRange { day, days })?;

        if !record.is_pending() {
            return Ok(DayTransition::NoOp);
        }

        record.status = DayStatus::Released {
            released_at,
            ledger_ref: ledger_ref.to_string(),
        };
        self.days_released += 1;
        self.total_released += self.daily_amount();

        if self.days_released == self.days {
            self.status = ScheduleStatus::Completed;
        }

        Ok(DayTransition::Applied)
    }

    /// Transition a day `Pending → Failed`
    ///
    /// Records the rejection reason. Aggregates and schedule status are
    /// untouched: a failed day permanently excludes its credit, so the
    /// schedule can never reach `Completed` without out-of-band
    /// remediation.
    ///
    /// Same no-op-unless-Pending idempotency as
    /// [`mark_day_released`](Self::mark_day_released).
    ///
    /// # Errors
    /// `ScheduleError::DayOutOfRange` if `day >= days`.
    pub fn mark_day_failed(
        &mut self,
        day: usize,
        reason: &str,
    ) -> Result<DayTransition, ScheduleError> {
        let days = self.days;
        let record = self
            .day_records
            .get_mut(day)
            .ok_or(ScheduleError::DayOutOfRange { day, days })?;

        if !record.is_pending() {
            return Ok(DayTransition::NoOp);
        }

        record.status = DayStatus::Failed {
            error_message: reason.to_string(),
        };

        Ok(DayTransition::Applied)
    }
}
