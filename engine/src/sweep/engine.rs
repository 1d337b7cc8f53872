//! Settlement sweep — the sole mutator of day records
//!
//! `run_sweep` scans every active schedule for due-but-unreleased
//! days, posts one ledger entry per due day, and applies the resulting
//! transition. The same function serves the cron cadence and the
//! operator's "trigger now" action; there is no separate code path.
//!
//! # Sweep Flow
//!
//! ```text
//! For each active schedule (sorted, deterministic):
//!   re-check the purchase is still Confirmed (skip otherwise)
//!   For each due day, ascending:
//!     post {beneficiary, amount, kind, schedule, day, idempotency_key}
//!       Ok(ref)        -> mark_day_released  (count if Applied)
//!       Err(Rejected)  -> mark_day_failed    (continue with next day)
//!       Err(Ambiguous) -> leave Pending, log, retry next sweep
//! ```
//!
//! # Critical Invariants
//!
//! 1. **Failure isolation**: one day's failure never aborts other days
//!    or other schedules; only a catastrophic scan failure aborts a run
//! 2. **Only a definite rejection fails a day** — ambiguous outcomes
//!    stay Pending so no credit is ever lost to an unknown outcome
//! 3. **Optimistic concurrency**: no lock is held across the ledger
//!    call; the Pending precondition on the day record is the sole
//!    guard, so overlapping sweeps converge instead of double-posting

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::ledger::{idempotency_key, Ledger, LedgerEntry, LedgerError};
use crate::models::book::ScheduleBook;
use crate::models::event::{AttemptOutcome, SweepAttempt};
use crate::models::schedule::{DayTransition, ScheduleKind};

/// Catastrophic sweep failures
///
/// Per-day and per-schedule outcomes never surface here; only a
/// failure of the sweep's own control flow does, and the external
/// trigger retries the whole run at the next cadence.
#[derive(Debug, Error, PartialEq)]
pub enum SweepError {
    #[error("Cannot enumerate active schedules: {reason}")]
    ScheduleScan { reason: String },
}

/// Per-kind tallies for one sweep run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KindCounts {
    /// Days transitioned to Released by this run
    pub released: usize,

    /// Days transitioned to Failed by this run
    pub failed: usize,

    /// Due days skipped because the purchase is reversed or unknown
    pub skipped: usize,

    /// Due days left Pending on an ambiguous ledger outcome
    pub retried: usize,
}

/// Summary of one sweep run — observability output, not durable state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SweepReport {
    /// The date the sweep evaluated due-ness against
    pub as_of: DateTime<Utc>,

    /// Benefit-schedule tallies
    pub benefit: KindCounts,

    /// Referrer-commission tallies
    pub referrer: KindCounts,

    /// Parent-commission tallies
    pub parent: KindCounts,

    /// Total amount settled this run (i64 cents)
    pub total_settled: i64,

    /// Every posting attempt, including skips and ambiguous retries
    pub attempts: Vec<SweepAttempt>,
}

impl SweepReport {
    fn new(as_of: DateTime<Utc>) -> Self {
        Self {
            as_of,
            benefit: KindCounts::default(),
            referrer: KindCounts::default(),
            parent: KindCounts::default(),
            total_settled: 0,
            attempts: Vec::new(),
        }
    }

    /// Tallies for one kind
    pub fn counts(&self, kind: ScheduleKind) -> &KindCounts {
        match kind {
            ScheduleKind::Benefit => &self.benefit,
            ScheduleKind::Referrer => &self.referrer,
            ScheduleKind::Parent => &self.parent,
        }
    }

    fn counts_mut(&mut self, kind: ScheduleKind) -> &mut KindCounts {
        match kind {
            ScheduleKind::Benefit => &mut self.benefit,
            ScheduleKind::Referrer => &mut self.referrer,
            ScheduleKind::Parent => &mut self.parent,
        }
    }

    /// Days released across all kinds
    pub fn total_released_days(&self) -> usize {
        self.benefit.released + self.referrer.released + self.parent.released
    }

    /// Days failed across all kinds
    pub fn total_failed_days(&self) -> usize {
        self.benefit.failed + self.referrer.failed + self.parent.failed
    }

    /// Serialize the report for reporting/metrics collaborators
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// Run one settlement sweep as of the given date
///
/// Idempotent: invoking it twice for the same `as_of` (or
/// concurrently, via a retried cron trigger overlapping a manual one)
/// converges to the same end state. The no-op-unless-Pending rule on
/// day records plus the deterministic idempotency key on every posting
/// mean a duplicate run neither double-credits nor rewrites history.
///
/// # Errors
/// `SweepError` only for catastrophic control-flow failure; per-day
/// ledger outcomes are absorbed into the report.
///
/// # Example
/// ```
/// use accrual_engine_rs::ledger::RecordingLedger;
/// use accrual_engine_rs::models::book::ScheduleBook;
/// use accrual_engine_rs::models::purchase::Purchase;
/// use accrual_engine_rs::models::schedule::Schedule;
/// use accrual_engine_rs::sweep::run_sweep;
/// use chrono::{Duration, Utc};
///
/// let mut book = ScheduleBook::new();
/// let t0 = Utc::now();
/// book.upsert_purchase(Purchase::confirmed("P-1", "U-1", 100_000, t0));
/// book.insert_schedule(Schedule::new_benefit("P-1", "U-1", 100_000, 1_250, 8, t0))
///     .unwrap();
///
/// let mut ledger = RecordingLedger::new();
/// let report = run_sweep(&mut book, &mut ledger, t0 + Duration::days(2)).unwrap();
/// assert_eq!(report.benefit.released, 2);
/// assert_eq!(report.total_settled, 25_000);
/// ```
pub fn run_sweep<L: Ledger>(
    book: &mut ScheduleBook,
    ledger: &mut L,
    as_of: DateTime<Utc>,
) -> Result<SweepReport, SweepError> {
    let mut report = SweepReport::new(as_of);

    // Deterministic processing order across invocations; no ordering
    // is promised across schedules, only within one schedule's days.
    for schedule_id in book.active_schedule_ids() {
        // Read phase: collect everything needed for posting so no
        // borrow of the book is held across the ledger call.
        let (kind, user_id, daily_amount, purchase_active, due) = {
            let schedule = match book.get_schedule(&schedule_id) {
                Some(s) => s,
                None => continue,
            };
            let purchase_active = book
                .get_purchase(schedule.purchase_id())
                .map(|p| p.is_active())
                .unwrap_or(false);
            let due: Vec<usize> = schedule.due_days(as_of).collect();
            (
                schedule.kind(),
                schedule.user_id().to_string(),
                schedule.daily_amount(),
                purchase_active,
                due,
            )
        };

        // Cross-check the purchase's *current* status, not its status
        // at creation time: a reversed purchase's due days are skipped.
        if !purchase_active {
            for day in due {
                report.counts_mut(kind).skipped += 1;
                report.attempts.push(SweepAttempt {
                    schedule_id: schedule_id.clone(),
                    day,
                    kind,
                    amount: daily_amount,
                    outcome: AttemptOutcome::SkippedPurchaseInactive,
                    at: as_of,
                });
            }
            continue;
        }

        for day in due {
            let entry = LedgerEntry {
                beneficiary_user_id: user_id.clone(),
                amount: daily_amount,
                kind,
                source_schedule_id: schedule_id.clone(),
                day,
                idempotency_key: idempotency_key(&schedule_id, day),
            };

            // Blocking I/O boundary: no book borrow is held here.
            let outcome = ledger.post(&entry);

            let schedule = match book.get_schedule_mut(&schedule_id) {
                Some(s) => s,
                None => continue,
            };

            match outcome {
                Ok(ledger_ref) => {
                    // Day indices come from this schedule's own due
                    // list, so out-of-range cannot occur; a racing
                    // sweep may have settled the day first (NoOp).
                    let transition = schedule
                        .mark_day_released(day, as_of, &ledger_ref)
                        .unwrap_or(DayTransition::NoOp);
                    if transition == DayTransition::Applied {
                        report.counts_mut(kind).released += 1;
                        report.total_settled += daily_amount;
                        report.attempts.push(SweepAttempt {
                            schedule_id: schedule_id.clone(),
                            day,
                            kind,
                            amount: daily_amount,
                            outcome: AttemptOutcome::Released { ledger_ref },
                            at: as_of,
                        });
                    }
                }
                Err(LedgerError::Rejected { reason }) => {
                    let transition = schedule
                        .mark_day_failed(day, &reason)
                        .unwrap_or(DayTransition::NoOp);
                    if transition == DayTransition::Applied {
                        report.counts_mut(kind).failed += 1;
                        report.attempts.push(SweepAttempt {
                            schedule_id: schedule_id.clone(),
                            day,
                            kind,
                            amount: daily_amount,
                            outcome: AttemptOutcome::Failed { reason },
                            at: as_of,
                        });
                    }
                }
                Err(LedgerError::Ambiguous { reason }) => {
                    // Unknown outcome: the day stays Pending and the
                    // next sweep retries it with the same idempotency
                    // key. Never fail a day on ambiguity.
                    report.counts_mut(kind).retried += 1;
                    report.attempts.push(SweepAttempt {
                        schedule_id: schedule_id.clone(),
                        day,
                        kind,
                        amount: daily_amount,
                        outcome: AttemptOutcome::AmbiguousRetry { reason },
                        at: as_of,
                    });
                }
            }
        }
    }

    Ok(report)
}
