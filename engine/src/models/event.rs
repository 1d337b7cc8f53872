//! Sweep attempt log
//!
//! Every ledger-posting attempt a sweep makes is recorded, including
//! the ones that settle nothing: ambiguous outcomes that stay pending
//! and schedules skipped for an inactive purchase. The log rides on
//! the [`SweepReport`](crate::sweep::SweepReport) for downstream
//! observability; it is not part of the durable model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::schedule::ScheduleKind;

/// Outcome of one per-day posting attempt
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AttemptOutcome {
    /// Ledger confirmed the posting; the day transitioned to Released
    Released { ledger_ref: String },

    /// Ledger definitively rejected; the day transitioned to Failed
    Failed { reason: String },

    /// Ambiguous outcome (timeout, unknown); the day stays Pending and
    /// will be retried on the next sweep
    AmbiguousRetry { reason: String },

    /// The schedule's purchase is reversed or unknown; no posting was
    /// attempted for this due day
    SkippedPurchaseInactive,
}

/// One entry in a sweep's attempt log
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SweepAttempt {
    /// Schedule the attempt belongs to
    pub schedule_id: String,

    /// Day index within the schedule (0-based)
    pub day: usize,

    /// Entitlement kind of the schedule
    pub kind: ScheduleKind,

    /// Credit amount at stake (i64 cents)
    pub amount: i64,

    /// What happened
    pub outcome: AttemptOutcome,

    /// When the attempt was made
    pub at: DateTime<Utc>,
}
