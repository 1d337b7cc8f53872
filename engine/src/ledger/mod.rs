//! Outbound ledger boundary
//!
//! The ledger is the external system of record that receives postings;
//! this engine only produces posting requests and interprets the three
//! possible outcomes:
//!
//! - a reference id (success)
//! - a **definite rejection** — the only outcome allowed to fail a day
//! - an **ambiguous failure** (timeout, unknown) — the day must stay
//!   Pending and be retried, because "money moved, status not
//!   recorded" is the corruption this design must never allow
//!
//! Every entry carries a deterministic idempotency key derived from
//! `(schedule_id, day)`, so a retried or overlapping sweep presents
//! the same token to the ledger and converges instead of
//! double-crediting.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;

use crate::models::schedule::ScheduleKind;

/// Outcomes of a posting other than success
///
/// `Rejected` is terminal for the day; `Ambiguous` is retryable.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum LedgerError {
    #[error("Ledger rejected posting: {reason}")]
    Rejected { reason: String },

    #[error("Ledger outcome unknown: {reason}")]
    Ambiguous { reason: String },
}

/// A posting request sent to the external ledger
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerEntry {
    /// Account to credit
    pub beneficiary_user_id: String,

    /// Credit amount (i64 cents)
    pub amount: i64,

    /// Entitlement kind the credit settles
    pub kind: ScheduleKind,

    /// Schedule the credit originates from
    pub source_schedule_id: String,

    /// Day index within the schedule (0-based)
    pub day: usize,

    /// Deterministic token: same (schedule, day) → same key, always
    pub idempotency_key: String,
}

/// The posting boundary
///
/// `&mut self` because real implementations carry connections or
/// buffers; the engine holds no lock across a call.
pub trait Ledger {
    /// Post one entry; returns the ledger's reference id on success
    fn post(&mut self, entry: &LedgerEntry) -> Result<String, LedgerError>;
}

/// Deterministic idempotency token for a `(schedule, day)` pair
///
/// Lowercase-hex SHA-256 of `"{schedule_id}:{day}"`. Stable across
/// sweeps and processes, distinct across days.
///
/// # Example
/// ```
/// use accrual_engine_rs::ledger::idempotency_key;
///
/// let a = idempotency_key("S-1", 0);
/// let b = idempotency_key("S-1", 0);
/// let c = idempotency_key("S-1", 1);
/// assert_eq!(a, b);
/// assert_ne!(a, c);
/// assert_eq!(a.len(), 64);
/// ```
pub fn idempotency_key(schedule_id: &str, day: usize) -> String {
    let mut hasher = Sha256::new();
    hasher.update(schedule_id.as_bytes());
    hasher.update(b":");
    hasher.update(day.to_string().as_bytes());
    format!("{:x}", hasher.finalize())
}

// ============================================================================
// Test Doubles
// ============================================================================
//
// Shipped in the library (not behind cfg(test)) so integration tests
// and downstream collaborators can drive the sweep against scripted
// ledger behavior.

/// A ledger that always succeeds and records every entry it saw
///
/// Reference ids are `"LR-0"`, `"LR-1"`, ... in posting order.
#[derive(Debug, Default)]
pub struct RecordingLedger {
    /// Every entry posted, in order
    pub posted: Vec<LedgerEntry>,
}

impl RecordingLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of entries posted so far
    pub fn num_posted(&self) -> usize {
        self.posted.len()
    }
}

impl Ledger for RecordingLedger {
    fn post(&mut self, entry: &LedgerEntry) -> Result<String, LedgerError> {
        let reference = format!("LR-{}", self.posted.len());
        self.posted.push(entry.clone());
        Ok(reference)
    }
}

/// A ledger with per-(schedule, day) scripted outcomes
///
/// Unscripted entries succeed like [`RecordingLedger`]. Scripts are
/// consulted on every post, so a day scripted `Ambiguous` keeps timing
/// out until the script is cleared.
#[derive(Debug, Default)]
pub struct ScriptedLedger {
    /// Every entry posted (including rejected/ambiguous attempts)
    pub posted: Vec<LedgerEntry>,
    scripts: HashMap<(String, usize), LedgerError>,
}

impl ScriptedLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Script a definite rejection for one (schedule, day)
    pub fn reject(&mut self, schedule_id: &str, day: usize, reason: &str) {
        self.scripts.insert(
            (schedule_id.to_string(), day),
            LedgerError::Rejected {
                reason: reason.to_string(),
            },
        );
    }

    /// Script an ambiguous outcome for one (schedule, day)
    pub fn time_out(&mut self, schedule_id: &str, day: usize) {
        self.scripts.insert(
            (schedule_id.to_string(), day),
            LedgerError::Ambiguous {
                reason: "timeout".to_string(),
            },
        );
    }

    /// Remove any script for one (schedule, day); it will now succeed
    pub fn clear(&mut self, schedule_id: &str, day: usize) {
        self.scripts.remove(&(schedule_id.to_string(), day));
    }

    /// Entries that actually settled (scripted failures excluded)
    pub fn num_settled(&self) -> usize {
        self.posted
            .iter()
            .filter(|e| {
                !self
                    .scripts
                    .contains_key(&(e.source_schedule_id.clone(), e.day))
            })
            .count()
    }
}

impl Ledger for ScriptedLedger {
    fn post(&mut self, entry: &LedgerEntry) -> Result<String, LedgerError> {
        self.posted.push(entry.clone());
        if let Some(err) = self
            .scripts
            .get(&(entry.source_schedule_id.clone(), entry.day))
        {
            return Err(err.clone());
        }
        Ok(format!("LR-{}", self.posted.len() - 1))
    }
}
