//! Schedule book — the engine's in-memory system of record
//!
//! Holds every schedule and every purchase the engine has seen, plus
//! the uniqueness index that makes creation idempotent:
//!
//! - exactly one `Benefit` schedule per purchase
//! - at most one `Referrer` and one `Parent` schedule per
//!   `(purchase, kind, day_index)`
//!
//! # Critical Invariants
//!
//! 1. **Schedule Uniqueness**: each `(purchase_id, kind, day_index)`
//!    maps to at most one schedule
//! 2. **No Deletion**: schedules are durable financial records; the
//!    book never removes one
//! 3. **Referential Integrity**: every schedule's purchase_id refers
//!    to a purchase the sweep can re-check (an unknown purchase is
//!    skipped, never a panic)

use std::collections::HashMap;

use thiserror::Error;

use crate::models::purchase::{Purchase, PurchaseStatus};
use crate::models::schedule::{Schedule, ScheduleKind};

/// Uniqueness key for idempotent creation
type ScheduleKey = (String, ScheduleKind, Option<usize>);

/// Errors from book operations
#[derive(Debug, Error, PartialEq)]
pub enum BookError {
    #[error("Schedule already exists for purchase {purchase_id} ({kind:?}, day_index {day_index:?}): {existing_id}")]
    DuplicateSchedule {
        purchase_id: String,
        kind: ScheduleKind,
        day_index: Option<usize>,
        existing_id: String,
    },
}

/// All schedules and purchases known to the engine
///
/// # Example
/// ```
/// use accrual_engine_rs::models::book::ScheduleBook;
/// use accrual_engine_rs::models::purchase::Purchase;
/// use accrual_engine_rs::models::schedule::Schedule;
/// use chrono::Utc;
///
/// let mut book = ScheduleBook::new();
/// book.upsert_purchase(Purchase::confirmed("P-1", "U-1", 100_000, Utc::now()));
///
/// let s = Schedule::new_benefit("P-1", "U-1", 100_000, 1_250, 8, Utc::now());
/// let id = book.insert_schedule(s).unwrap();
/// assert!(book.get_schedule(&id).is_some());
/// ```
#[derive(Debug, Clone, Default)]
pub struct ScheduleBook {
    /// All schedules, indexed by schedule ID
    schedules: HashMap<String, Schedule>,

    /// All purchases, indexed by purchase ID
    purchases: HashMap<String, Purchase>,

    /// Uniqueness index: (purchase, kind, day_index) → schedule ID
    by_key: HashMap<ScheduleKey, String>,
}

impl ScheduleBook {
    /// Create an empty book
    pub fn new() -> Self {
        Self::default()
    }

    /// Register or refresh a purchase
    ///
    /// First registration stores the purchase as given. A repeated
    /// registration (retried confirmation event) only refreshes the
    /// status field; the principal and timestamps of the original
    /// record stay authoritative.
    pub fn upsert_purchase(&mut self, purchase: Purchase) {
        match self.purchases.get_mut(&purchase.id) {
            Some(existing) => existing.status = purchase.status,
            None => {
                self.purchases.insert(purchase.id.clone(), purchase);
            }
        }
    }

    /// Update a purchase's standing (e.g., a later reversal)
    ///
    /// Returns false if the purchase is unknown.
    pub fn set_purchase_status(&mut self, purchase_id: &str, status: PurchaseStatus) -> bool {
        match self.purchases.get_mut(purchase_id) {
            Some(purchase) => {
                purchase.status = status;
                true
            }
            None => false,
        }
    }

    /// Get reference to a purchase by ID
    pub fn get_purchase(&self, id: &str) -> Option<&Purchase> {
        self.purchases.get(id)
    }

    /// Insert a schedule, enforcing the uniqueness index
    ///
    /// # Errors
    /// `BookError::DuplicateSchedule` (carrying the existing id) if a
    /// schedule with the same `(purchase, kind, day_index)` is already
    /// on the books. Callers that want idempotent creation treat that
    /// error as a skip, not a failure.
    pub fn insert_schedule(&mut self, schedule: Schedule) -> Result<String, BookError> {
        let key = (
            schedule.purchase_id().to_string(),
            schedule.kind(),
            schedule.day_index(),
        );

        if let Some(existing_id) = self.by_key.get(&key) {
            return Err(BookError::DuplicateSchedule {
                purchase_id: key.0,
                kind: key.1,
                day_index: key.2,
                existing_id: existing_id.clone(),
            });
        }

        let id = schedule.id().to_string();
        self.by_key.insert(key, id.clone());
        self.schedules.insert(id.clone(), schedule);
        Ok(id)
    }

    /// Get reference to a schedule by ID
    pub fn get_schedule(&self, id: &str) -> Option<&Schedule> {
        self.schedules.get(id)
    }

    /// Get mutable reference to a schedule by ID
    pub fn get_schedule_mut(&mut self, id: &str) -> Option<&mut Schedule> {
        self.schedules.get_mut(id)
    }

    /// Look up a schedule by its uniqueness key
    pub fn find_schedule_id(
        &self,
        purchase_id: &str,
        kind: ScheduleKind,
        day_index: Option<usize>,
    ) -> Option<&str> {
        self.by_key
            .get(&(purchase_id.to_string(), kind, day_index))
            .map(String::as_str)
    }

    /// Iterate over all schedules
    pub fn schedules(&self) -> impl Iterator<Item = &Schedule> {
        self.schedules.values()
    }

    /// IDs of schedules the sweep should consider, sorted for
    /// deterministic processing order across invocations
    pub fn active_schedule_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self
            .schedules
            .values()
            .filter(|s| s.is_active())
            .map(|s| s.id().to_string())
            .collect();
        ids.sort();
        ids
    }

    /// Number of schedules on the books
    pub fn num_schedules(&self) -> usize {
        self.schedules.len()
    }

    /// Number of purchases on the books
    pub fn num_purchases(&self) -> usize {
        self.purchases.len()
    }
}
