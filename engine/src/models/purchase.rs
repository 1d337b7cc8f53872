//! Confirmed-purchase input type
//!
//! A purchase is owned by the external payment workflow; the engine
//! only consumes a confirmed purchase to derive schedules, and
//! re-checks its status at sweep time. A purchase that is later
//! reversed keeps its schedules on the books but the sweep skips them.
//!
//! CRITICAL: principal_amount is i64 cents.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Current standing of a purchase, as reported by the payment workflow
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PurchaseStatus {
    /// Payment confirmed; schedules accrue and release normally
    Confirmed,

    /// Payment reversed after confirmation; schedules are skipped at
    /// sweep time even when days are due
    Reversed,
}

/// A confirmed purchase — the event that creates entitlement schedules
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Purchase {
    /// Unique purchase identifier (owned by the payment workflow)
    pub id: String,

    /// Beneficiary of the benefit schedule
    pub buyer_user_id: String,

    /// Principal amount in i64 cents (must be positive)
    pub principal_amount: i64,

    /// Payment-confirmation timestamp; effective start of all of this
    /// purchase's schedules
    pub confirmed_at: DateTime<Utc>,

    /// Current standing, re-checked by every sweep
    pub status: PurchaseStatus,
}

impl Purchase {
    /// Create a confirmed purchase
    ///
    /// # Example
    /// ```
    /// use accrual_engine_rs::models::purchase::Purchase;
    /// use chrono::Utc;
    ///
    /// let p = Purchase::confirmed("P-1", "U-1", 100_000, Utc::now());
    /// assert!(p.is_active());
    /// ```
    pub fn confirmed(
        id: &str,
        buyer_user_id: &str,
        principal_amount: i64,
        confirmed_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: id.to_string(),
            buyer_user_id: buyer_user_id.to_string(),
            principal_amount,
            confirmed_at,
            status: PurchaseStatus::Confirmed,
        }
    }

    /// Whether schedules of this purchase may release
    pub fn is_active(&self) -> bool {
        self.status == PurchaseStatus::Confirmed
    }
}
