//! Accrual & Release Engine
//!
//! Deterministic scheduler/settler for time-boxed monetary
//! entitlements. Every confirmed purchase yields daily "benefit"
//! payouts plus referral commissions vesting on fixed day offsets; a
//! periodic, idempotent sweep settles due days against an external
//! append-only ledger.
//!
//! # Architecture
//!
//! - **core**: calendar-day scheduling arithmetic
//! - **config**: rate configuration boundary (TTL cache + defaults)
//! - **models**: domain types (Purchase, Schedule, ScheduleBook)
//! - **factory**: schedule derivation from confirmed purchases
//! - **ledger**: outbound posting boundary + test doubles
//! - **sweep**: the settlement sweep engine
//! - **reporting**: read-only completion/metrics projections
//!
//! # Critical Invariants
//!
//! 1. All money values are i64 (cents); rates are integer basis points
//! 2. A day record leaves `Pending` exactly once; the
//!    no-op-unless-Pending rule makes every mutator idempotent under
//!    retries and overlapping sweeps
//! 3. Only a definite ledger rejection may fail a day; ambiguous
//!    outcomes stay Pending and are retried
//! 4. Ledger postings carry a deterministic idempotency key derived
//!    from `(schedule_id, day)`

// Module declarations
pub mod config;
pub mod core;
pub mod factory;
pub mod ledger;
pub mod models;
pub mod reporting;
pub mod sweep;

// Re-exports for convenience
pub use config::{CachedRates, ConfigError, RateConfig, RateSource, StaticRates};
pub use factory::{
    create_benefit_schedule, create_commission_schedules, on_purchase_confirmed,
    ConfirmationOutcome, Created, CreationError,
};
pub use ledger::{
    idempotency_key, Ledger, LedgerEntry, LedgerError, RecordingLedger, ScriptedLedger,
};
pub use models::{
    book::{BookError, ScheduleBook},
    event::{AttemptOutcome, SweepAttempt},
    purchase::{Purchase, PurchaseStatus},
    schedule::{
        DayRecord, DayStatus, DayTransition, Schedule, ScheduleError, ScheduleKind,
        ScheduleStatus,
    },
};
pub use sweep::{run_sweep, KindCounts, SweepError, SweepReport};
