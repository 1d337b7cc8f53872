//! Settlement sweep engine
//!
//! See `engine.rs` for the sweep algorithm and its idempotency and
//! failure-isolation guarantees.

pub mod engine;

// Re-export public API
pub use engine::{run_sweep, KindCounts, SweepError, SweepReport};
