//! Rate configuration boundary
//!
//! The engine treats its numeric parameters (daily benefit rate,
//! commission percentages, unlock-day offsets) as opaque inputs read
//! from an external settings store. This module defines:
//!
//! - [`RateConfig`]: the parameter set, with fixed fallback defaults
//! - [`RateSource`]: the boundary trait to the external store
//! - [`CachedRates`]: an explicit, injected TTL cache over a source
//!
//! # Critical Invariants
//!
//! 1. All rates are integer basis points (1 bps = 0.01%) — never floats
//! 2. A failing source never fails schedule creation: the cache falls
//!    back to the last-known-good value, or the fixed defaults
//! 3. No module-level mutable state: the cache is a value the caller
//!    owns and injects

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from the external configuration store
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("Configuration store unavailable: {reason}")]
    Unavailable { reason: String },
}

/// Numeric parameters for schedule derivation
///
/// All percentages are integer basis points so that per-day amounts
/// are exact integer arithmetic on i64 cents.
///
/// # Example
/// ```
/// use accrual_engine_rs::config::RateConfig;
///
/// let rates = RateConfig::default();
/// assert_eq!(rates.benefit_daily_rate_bps, 1_250); // 12.5%/day
/// assert_eq!(rates.benefit_days, 8);
/// assert_eq!(rates.direct_unlock_days, 9); // releases on D+9
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateConfig {
    /// Direct-referral commission, basis points of principal
    pub direct_percent_bps: u32,

    /// Upline (parent) commission, basis points of principal
    pub parent_percent_bps: u32,

    /// Calendar days until the direct commission unlocks (D+n)
    pub direct_unlock_days: usize,

    /// Calendar days until the parent commission unlocks (D+n)
    pub parent_unlock_days: usize,

    /// Daily benefit payout, basis points of principal
    pub benefit_daily_rate_bps: u32,

    /// Number of daily benefit payouts per purchase
    pub benefit_days: usize,
}

impl Default for RateConfig {
    /// Fixed fallback values: 10%/10% commissions, D+9/D+17 unlocks,
    /// 12.5%/day over 8 days (a full principal return).
    fn default() -> Self {
        Self {
            direct_percent_bps: 1_000,
            parent_percent_bps: 1_000,
            direct_unlock_days: 9,
            parent_unlock_days: 17,
            benefit_daily_rate_bps: 1_250,
            benefit_days: 8,
        }
    }
}

/// Boundary to the external configuration store
///
/// Implementations load the current rate parameters; the engine never
/// reads configuration any other way.
pub trait RateSource {
    fn load(&mut self) -> Result<RateConfig, ConfigError>;
}

/// A source that always returns a fixed configuration
///
/// Used in tests and in deployments where rates are pinned.
#[derive(Debug, Clone)]
pub struct StaticRates(pub RateConfig);

impl RateSource for StaticRates {
    fn load(&mut self) -> Result<RateConfig, ConfigError> {
        Ok(self.0.clone())
    }
}

/// A source that always fails (for exercising the fallback path)
#[derive(Debug, Clone, Default)]
pub struct UnavailableRates;

impl RateSource for UnavailableRates {
    fn load(&mut self) -> Result<RateConfig, ConfigError> {
        Err(ConfigError::Unavailable {
            reason: "store down".to_string(),
        })
    }
}

/// TTL cache over a [`RateSource`]
///
/// `current(now)` returns the cached value while it is fresh, reloads
/// from the source when stale, and on load failure falls back to the
/// last-known-good value (or [`RateConfig::default`] if the source has
/// never succeeded). A failed load does not refresh the cache
/// timestamp, so the next call retries the source.
///
/// # Example
/// ```
/// use accrual_engine_rs::config::{CachedRates, RateConfig, StaticRates};
/// use chrono::Utc;
///
/// let mut rates = CachedRates::new(StaticRates(RateConfig::default()), 300);
/// let cfg = rates.current(Utc::now());
/// assert_eq!(cfg.benefit_days, 8);
/// ```
#[derive(Debug)]
pub struct CachedRates<S: RateSource> {
    source: S,
    ttl_seconds: i64,
    cached: Option<CacheEntry>,
}

#[derive(Debug, Clone)]
struct CacheEntry {
    config: RateConfig,
    loaded_at: DateTime<Utc>,
}

impl<S: RateSource> CachedRates<S> {
    /// Create a cache with the given time-to-live in seconds
    pub fn new(source: S, ttl_seconds: i64) -> Self {
        assert!(ttl_seconds >= 0, "ttl must be non-negative");
        Self {
            source,
            ttl_seconds,
            cached: None,
        }
    }

    /// Current configuration as of `now`
    ///
    /// Never fails: load errors fall back to last-known-good, then to
    /// the fixed defaults.
    pub fn current(&mut self, now: DateTime<Utc>) -> RateConfig {
        if let Some(entry) = &self.cached {
            if now - entry.loaded_at <= Duration::seconds(self.ttl_seconds) {
                return entry.config.clone();
            }
        }

        match self.source.load() {
            Ok(config) => {
                self.cached = Some(CacheEntry {
                    config: config.clone(),
                    loaded_at: now,
                });
                config
            }
            // Stale-but-known beats guessed; guessed beats nothing.
            Err(_) => match &self.cached {
                Some(entry) => entry.config.clone(),
                None => RateConfig::default(),
            },
        }
    }
}
