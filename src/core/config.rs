//! Ledger configuration
//!
//! Holds the balance ceiling and the lock eviction policy shared by the point
//! service and the lock registry.

use crate::types::Points;

/// Default upper bound on any user's balance
pub const MAX_BALANCE: Points = 1000;

/// What the lock registry does with a user's lock once nobody uses it
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LockEviction {
    /// Keep every lock for the lifetime of the registry
    ///
    /// Memory grows with the number of distinct users seen.
    #[default]
    Retain,

    /// Drop a user's lock as soon as no task holds or awaits it
    EvictIdle,
}

/// Configuration for the point service
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerConfig {
    /// Inclusive upper bound on a user's balance
    pub max_balance: Points,
    /// Lock eviction policy
    pub lock_eviction: LockEviction,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            max_balance: MAX_BALANCE,
            lock_eviction: LockEviction::Retain,
        }
    }
}

impl LedgerConfig {
    /// Create a LedgerConfig with custom values
    ///
    /// A non-positive `max_balance` would reject every charge, so it falls
    /// back to the default with a warning.
    pub fn new(max_balance: Points, lock_eviction: LockEviction) -> Self {
        let max_balance = if max_balance <= 0 {
            tracing::warn!(
                max_balance,
                default = MAX_BALANCE,
                "invalid max_balance, using default"
            );
            MAX_BALANCE
        } else {
            max_balance
        };

        Self {
            max_balance,
            lock_eviction,
        }
    }

    /// Same configuration with a different balance ceiling
    pub fn with_max_balance(self, max_balance: Points) -> Self {
        Self::new(max_balance, self.lock_eviction)
    }

    /// Same configuration with a different eviction policy
    pub fn with_lock_eviction(self, lock_eviction: LockEviction) -> Self {
        Self {
            lock_eviction,
            ..self
        }
    }
}
