//! Balance-related types for the point ledger
//!
//! This module defines the BalanceRecord structure, the per-user projection
//! of committed charges and uses.

use chrono::{DateTime, Utc};

/// User identifier
///
/// Any user id is accepted, including ones never seen before.
pub type UserId = u64;

/// Point amount
///
/// Signed so that non-positive request amounts can be represented and rejected
/// instead of failing to parse.
pub type Points = i64;

/// Current point balance of a user
///
/// The stored balance always satisfies `0 <= balance <= max_balance` after a
/// committed mutation. It equals the signed sum of the user's history entries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BalanceRecord {
    /// The user this balance belongs to
    pub user_id: UserId,

    /// Current point total
    pub balance: Points,

    /// Time of the last committed mutation
    ///
    /// For users without a stored record this is the time the default record
    /// was produced.
    pub updated_at: DateTime<Utc>,
}

impl BalanceRecord {
    /// Create a record with the given balance, stamped now
    pub fn new(user_id: UserId, balance: Points) -> Self {
        Self {
            user_id,
            balance,
            updated_at: Utc::now(),
        }
    }

    /// Zero-balance record returned for users that have no stored balance yet
    pub fn empty(user_id: UserId) -> Self {
        Self::new(user_id, 0)
    }
}
