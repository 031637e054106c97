//! Store traits consumed by the point service
//!
//! The balance and history stores are external collaborators. They offer
//! single-operation atomicity only: no multi-key transactions and no locking
//! across calls. The per-user lock held by `PointService` is the only
//! protection against lost updates.

use chrono::{DateTime, Utc};

use crate::types::{BalanceRecord, HistoryEntry, PointError, Points, TransactionKind, UserId};

/// Keyed read and upsert of balance records
///
/// Implementations must be shareable across tasks. In-memory and persistent
/// backends are interchangeable behind this trait.
pub trait BalanceStore: Send + Sync {
    /// Read the balance record of a user
    ///
    /// Returns a zero-balance record for users without a stored record; never
    /// fails for unknown users.
    fn read(&self, user_id: UserId) -> Result<BalanceRecord, PointError>;

    /// Overwrite the balance of a user unconditionally
    ///
    /// No optimistic-concurrency token is checked.
    fn upsert(
        &self,
        user_id: UserId,
        balance: Points,
        updated_at: DateTime<Utc>,
    ) -> Result<BalanceRecord, PointError>;
}

/// Append-only store of history entries
pub trait HistoryStore: Send + Sync {
    /// Append an entry and assign its id
    fn append(
        &self,
        user_id: UserId,
        amount: Points,
        kind: TransactionKind,
        occurred_at: DateTime<Utc>,
    ) -> Result<HistoryEntry, PointError>;

    /// All entries of a user in insertion order, empty if none exist
    fn list_by_user(&self, user_id: UserId) -> Result<Vec<HistoryEntry>, PointError>;
}
