//! History-related types for the point ledger
//!
//! History entries are the immutable, append-only log of committed charges and
//! uses. Each successful mutation produces exactly one entry.

use super::balance::{Points, UserId};
use chrono::{DateTime, Utc};
use std::fmt;

/// History entry identifier, assigned by the history store
pub type HistoryId = u64;

/// Kind of balance mutation recorded in the history
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransactionKind {
    /// Credit points to a user
    ///
    /// Increases the balance by the entry amount. The resulting balance may not
    /// exceed the configured maximum.
    Charge,

    /// Debit points from a user
    ///
    /// Decreases the balance by the entry amount. Requires the current balance
    /// to cover the amount.
    Use,
}

impl TransactionKind {
    /// Balance delta of an entry of this kind with the given magnitude
    pub fn signed(self, amount: Points) -> Points {
        match self {
            TransactionKind::Charge => amount,
            TransactionKind::Use => -amount,
        }
    }
}

impl fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransactionKind::Charge => f.write_str("charge"),
            TransactionKind::Use => f.write_str("use"),
        }
    }
}

/// Committed charge or use
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryEntry {
    /// Store-assigned id, unique and increasing in insertion order
    pub id: HistoryId,

    /// The user whose balance was mutated
    pub user_id: UserId,

    /// Magnitude of the mutation, always positive
    pub amount: Points,

    /// Whether the mutation was a charge or a use
    pub kind: TransactionKind,

    /// Time of the mutation, identical to the balance record's `updated_at`
    pub occurred_at: DateTime<Utc>,
}
