//! Operation records replayed by the command-line driver

use super::balance::{Points, UserId};
use super::history::TransactionKind;

/// One requested charge or use, as read from replay input
///
/// The amount is carried as given; non-positive amounts are rejected by the
/// point service, not by the reader.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperationRecord {
    /// Whether to charge or use points
    pub kind: TransactionKind,

    /// Target user
    pub user_id: UserId,

    /// Requested amount
    pub amount: Points,
}
