//! Types module
//!
//! Contains core data structures used throughout the application.
//! This module organizes types into logical submodules:
//! - `balance`: Balance records and identifier aliases
//! - `history`: History entries and transaction kinds
//! - `operation`: Replay input records
//! - `error`: Error types for the point ledger

pub mod balance;
pub mod error;
pub mod history;
pub mod operation;

pub use balance::{BalanceRecord, Points, UserId};
pub use error::PointError;
pub use history::{HistoryEntry, HistoryId, TransactionKind};
pub use operation::OperationRecord;
