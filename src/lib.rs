//! Point Ledger Library
//! # Overview
//!
//! This library manages per-user point balances with four operations: charge,
//! use, balance query, and history query. Mutations for the same user are
//! serialized through a fair per-user lock; mutations for different users run
//! in parallel.
//!
//! # Architecture
//!
//! - [`types`] - Core data types (BalanceRecord, HistoryEntry, errors)
//! - [`core`] - Business logic components:
//!   - [`core::service`] - Charge/use validation and atomic balance+history writes
//!   - [`core::lock_registry`] - Lazily created, FIFO-fair per-user locks
//!   - [`core::traits`] - Balance and history store contracts
//! - [`replay`] - Replays an operations CSV through the service
//! - [`io`] - CSV reading and balance output
//! - [`cli`] - CLI arguments parsing
//! - [`logging`] - tracing subscriber setup
//!
//! # Invariants
//!
//! - `0 <= balance <= max_balance` after every committed mutation
//! - Every committed mutation appends exactly one history entry
//! - A user's history order equals the order in which mutations acquired the
//!   user's lock
//! - Rejected mutations write nothing

pub mod cli;
pub mod core;
pub mod io;
pub mod logging;
pub mod replay;
pub mod types;

pub use crate::core::{
    BalanceStore, HistoryStore, InMemoryBalanceStore, InMemoryHistoryStore, LedgerConfig,
    LockEviction, LockRegistry, PointService, MAX_BALANCE,
};
pub use types::{
    BalanceRecord, HistoryEntry, HistoryId, OperationRecord, PointError, Points, TransactionKind,
    UserId,
};
