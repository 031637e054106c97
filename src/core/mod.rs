//! Core business logic module
//!
//! This module contains the point ledger components:
//! - `traits` - Store contracts consumed by the service
//! - `config` - Balance ceiling and lock eviction policy
//! - `lock_registry` - Fair per-user locks
//! - `balance_store` / `history_store` - In-memory store implementations
//! - `service` - Charge, use, and query orchestration

pub mod balance_store;
pub mod config;
pub mod history_store;
pub mod lock_registry;
pub mod service;
pub mod traits;

pub use balance_store::InMemoryBalanceStore;
pub use config::{LedgerConfig, LockEviction, MAX_BALANCE};
pub use history_store::InMemoryHistoryStore;
pub use lock_registry::{LockRegistry, UserLockGuard};
pub use service::PointService;
pub use traits::{BalanceStore, HistoryStore};
