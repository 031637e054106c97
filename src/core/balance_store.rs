//! In-memory balance store
//!
//! This module provides `InMemoryBalanceStore`, a `BalanceStore` backed by
//! `DashMap`. It offers the same guarantees as the external store contract:
//! each read and each upsert is atomic on its own, nothing more.

use chrono::{DateTime, Utc};
use dashmap::DashMap;

use super::traits::BalanceStore;
use crate::types::{BalanceRecord, PointError, Points, UserId};

/// Thread-safe balance store keyed by user
///
/// DashMap shards its locks internally, so reads and writes for different
/// users never contend on a global lock. Shard locks are held only for the
/// duration of a single call.
#[derive(Debug, Default)]
pub struct InMemoryBalanceStore {
    balances: DashMap<UserId, BalanceRecord>,
}

impl InMemoryBalanceStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self {
            balances: DashMap::new(),
        }
    }
}

impl BalanceStore for InMemoryBalanceStore {
    fn read(&self, user_id: UserId) -> Result<BalanceRecord, PointError> {
        Ok(self
            .balances
            .get(&user_id)
            .map(|entry| entry.value().clone())
            .unwrap_or_else(|| BalanceRecord::empty(user_id)))
    }

    fn upsert(
        &self,
        user_id: UserId,
        balance: Points,
        updated_at: DateTime<Utc>,
    ) -> Result<BalanceRecord, PointError> {
        let record = BalanceRecord {
            user_id,
            balance,
            updated_at,
        };
        self.balances.insert(user_id, record.clone());
        Ok(record)
    }
}
