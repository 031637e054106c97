//! In-memory history store
//!
//! This module provides `InMemoryHistoryStore`, an append-only `HistoryStore`
//! keeping each user's entries in insertion order.
//!
//! # Ordering
//!
//! Ids come from a single atomic counter and are taken while the user's entry
//! list is held, so for any one user id order and list order agree. Appends for
//! different users proceed concurrently; appends for the same user are
//! serialized by the caller's per-user lock.

use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use dashmap::DashMap;

use super::traits::HistoryStore;
use crate::types::{HistoryEntry, HistoryId, PointError, Points, TransactionKind, UserId};

/// Thread-safe append-only history store
#[derive(Debug)]
pub struct InMemoryHistoryStore {
    /// Entries per user, oldest first
    entries: DashMap<UserId, Vec<HistoryEntry>>,

    /// Next id to assign; ids start at 1
    next_id: AtomicU64,
}

impl InMemoryHistoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
            next_id: AtomicU64::new(1),
        }
    }
}

impl Default for InMemoryHistoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl HistoryStore for InMemoryHistoryStore {
    fn append(
        &self,
        user_id: UserId,
        amount: Points,
        kind: TransactionKind,
        occurred_at: DateTime<Utc>,
    ) -> Result<HistoryEntry, PointError> {
        let mut user_entries = self.entries.entry(user_id).or_insert_with(Vec::new);

        let id: HistoryId = self.next_id.fetch_add(1, Ordering::Relaxed);
        let entry = HistoryEntry {
            id,
            user_id,
            amount,
            kind,
            occurred_at,
        };
        user_entries.push(entry.clone());

        Ok(entry)
    }

    fn list_by_user(&self, user_id: UserId) -> Result<Vec<HistoryEntry>, PointError> {
        Ok(self
            .entries
            .get(&user_id)
            .map(|entry| entry.value().clone())
            .unwrap_or_default())
    }
}
