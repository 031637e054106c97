//! Per-user lock registry
//!
//! This module provides `LockRegistry`, which hands out one fair mutual
//! exclusion handle per user. Handles are created lazily on first use and
//! shared by every request for that user.
//!
//! # Design
//!
//! Handles live in a `DashMap<UserId, Arc<Mutex<()>>>`. The get-or-create step
//! runs under the map's shard lock via `entry().or_insert_with()`, so two
//! callers can never end up with distinct handles for the same user. The shard
//! lock is released before waiting on the handle, so contention on one user
//! never holds up another.
//!
//! `tokio::sync::Mutex` grants waiters in FIFO order. Concurrent requests for
//! one user are therefore applied in the order they started waiting.
//!
//! # Release
//!
//! Acquisition returns a `UserLockGuard`; the lock is released when the guard
//! is dropped, on every exit path. A task cancelled while waiting is removed
//! from the wait queue and never receives the lock.
//!
//! # Eviction
//!
//! With `LockEviction::Retain` the map only grows. With
//! `LockEviction::EvictIdle` the guard removes its handle on release when the
//! map holds the only remaining reference. The check and the removal happen
//! under the same shard lock as get-or-create, so a handle a waiter has already
//! cloned is never removed.

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};

use super::config::LockEviction;
use crate::types::UserId;

type LockHandle = Arc<Mutex<()>>;
type LockMap = DashMap<UserId, LockHandle>;

/// Registry of per-user locks
#[derive(Debug)]
pub struct LockRegistry {
    /// One handle per user seen
    ///
    /// Shared with eviction-enabled guards so they can remove their own entry.
    locks: Arc<LockMap>,

    eviction: LockEviction,
}

impl LockRegistry {
    /// Create an empty registry that retains every handle
    pub fn new() -> Self {
        Self::with_eviction(LockEviction::Retain)
    }

    /// Create an empty registry with the given eviction policy
    pub fn with_eviction(eviction: LockEviction) -> Self {
        Self {
            locks: Arc::new(DashMap::new()),
            eviction,
        }
    }

    /// Wait for exclusive access to a user
    ///
    /// Creates the user's handle if this is the first request for the user.
    /// Waiters are granted in arrival order. Dropping the returned future
    /// before it completes leaves the lock untouched.
    pub async fn acquire(&self, user_id: UserId) -> UserLockGuard {
        let handle = self.handle(user_id);
        let guard = handle.lock_owned().await;

        tracing::trace!(user_id, "user lock acquired");

        UserLockGuard {
            user_id,
            guard: Some(guard),
            evict_from: match self.eviction {
                LockEviction::Retain => None,
                LockEviction::EvictIdle => Some(Arc::clone(&self.locks)),
            },
        }
    }

    /// Release a user's lock
    ///
    /// Equivalent to dropping the guard.
    pub fn release(&self, guard: UserLockGuard) {
        drop(guard);
    }

    /// Remove every handle nobody holds or awaits
    ///
    /// Returns the number of handles removed.
    pub fn evict_idle(&self) -> usize {
        let before = self.locks.len();
        self.locks.retain(|_, handle| Arc::strong_count(handle) > 1);
        let removed = before.saturating_sub(self.locks.len());

        if removed > 0 {
            tracing::debug!(removed, "evicted idle user locks");
        }
        removed
    }

    /// Number of handles currently in the registry
    pub fn len(&self) -> usize {
        self.locks.len()
    }

    /// Whether the registry holds no handle
    pub fn is_empty(&self) -> bool {
        self.locks.is_empty()
    }

    fn handle(&self, user_id: UserId) -> LockHandle {
        self.locks
            .entry(user_id)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .value()
            .clone()
    }
}

impl Default for LockRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Exclusive access to one user, released on drop
#[derive(Debug)]
pub struct UserLockGuard {
    user_id: UserId,
    guard: Option<OwnedMutexGuard<()>>,
    /// Set when the registry evicts idle handles
    evict_from: Option<Arc<LockMap>>,
}

impl UserLockGuard {
    /// The user this guard grants access to
    pub fn user_id(&self) -> UserId {
        self.user_id
    }
}

impl Drop for UserLockGuard {
    fn drop(&mut self) {
        // Unlock first so our own reference no longer counts against eviction.
        drop(self.guard.take());

        if let Some(locks) = &self.evict_from {
            let evicted = locks
                .remove_if(&self.user_id, |_, handle| Arc::strong_count(handle) == 1)
                .is_some();
            if evicted {
                tracing::trace!(user_id = self.user_id, "idle user lock evicted");
            }
        }
    }
}
