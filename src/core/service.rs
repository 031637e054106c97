//! Point service: charge, use, and balance/history queries
//!
//! This module provides `PointService`, which coordinates the lock registry
//! with the balance and history stores.
//!
//! # Architecture
//!
//! ```text
//! PointService
//!     ├── Arc<LockRegistry>  (per-user fair locks)
//!     ├── Arc<BalanceStore>  (current balances)
//!     └── Arc<HistoryStore>  (append-only history)
//! ```
//!
//! # Mutations
//!
//! `charge` and `use_points` run the same critical section:
//! 1. Acquire the user's lock
//! 2. Re-read the current balance
//! 3. Validate the amount against that balance
//! 4. Write the new balance, then append the history entry
//! 5. Release the lock (guard drop, on every exit path)
//!
//! Validation happens before any write, so a rejected request leaves no trace.
//! Store calls are synchronous, so there is no await point between the two
//! writes and a cancelled request commits either both or neither.
//!
//! # Queries
//!
//! `get_balance` and `get_history` never take the lock. They observe the last
//! write each store has completed.

use std::sync::Arc;

use chrono::Utc;

use super::balance_store::InMemoryBalanceStore;
use super::config::LedgerConfig;
use super::history_store::InMemoryHistoryStore;
use super::lock_registry::LockRegistry;
use super::traits::{BalanceStore, HistoryStore};
use crate::types::{BalanceRecord, HistoryEntry, PointError, Points, TransactionKind, UserId};

/// Per-user point balance service
///
/// Cheap to clone; clones share the same stores and lock registry and can be
/// moved into concurrently running tasks.
#[derive(Debug)]
pub struct PointService<B = InMemoryBalanceStore, H = InMemoryHistoryStore> {
    balances: Arc<B>,
    history: Arc<H>,
    locks: Arc<LockRegistry>,
    config: LedgerConfig,
}

impl<B, H> Clone for PointService<B, H> {
    fn clone(&self) -> Self {
        Self {
            balances: Arc::clone(&self.balances),
            history: Arc::clone(&self.history),
            locks: Arc::clone(&self.locks),
            config: self.config.clone(),
        }
    }
}

impl PointService {
    /// Create a service backed by fresh in-memory stores
    pub fn in_memory(config: LedgerConfig) -> Self {
        Self::new(
            Arc::new(InMemoryBalanceStore::new()),
            Arc::new(InMemoryHistoryStore::new()),
            config,
        )
    }
}

impl<B: BalanceStore, H: HistoryStore> PointService<B, H> {
    /// Create a service over the given stores
    ///
    /// The lock registry is owned by the service. Every mutation of the stores
    /// must go through a single service (or its clones) for per-user
    /// serialization to hold.
    pub fn new(balances: Arc<B>, history: Arc<H>, config: LedgerConfig) -> Self {
        let locks = Arc::new(LockRegistry::with_eviction(config.lock_eviction));
        Self {
            balances,
            history,
            locks,
            config,
        }
    }

    /// Credit points to a user
    ///
    /// Unknown users start from a zero balance.
    ///
    /// # Errors
    ///
    /// * `PointError::InvalidAmount` - If `amount <= 0`
    /// * `PointError::BalanceLimitExceeded` - If the resulting balance would exceed `max_balance`
    /// * `PointError::Storage` - If a store fails; nothing is committed
    pub async fn charge(
        &self,
        user_id: UserId,
        amount: Points,
    ) -> Result<BalanceRecord, PointError> {
        self.mutate(user_id, amount, TransactionKind::Charge).await
    }

    /// Debit points from a user
    ///
    /// # Errors
    ///
    /// * `PointError::InvalidAmount` - If `amount <= 0`
    /// * `PointError::InsufficientBalance` - If the current balance is below `amount`
    /// * `PointError::Storage` - If a store fails; nothing is committed
    pub async fn use_points(
        &self,
        user_id: UserId,
        amount: Points,
    ) -> Result<BalanceRecord, PointError> {
        self.mutate(user_id, amount, TransactionKind::Use).await
    }

    /// Current balance of a user, zero for users never charged
    pub fn get_balance(&self, user_id: UserId) -> Result<BalanceRecord, PointError> {
        self.balances.read(user_id)
    }

    /// History of a user, oldest first, empty for users without entries
    pub fn get_history(&self, user_id: UserId) -> Result<Vec<HistoryEntry>, PointError> {
        self.history.list_by_user(user_id)
    }

    /// Lock registry used to serialize mutations
    pub fn lock_registry(&self) -> &LockRegistry {
        &self.locks
    }

    async fn mutate(
        &self,
        user_id: UserId,
        amount: Points,
        kind: TransactionKind,
    ) -> Result<BalanceRecord, PointError> {
        let _guard = self.locks.acquire(user_id).await;

        let current = self.balances.read(user_id)?;
        let new_balance = match self.apply(&current, amount, kind) {
            Ok(balance) => balance,
            Err(e) => {
                tracing::warn!(user_id, amount, %kind, error = %e, "point mutation rejected");
                return Err(e);
            }
        };

        let now = Utc::now();
        let record = self.balances.upsert(user_id, new_balance, now)?;

        if let Err(e) = self.history.append(user_id, amount, kind, now) {
            self.restore(&current);
            return Err(e);
        }

        tracing::info!(
            user_id,
            amount,
            %kind,
            balance = record.balance,
            "point mutation committed"
        );
        Ok(record)
    }

    /// Validate a mutation against the balance read under the lock
    fn apply(
        &self,
        current: &BalanceRecord,
        amount: Points,
        kind: TransactionKind,
    ) -> Result<Points, PointError> {
        if amount <= 0 {
            return Err(PointError::invalid_amount(amount));
        }

        match kind {
            TransactionKind::Charge => current
                .balance
                .checked_add(amount)
                .filter(|balance| *balance <= self.config.max_balance)
                .ok_or_else(|| {
                    PointError::balance_limit_exceeded(
                        current.user_id,
                        current.balance,
                        amount,
                        self.config.max_balance,
                    )
                }),
            TransactionKind::Use => {
                if current.balance < amount {
                    return Err(PointError::insufficient_balance(
                        current.user_id,
                        current.balance,
                        amount,
                    ));
                }
                Ok(current.balance - amount)
            }
        }
    }

    /// Undo a balance write whose history append failed
    ///
    /// A user with no stored record before the write is left with a stored
    /// zero record, which reads the same as an unknown user.
    fn restore(&self, previous: &BalanceRecord) {
        if let Err(e) = self
            .balances
            .upsert(previous.user_id, previous.balance, previous.updated_at)
        {
            tracing::error!(
                user_id = previous.user_id,
                balance = previous.balance,
                error = %e,
                "failed to restore balance after history append failure"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::LockEviction;
    use chrono::{DateTime, Utc};
    use rstest::rstest;
    use std::sync::atomic::{AtomicBool, Ordering};

    fn service() -> PointService {
        PointService::in_memory(LedgerConfig::default())
    }

    /// Balance store whose writes can be made to fail
    #[derive(Debug, Default)]
    struct FlakyBalanceStore {
        inner: InMemoryBalanceStore,
        fail_upsert: AtomicBool,
    }

    impl BalanceStore for FlakyBalanceStore {
        fn read(&self, user_id: UserId) -> Result<BalanceRecord, PointError> {
            self.inner.read(user_id)
        }

        fn upsert(
            &self,
            user_id: UserId,
            balance: Points,
            updated_at: DateTime<Utc>,
        ) -> Result<BalanceRecord, PointError> {
            if self.fail_upsert.load(Ordering::SeqCst) {
                return Err(PointError::storage("balance store unavailable"));
            }
            self.inner.upsert(user_id, balance, updated_at)
        }
    }

    /// History store whose appends can be made to fail
    #[derive(Debug, Default)]
    struct FlakyHistoryStore {
        inner: InMemoryHistoryStore,
        fail_append: AtomicBool,
    }

    impl HistoryStore for FlakyHistoryStore {
        fn append(
            &self,
            user_id: UserId,
            amount: Points,
            kind: TransactionKind,
            occurred_at: DateTime<Utc>,
        ) -> Result<HistoryEntry, PointError> {
            if self.fail_append.load(Ordering::SeqCst) {
                return Err(PointError::storage("history store unavailable"));
            }
            self.inner.append(user_id, amount, kind, occurred_at)
        }

        fn list_by_user(&self, user_id: UserId) -> Result<Vec<HistoryEntry>, PointError> {
            self.inner.list_by_user(user_id)
        }
    }

    fn flaky_service() -> (
        PointService<FlakyBalanceStore, FlakyHistoryStore>,
        Arc<FlakyBalanceStore>,
        Arc<FlakyHistoryStore>,
    ) {
        let balances = Arc::new(FlakyBalanceStore::default());
        let history = Arc::new(FlakyHistoryStore::default());
        let service = PointService::new(
            Arc::clone(&balances),
            Arc::clone(&history),
            LedgerConfig::default(),
        );
        (service, balances, history)
    }

    #[tokio::test]
    async fn test_charge_new_user() {
        let service = service();

        let record = service.charge(1, 100).await.unwrap();

        assert_eq!(record.user_id, 1);
        assert_eq!(record.balance, 100);

        let history = service.get_history(1).unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].kind, TransactionKind::Charge);
        assert_eq!(history[0].amount, 100);
        assert_eq!(history[0].occurred_at, record.updated_at);
    }

    #[tokio::test]
    async fn test_use_decreases_balance() {
        let service = service();
        service.charge(1, 1000).await.unwrap();

        let record = service.use_points(1, 400).await.unwrap();

        assert_eq!(record.balance, 600);
        let kinds: Vec<_> = service
            .get_history(1)
            .unwrap()
            .iter()
            .map(|entry| entry.kind)
            .collect();
        assert_eq!(kinds, vec![TransactionKind::Charge, TransactionKind::Use]);
    }

    #[tokio::test]
    async fn test_charge_scenario_then_rejected_use() {
        let service = service();

        assert_eq!(service.charge(1, 100).await.unwrap().balance, 100);
        assert_eq!(service.use_points(1, 30).await.unwrap().balance, 70);

        let err = service.use_points(1, 1000).await.unwrap_err();

        assert_eq!(err, PointError::insufficient_balance(1, 70, 1000));
        assert_eq!(service.get_balance(1).unwrap().balance, 70);
        let history = service.get_history(1).unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!((history[0].kind, history[0].amount), (TransactionKind::Charge, 100));
        assert_eq!((history[1].kind, history[1].amount), (TransactionKind::Use, 30));
    }

    #[rstest]
    #[case::zero(0)]
    #[case::negative(-1)]
    #[case::very_negative(i64::MIN)]
    #[tokio::test]
    async fn test_non_positive_amount_rejected(#[case] amount: Points) {
        let service = service();
        service.charge(1, 100).await.unwrap();

        let charge = service.charge(1, amount).await.unwrap_err();
        let used = service.use_points(1, amount).await.unwrap_err();

        assert_eq!(charge, PointError::invalid_amount(amount));
        assert_eq!(used, PointError::invalid_amount(amount));
        assert_eq!(service.get_balance(1).unwrap().balance, 100);
        assert_eq!(service.get_history(1).unwrap().len(), 1);
    }

    #[rstest]
    #[case::exactly_max(900, 100, Ok(1000))]
    #[case::one_over(900, 101, Err(()))]
    #[case::over_ceiling(900, 400, Err(()))]
    #[case::overflow(900, i64::MAX, Err(()))]
    #[tokio::test]
    async fn test_charge_balance_limit(
        #[case] initial: Points,
        #[case] amount: Points,
        #[case] expected: Result<Points, ()>,
    ) {
        let service = service();
        service.charge(1, initial).await.unwrap();

        let result = service.charge(1, amount).await;

        match expected {
            Ok(balance) => assert_eq!(result.unwrap().balance, balance),
            Err(()) => {
                assert_eq!(
                    result.unwrap_err(),
                    PointError::balance_limit_exceeded(1, initial, amount, 1000)
                );
                assert_eq!(service.get_balance(1).unwrap().balance, initial);
                assert_eq!(service.get_history(1).unwrap().len(), 1);
            }
        }
    }

    #[rstest]
    #[case::exact(100, 100, Some(0))]
    #[case::partial(100, 40, Some(60))]
    #[case::too_much(100, 400, None)]
    #[case::unknown_user(0, 1, None)]
    #[tokio::test]
    async fn test_use_balance_check(
        #[case] initial: Points,
        #[case] amount: Points,
        #[case] expected: Option<Points>,
    ) {
        let service = service();
        if initial > 0 {
            service.charge(1, initial).await.unwrap();
        }

        let result = service.use_points(1, amount).await;

        match expected {
            Some(balance) => assert_eq!(result.unwrap().balance, balance),
            None => {
                assert_eq!(
                    result.unwrap_err(),
                    PointError::insufficient_balance(1, initial, amount)
                );
                assert_eq!(service.get_balance(1).unwrap().balance, initial);
            }
        }
    }

    #[test]
    fn test_queries_for_unknown_user() {
        let service = service();

        let record = service.get_balance(404).unwrap();
        assert_eq!(record.user_id, 404);
        assert_eq!(record.balance, 0);
        assert!(service.get_history(404).unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_custom_max_balance() {
        let service = PointService::in_memory(LedgerConfig::default().with_max_balance(1500));

        service.charge(1, 500).await.unwrap();
        assert_eq!(service.charge(1, 600).await.unwrap().balance, 1100);
        assert!(matches!(
            service.charge(1, 600).await,
            Err(PointError::BalanceLimitExceeded { balance: 1100, .. })
        ));
    }

    #[tokio::test]
    async fn test_balance_write_failure_appends_no_history() {
        let (service, balances, _history) = flaky_service();
        service.charge(1, 100).await.unwrap();

        balances.fail_upsert.store(true, Ordering::SeqCst);
        let err = service.charge(1, 50).await.unwrap_err();

        assert!(matches!(err, PointError::Storage { .. }));
        assert_eq!(service.get_balance(1).unwrap().balance, 100);
        assert_eq!(service.get_history(1).unwrap().len(), 1);

        // The lock was released despite the failure
        balances.fail_upsert.store(false, Ordering::SeqCst);
        assert_eq!(service.charge(1, 50).await.unwrap().balance, 150);
    }

    #[tokio::test]
    async fn test_history_failure_restores_balance() {
        let (service, _balances, history) = flaky_service();
        let before = service.charge(1, 100).await.unwrap();

        history.fail_append.store(true, Ordering::SeqCst);
        let err = service.use_points(1, 30).await.unwrap_err();

        assert!(matches!(err, PointError::Storage { .. }));
        assert_eq!(service.get_balance(1).unwrap(), before);
        assert_eq!(service.get_history(1).unwrap().len(), 1);

        history.fail_append.store(false, Ordering::SeqCst);
        assert_eq!(service.use_points(1, 30).await.unwrap().balance, 70);
    }

    #[tokio::test]
    async fn test_history_failure_on_first_charge_reads_as_unknown_user() {
        let (service, balances, history) = flaky_service();

        history.fail_append.store(true, Ordering::SeqCst);
        let err = service.charge(7, 100).await.unwrap_err();

        assert!(matches!(err, PointError::Storage { .. }));
        let record = balances.read(7).unwrap();
        assert_eq!((record.user_id, record.balance), (7, 0));
        assert_eq!(service.get_balance(7).unwrap().balance, 0);
        assert!(service.get_history(7).unwrap().is_empty());

        history.fail_append.store(false, Ordering::SeqCst);
        assert_eq!(service.charge(7, 100).await.unwrap().balance, 100);
        assert_eq!(service.get_history(7).unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_evicting_service_leaves_no_locks_behind() {
        let service = PointService::in_memory(
            LedgerConfig::default().with_lock_eviction(LockEviction::EvictIdle),
        );

        service.charge(1, 10).await.unwrap();
        service.use_points(1, 100).await.unwrap_err();
        service.charge(2, 10).await.unwrap();

        assert!(service.lock_registry().is_empty());
        assert_eq!(service.get_balance(1).unwrap().balance, 10);
    }

    #[tokio::test]
    async fn test_clones_share_state() {
        let service = service();
        let clone = service.clone();

        clone.charge(3, 25).await.unwrap();

        assert_eq!(service.get_balance(3).unwrap().balance, 25);
        assert_eq!(service.lock_registry().len(), 1);
    }
}
