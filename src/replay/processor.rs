//! Batch replay with user-based partitioning
//!
//! This module provides the `ReplayProcessor` struct, which replays batches of
//! operation records through a `PointService`.
//!
//! # Design
//!
//! A batch is partitioned by user. Each user's operations run sequentially in
//! file order on one task, and different users run on concurrent tasks. The
//! service's per-user lock would serialize the operations anyway; partitioning
//! additionally pins the order to the input order instead of task arrival
//! order.

use std::collections::HashMap;

use crate::core::{BalanceStore, HistoryStore, PointService};
use crate::types::{BalanceRecord, OperationRecord, PointError, TransactionKind, UserId};

/// Result of replaying a single operation
#[derive(Debug, Clone)]
pub struct ReplayResult {
    /// The operation that was replayed
    pub record: OperationRecord,

    /// Updated balance, or why the operation was rejected
    pub result: Result<BalanceRecord, PointError>,
}

/// Outcome counts of a replay
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ReplayStats {
    /// Operations replayed, whatever their outcome
    pub replayed: usize,

    /// Operations refused by validation
    pub rejected: usize,

    /// Operations aborted by a store failure
    pub failed: usize,
}

impl ReplayStats {
    /// Count one result, logging every operation that did not commit
    pub fn record(&mut self, outcome: &ReplayResult) {
        self.replayed += 1;

        match &outcome.result {
            Ok(_) => {}
            Err(e) if e.is_rejection() => {
                self.rejected += 1;
                tracing::warn!(
                    user_id = outcome.record.user_id,
                    kind = %outcome.record.kind,
                    amount = outcome.record.amount,
                    error = %e,
                    "operation skipped"
                );
            }
            Err(e) => {
                self.failed += 1;
                tracing::error!(
                    user_id = outcome.record.user_id,
                    kind = %outcome.record.kind,
                    amount = outcome.record.amount,
                    error = %e,
                    "operation failed"
                );
            }
        }
    }
}

/// Batch replayer with user-based partitioning
#[derive(Debug)]
pub struct ReplayProcessor<B, H> {
    service: PointService<B, H>,
}

impl<B, H> Clone for ReplayProcessor<B, H> {
    fn clone(&self) -> Self {
        Self {
            service: self.service.clone(),
        }
    }
}

impl<B, H> ReplayProcessor<B, H>
where
    B: BalanceStore + 'static,
    H: HistoryStore + 'static,
{
    /// Create a new ReplayProcessor over a service
    pub fn new(service: PointService<B, H>) -> Self {
        Self { service }
    }

    /// Split a batch into per-user sub-batches, keeping each user's order
    pub fn partition_by_user(
        &self,
        batch: Vec<OperationRecord>,
    ) -> HashMap<UserId, Vec<OperationRecord>> {
        let mut user_batches: HashMap<UserId, Vec<OperationRecord>> = HashMap::new();

        for record in batch {
            user_batches.entry(record.user_id).or_default().push(record);
        }

        user_batches
    }

    /// Replay one user's operations in order
    ///
    /// Rejections are captured in the results and do not stop the remaining
    /// operations.
    pub async fn process_user_operations(
        &self,
        operations: Vec<OperationRecord>,
    ) -> Vec<ReplayResult> {
        let mut results = Vec::with_capacity(operations.len());

        for record in operations {
            let result = match record.kind {
                TransactionKind::Charge => self.service.charge(record.user_id, record.amount).await,
                TransactionKind::Use => {
                    self.service
                        .use_points(record.user_id, record.amount)
                        .await
                }
            };
            results.push(ReplayResult { record, result });
        }

        results
    }

    /// Replay a batch, one task per user
    ///
    /// Results are grouped by user; within a user they follow input order.
    pub async fn process_batch(&self, batch: Vec<OperationRecord>) -> Vec<ReplayResult> {
        let user_batches = self.partition_by_user(batch);

        let mut tasks = Vec::with_capacity(user_batches.len());
        for (_user_id, operations) in user_batches {
            let processor = self.clone();
            tasks.push(tokio::spawn(async move {
                processor.process_user_operations(operations).await
            }));
        }

        let mut results = Vec::new();
        for task in tasks {
            match task.await {
                Ok(user_results) => results.extend(user_results),
                Err(e) => tracing::error!(error = %e, "replay task panicked"),
            }
        }

        results
    }
}
