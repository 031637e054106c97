//! Replay driver
//!
//! Reads an operations CSV, replays it through a `PointService` on a
//! multi-threaded tokio runtime, and writes the final balance of every user
//! that appears in the input.
//!
//! # Architecture
//!
//! ```text
//! replay::run
//!     ├── ReplayConfig (batch_size, workers, ledger)
//!     ├── OperationReader (streaming CSV reading)
//!     └── ReplayProcessor (user partitioning + tasks)
//!         └── PointService (per-user locks + stores)
//! ```
//!
//! Batches are replayed one after another, so a user's operations keep file
//! order even when they span batches. Rejected operations and malformed rows
//! are logged and skipped. Store failures are logged at error level and
//! counted apart from rejections.

use std::collections::BTreeSet;
use std::io::Write;
use std::path::Path;

use crate::core::{LedgerConfig, PointService};
use crate::io::{write_balances_csv, OperationReader};
use crate::types::{OperationRecord, PointError, UserId};

pub mod processor;

pub use processor::{ReplayProcessor, ReplayResult, ReplayStats};

/// Default number of operations read per batch
pub const DEFAULT_BATCH_SIZE: usize = 1000;

/// Configuration for a replay run
#[derive(Clone, Debug)]
pub struct ReplayConfig {
    /// Number of operations per batch
    pub batch_size: usize,
    /// Number of tokio worker threads
    pub workers: usize,
    /// Ledger settings for the replayed service
    pub ledger: LedgerConfig,
}

impl Default for ReplayConfig {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            workers: num_cpus::get(),
            ledger: LedgerConfig::default(),
        }
    }
}

impl ReplayConfig {
    /// Create a ReplayConfig with custom values
    ///
    /// Zero sizes fall back to the defaults with a warning.
    pub fn new(batch_size: usize, workers: usize, ledger: LedgerConfig) -> Self {
        let default = Self::default();

        let batch_size = if batch_size == 0 {
            tracing::warn!(
                batch_size,
                default = default.batch_size,
                "invalid batch_size, using default"
            );
            default.batch_size
        } else {
            batch_size
        };

        let workers = if workers == 0 {
            tracing::warn!(
                workers,
                default = default.workers,
                "invalid workers, using default"
            );
            default.workers
        } else {
            workers
        };

        Self {
            batch_size,
            workers,
            ledger,
        }
    }
}

/// Replay an operations file and write final balances to `output`
///
/// # Errors
///
/// Returns an error only for fatal conditions: missing or unreadable input,
/// runtime construction failure, or failure to write the output. Individual
/// operation rejections and store failures are logged and skipped.
pub fn run(
    input_path: &Path,
    output: &mut dyn Write,
    config: &ReplayConfig,
) -> Result<(), PointError> {
    let mut reader = OperationReader::open(input_path)?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(config.workers)
        .build()?;

    let service = PointService::in_memory(config.ledger.clone());
    let processor = ReplayProcessor::new(service.clone());
    let mut users: BTreeSet<UserId> = BTreeSet::new();
    let mut stats = ReplayStats::default();

    runtime.block_on(async {
        loop {
            let batch = read_batch(&mut reader, config.batch_size);
            if batch.is_empty() {
                break;
            }
            users.extend(batch.iter().map(|record| record.user_id));

            for outcome in processor.process_batch(batch).await {
                stats.record(&outcome);
            }
        }
    });

    tracing::info!(
        replayed = stats.replayed,
        rejected = stats.rejected,
        failed = stats.failed,
        users = users.len(),
        "replay finished"
    );

    let balances = users
        .iter()
        .map(|user_id| service.get_balance(*user_id))
        .collect::<Result<Vec<_>, _>>()?;

    write_balances_csv(&balances, output).map_err(|message| PointError::IoError { message })
}

/// Read up to `batch_size` valid records, logging malformed rows
fn read_batch<I>(reader: &mut I, batch_size: usize) -> Vec<OperationRecord>
where
    I: Iterator<Item = Result<OperationRecord, PointError>>,
{
    let mut batch = Vec::with_capacity(batch_size);

    while batch.len() < batch_size {
        match reader.next() {
            Some(Ok(record)) => batch.push(record),
            Some(Err(e)) => tracing::warn!(error = %e, "malformed row skipped"),
            None => break,
        }
    }

    batch
}
