use crate::core::{LedgerConfig, LockEviction, MAX_BALANCE};
use crate::logging::LogFormat;
use crate::replay::ReplayConfig;
use crate::types::Points;
use clap::Parser;
use std::path::PathBuf;

/// Replay point charges and uses and print final balances
#[derive(Parser, Debug)]
#[command(name = "point-ledger")]
#[command(about = "Replay point charges and uses and print final balances", long_about = None)]
pub struct CliArgs {
    /// Input CSV file path containing operation records
    #[arg(value_name = "INPUT", help = "Path to the input CSV file (type,user,amount)")]
    pub input_file: PathBuf,

    /// Upper bound on any user's balance
    #[arg(
        long = "max-balance",
        value_name = "POINTS",
        default_value_t = MAX_BALANCE,
        allow_negative_numbers = true,
        help = "Inclusive upper bound on a user's balance"
    )]
    pub max_balance: Points,

    /// Drop per-user locks once idle
    #[arg(
        long = "evict-idle-locks",
        help = "Remove a user's lock once no request holds or awaits it"
    )]
    pub evict_idle_locks: bool,

    /// Number of operations per batch
    #[arg(
        long = "batch-size",
        value_name = "SIZE",
        help = "Number of operations per batch (default: 1000)"
    )]
    pub batch_size: Option<usize>,

    /// Number of worker threads
    #[arg(
        long = "workers",
        value_name = "COUNT",
        help = "Number of runtime worker threads (default: CPU cores)"
    )]
    pub workers: Option<usize>,

    /// Log output format
    #[arg(long = "log-format", value_name = "FORMAT", default_value = "pretty")]
    pub log_format: LogFormat,
}

impl CliArgs {
    /// Build the ledger configuration from CLI arguments
    pub fn to_ledger_config(&self) -> LedgerConfig {
        let eviction = if self.evict_idle_locks {
            LockEviction::EvictIdle
        } else {
            LockEviction::Retain
        };
        LedgerConfig::new(self.max_balance, eviction)
    }

    /// Build the replay configuration from CLI arguments
    ///
    /// Missing values take the defaults; invalid ones fall back with a warning.
    pub fn to_replay_config(&self) -> ReplayConfig {
        let default = ReplayConfig::default();
        ReplayConfig::new(
            self.batch_size.unwrap_or(default.batch_size),
            self.workers.unwrap_or(default.workers),
            self.to_ledger_config(),
        )
    }
}
