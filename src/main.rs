//! Point Ledger CLI
//!
//! Replays point charges and uses from a CSV file and prints final balances.
//!
//! # Usage
//!
//! ```bash
//! cargo run -- operations.csv > balances.csv
//! cargo run -- --max-balance 1500 operations.csv > balances.csv
//! cargo run -- --evict-idle-locks --workers 8 --log-format json operations.csv
//! ```
//!
//! Input columns are `type,user,amount` with type `charge` or `use`. Output is
//! `user,balance` for every user in the input, sorted by user. Logs go to
//! stderr; set `RUST_LOG` to adjust verbosity.
//!
//! # Exit Codes
//!
//! - 0: Success
//! - 1: Error (missing arguments, file not found, file not readable, etc.)

use point_ledger::{cli, logging, replay};
use std::process;

fn main() {
    let args = cli::parse_args();
    logging::init_logging("info", args.log_format);

    let config = args.to_replay_config();

    let mut output = std::io::stdout();
    if let Err(e) = replay::run(&args.input_file, &mut output, &config) {
        tracing::error!(error = %e, "replay failed");
        process::exit(1);
    }
}
