//! CSV format handling for operation records and balance output
//!
//! This module centralizes all CSV format concerns, providing:
//! - CsvRecord structure for deserialization
//! - Conversion from CSV records to domain types
//! - Balance output serialization
//!
//! All functions are pure (no I/O) for easy testing.

use crate::types::{BalanceRecord, OperationRecord, Points, TransactionKind, UserId};
use serde::Deserialize;
use std::io::Write;

/// CSV record structure for deserialization
///
/// Matches the input CSV format with columns: type, user, amount
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct CsvRecord {
    #[serde(rename = "type")]
    pub kind: String,
    pub user: UserId,
    pub amount: Option<String>,
}

/// Convert a CsvRecord to an OperationRecord
///
/// Parses the type column case-insensitively and requires an integer amount.
/// Non-positive amounts are passed through so the service can reject them.
pub fn convert_csv_record(csv_record: CsvRecord) -> Result<OperationRecord, String> {
    let kind = match csv_record.kind.to_lowercase().as_str() {
        "charge" => TransactionKind::Charge,
        "use" => TransactionKind::Use,
        _ => {
            return Err(format!(
                "Invalid operation type: '{}' for user {}",
                csv_record.kind, csv_record.user
            ))
        }
    };

    let amount = match csv_record.amount {
        Some(amount_str) if !amount_str.trim().is_empty() => {
            amount_str.trim().parse::<Points>().map_err(|_| {
                format!(
                    "Invalid amount '{}' for user {}",
                    amount_str, csv_record.user
                )
            })?
        }
        _ => {
            return Err(format!(
                "{} operation for user {} requires an amount",
                kind, csv_record.user
            ))
        }
    };

    Ok(OperationRecord {
        kind,
        user_id: csv_record.user,
        amount,
    })
}

/// Write balances to CSV format
///
/// Writes records with columns: user, balance
/// Records are sorted by user ID for deterministic output.
pub fn write_balances_csv(
    balances: &[BalanceRecord],
    output: &mut dyn Write,
) -> Result<(), String> {
    use csv::Writer;

    let mut writer = Writer::from_writer(output);

    writer
        .write_record(["user", "balance"])
        .map_err(|e| format!("Failed to write CSV header: {}", e))?;

    let mut sorted = balances.to_vec();
    sorted.sort_by_key(|record| record.user_id);

    for record in sorted {
        writer
            .write_record(&[record.user_id.to_string(), record.balance.to_string()])
            .map_err(|e| format!("Failed to write balance record: {}", e))?;
    }

    writer
        .flush()
        .map_err(|e| format!("Failed to flush output: {}", e))?;

    Ok(())
}
