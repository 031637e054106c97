//! Error types for the point ledger
//!
//! This module defines all error types that can occur while charging, using,
//! or replaying point operations.
//!
//! # Error Categories
//!
//! - **Validation Errors**: Non-positive amounts, balance limit, insufficient balance
//! - **Storage Errors**: Failures reported by a balance or history store
//! - **Replay Errors**: File not found, malformed CSV input

use super::balance::{Points, UserId};
use thiserror::Error;

/// Main error type for the point ledger
///
/// Validation errors are terminal results for the single request that caused
/// them. They are detected before any store write, so a rejected request never
/// leaves a trace in the balance or history stores.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PointError {
    /// Charge or use amount is zero or negative
    #[error("Invalid amount {amount}: amount must be greater than zero")]
    InvalidAmount {
        /// The rejected amount
        amount: Points,
    },

    /// Charge would push the balance above the configured maximum
    #[error("Balance limit exceeded for user {user_id}: balance {balance} + charge {amount} > max {max_balance}")]
    BalanceLimitExceeded {
        /// User ID
        user_id: UserId,
        /// Balance read under the user's lock
        balance: Points,
        /// Requested charge amount
        amount: Points,
        /// Configured maximum balance
        max_balance: Points,
    },

    /// Use amount exceeds the current balance
    #[error("Insufficient balance for user {user_id}: balance {balance}, requested {requested}")]
    InsufficientBalance {
        /// User ID
        user_id: UserId,
        /// Balance read under the user's lock
        balance: Points,
        /// Requested use amount
        requested: Points,
    },

    /// A balance or history store failed
    ///
    /// Fatal to the single request. The lock is released and nothing after the
    /// failing write is applied.
    #[error("Storage error: {message}")]
    Storage {
        /// Description of the store failure
        message: String,
    },

    /// File not found at the specified path
    #[error("File not found: {path}")]
    FileNotFound {
        /// The path that was not found
        path: String,
    },

    /// I/O error occurred while reading or writing files
    #[error("I/O error: {message}")]
    IoError {
        /// Description of the I/O error
        message: String,
    },

    /// Malformed operation record in replay input
    ///
    /// The record is skipped and replay continues with the next one.
    #[error("CSV parse error{}: {message}", line.map(|l| format!(" at line {}", l)).unwrap_or_default())]
    ParseError {
        /// Line number where the error occurred (if available)
        line: Option<u64>,
        /// Description of the parsing error
        message: String,
    },
}

impl From<std::io::Error> for PointError {
    fn from(error: std::io::Error) -> Self {
        PointError::IoError {
            message: error.to_string(),
        }
    }
}

impl From<csv::Error> for PointError {
    fn from(error: csv::Error) -> Self {
        let line = error.position().map(|pos| pos.line());

        PointError::ParseError {
            line,
            message: error.to_string(),
        }
    }
}

// Helper functions for creating common errors

impl PointError {
    /// Create an InvalidAmount error
    pub fn invalid_amount(amount: Points) -> Self {
        PointError::InvalidAmount { amount }
    }

    /// Create a BalanceLimitExceeded error
    pub fn balance_limit_exceeded(
        user_id: UserId,
        balance: Points,
        amount: Points,
        max_balance: Points,
    ) -> Self {
        PointError::BalanceLimitExceeded {
            user_id,
            balance,
            amount,
            max_balance,
        }
    }

    /// Create an InsufficientBalance error
    pub fn insufficient_balance(user_id: UserId, balance: Points, requested: Points) -> Self {
        PointError::InsufficientBalance {
            user_id,
            balance,
            requested,
        }
    }

    /// Create a Storage error
    pub fn storage(message: impl Into<String>) -> Self {
        PointError::Storage {
            message: message.into(),
        }
    }

    /// Whether this error is a validation rejection rather than a failure
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            PointError::InvalidAmount { .. }
                | PointError::BalanceLimitExceeded { .. }
                | PointError::InsufficientBalance { .. }
        )
    }
}
