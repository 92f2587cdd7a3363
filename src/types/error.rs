//! Error types for the transfer engine
//!
//! This module defines all error types that can occur while executing a transfer
//! and while driving transfers from files.
//!
//! # Error Categories
//!
//! - **Request Rejections**: Unknown wallets, forbidden payer type, insufficient
//!   balance, missing authorization, malformed requests
//! - **Persistence Errors**: The atomic write of wallets and transfer failed
//! - **Arithmetic Errors**: Overflow, underflow in balance calculations
//! - **File I/O and CSV Errors**: Raised by the command-line driver
//! - **Collaborator Errors**: Authorization gate and notification dispatcher failures

use super::wallet::{WalletId, WalletType};
use rust_decimal::Decimal;
use thiserror::Error;

/// Main error type for the transfer engine
///
/// Every variant except the file/CSV ones is a request-rejection outcome: the
/// transfer did not happen and no wallet balance was changed.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TransferError {
    /// Referenced wallet does not exist
    #[error("Wallet {wallet} not found")]
    WalletNotFound {
        /// The wallet id that could not be resolved
        wallet: WalletId,
    },

    /// Payer's wallet type may not send money
    #[error("Transfer not allowed for {wallet_type} wallet {wallet}")]
    TransferNotAllowedForWalletType {
        /// Payer wallet id
        wallet: WalletId,
        /// Payer wallet type
        wallet_type: WalletType,
    },

    /// Payer balance below the requested value
    #[error("Insufficient balance in wallet {wallet}: balance {balance}, requested {requested}")]
    InsufficientBalance {
        /// Payer wallet id
        wallet: WalletId,
        /// Balance observed during validation
        balance: Decimal,
        /// Requested transfer value
        requested: Decimal,
    },

    /// External authority declined, failed or timed out
    #[error("Transfer not authorized: {reason}")]
    TransferNotAuthorized {
        /// Why authorization was not granted
        reason: String,
    },

    /// The atomic write of wallets and transfer failed
    ///
    /// Nothing was applied. The whole request may be retried from scratch.
    #[error("Persistence failure: {message}")]
    PersistenceFailure {
        /// Description of the storage failure
        message: String,
    },

    /// Transfer value (or opening balance) is not acceptable
    #[error("Invalid amount {value}")]
    InvalidAmount {
        /// The rejected amount
        value: Decimal,
    },

    /// Payer and payee are the same wallet
    #[error("Payer and payee are the same wallet {wallet}")]
    SameWallet {
        /// The wallet used on both sides
        wallet: WalletId,
    },

    /// Arithmetic overflow would occur
    #[error("Arithmetic overflow in {operation} for wallet {wallet}")]
    ArithmeticOverflow {
        /// Operation that would overflow
        operation: String,
        /// Wallet id
        wallet: WalletId,
    },

    /// Arithmetic underflow would occur
    #[error("Arithmetic underflow in {operation} for wallet {wallet}")]
    ArithmeticUnderflow {
        /// Operation that would underflow
        operation: String,
        /// Wallet id
        wallet: WalletId,
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

    /// CSV parsing error occurred
    #[error("CSV parse error{}: {message}", line.map(|l| format!(" at line {}", l)).unwrap_or_default())]
    ParseError {
        /// Line number where the error occurred (if available)
        line: Option<u64>,
        /// Description of the parsing error
        message: String,
    },
}

impl From<std::io::Error> for TransferError {
    fn from(error: std::io::Error) -> Self {
        TransferError::IoError {
            message: error.to_string(),
        }
    }
}

impl From<csv::Error> for TransferError {
    fn from(error: csv::Error) -> Self {
        let line = error.position().map(|pos| pos.line());

        TransferError::ParseError {
            line,
            message: error.to_string(),
        }
    }
}

impl TransferError {
    /// Create a WalletNotFound error
    pub fn wallet_not_found(wallet: WalletId) -> Self {
        TransferError::WalletNotFound { wallet }
    }

    /// Create a TransferNotAllowedForWalletType error
    pub fn transfer_not_allowed(wallet: WalletId, wallet_type: WalletType) -> Self {
        TransferError::TransferNotAllowedForWalletType {
            wallet,
            wallet_type,
        }
    }

    /// Create an InsufficientBalance error
    pub fn insufficient_balance(wallet: WalletId, balance: Decimal, requested: Decimal) -> Self {
        TransferError::InsufficientBalance {
            wallet,
            balance,
            requested,
        }
    }

    /// Create a TransferNotAuthorized error
    pub fn not_authorized(reason: impl Into<String>) -> Self {
        TransferError::TransferNotAuthorized {
            reason: reason.into(),
        }
    }

    /// Create a PersistenceFailure error
    pub fn persistence_failure(message: impl Into<String>) -> Self {
        TransferError::PersistenceFailure {
            message: message.into(),
        }
    }

    /// Create an InvalidAmount error
    pub fn invalid_amount(value: Decimal) -> Self {
        TransferError::InvalidAmount { value }
    }

    /// Create a SameWallet error
    pub fn same_wallet(wallet: WalletId) -> Self {
        TransferError::SameWallet { wallet }
    }

    /// Create an ArithmeticOverflow error
    pub fn arithmetic_overflow(operation: &str, wallet: WalletId) -> Self {
        TransferError::ArithmeticOverflow {
            operation: operation.to_string(),
            wallet,
        }
    }

    /// Create an ArithmeticUnderflow error
    pub fn arithmetic_underflow(operation: &str, wallet: WalletId) -> Self {
        TransferError::ArithmeticUnderflow {
            operation: operation.to_string(),
            wallet,
        }
    }

    /// Whether the same request may succeed if submitted again unchanged
    ///
    /// Only persistence failures qualify: they leave no partial state behind.
    pub fn is_retryable(&self) -> bool {
        matches!(self, TransferError::PersistenceFailure { .. })
    }

    /// Short machine-readable name of the rejection, used as a log field
    pub fn kind(&self) -> &'static str {
        match self {
            TransferError::WalletNotFound { .. } => "wallet_not_found",
            TransferError::TransferNotAllowedForWalletType { .. } => {
                "transfer_not_allowed_for_wallet_type"
            }
            TransferError::InsufficientBalance { .. } => "insufficient_balance",
            TransferError::TransferNotAuthorized { .. } => "transfer_not_authorized",
            TransferError::PersistenceFailure { .. } => "persistence_failure",
            TransferError::InvalidAmount { .. } => "invalid_amount",
            TransferError::SameWallet { .. } => "same_wallet",
            TransferError::ArithmeticOverflow { .. } => "arithmetic_overflow",
            TransferError::ArithmeticUnderflow { .. } => "arithmetic_underflow",
            TransferError::FileNotFound { .. } => "file_not_found",
            TransferError::IoError { .. } => "io_error",
            TransferError::ParseError { .. } => "parse_error",
        }
    }
}

/// Failure reported by an authorization gate
///
/// The orchestrator folds every one of these into `TransferNotAuthorized`.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AuthorizationError {
    /// The authorization service could not be reached
    #[error("authorization service unavailable: {message}")]
    Unavailable {
        /// Transport-level description
        message: String,
    },

    /// The authorization service answered with something unexpected
    #[error("invalid authorization response: {message}")]
    InvalidResponse {
        /// Description of the malformed answer
        message: String,
    },
}

impl From<reqwest::Error> for AuthorizationError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_decode() {
            AuthorizationError::InvalidResponse {
                message: error.to_string(),
            }
        } else {
            AuthorizationError::Unavailable {
                message: error.to_string(),
            }
        }
    }
}

/// Failure reported by a notification dispatcher
///
/// These are logged by the notification worker and never reach the caller
/// of a transfer.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum NotificationError {
    /// The notification could not be delivered
    #[error("notification delivery failed: {message}")]
    Delivery {
        /// Transport-level description
        message: String,
    },

    /// The notification service refused the notification
    #[error("notification rejected with status {status}")]
    Rejected {
        /// HTTP status returned by the notification service
        status: u16,
    },

    /// The dispatcher did not finish within the delivery timeout
    #[error("notification delivery timed out after {millis}ms")]
    TimedOut { millis: u64 },
}

impl From<reqwest::Error> for NotificationError {
    fn from(error: reqwest::Error) -> Self {
        NotificationError::Delivery {
            message: error.to_string(),
        }
    }
}
