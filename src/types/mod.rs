//! Types module
//!
//! Contains core data structures used throughout the application.
//! This module organizes types into logical submodules:
//! - `wallet`: Wallet entity, wallet type and balance guards
//! - `transfer`: Transfer requests and committed transfer records
//! - `error`: Error types for the transfer engine and its collaborators

pub mod error;
pub mod transfer;
pub mod wallet;

pub use error::{AuthorizationError, NotificationError, TransferError};
pub use transfer::{Transfer, TransferId, TransferRequest};
pub use wallet::{Wallet, WalletId, WalletType};
