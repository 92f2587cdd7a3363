//! Collaborator traits consumed by the transfer orchestrator
//!
//! This module defines the seams between the orchestrator and the systems it
//! depends on: wallet/transfer persistence, the external authorization decision,
//! and notification delivery. In-crate implementations live next door
//! (`ledger`, `authorization`, `notification`); other backends plug in here.

use crate::core::ledger::PersistenceUnit;
use crate::types::{
    AuthorizationError, NotificationError, Transfer, TransferError, TransferId, TransferRequest,
    Wallet, WalletId,
};
use async_trait::async_trait;

/// Wallet store and transfer store sharing one atomic write
///
/// Lookups may block on storage. `commit` applies every wallet save and
/// transfer save staged in a [`PersistenceUnit`] as a single all-or-nothing
/// unit: when it returns an error, none of the staged writes may be visible to
/// any reader.
#[async_trait]
pub trait Ledger: Send + Sync {
    /// Resolve a wallet by id
    async fn find_wallet(&self, id: WalletId) -> Result<Option<Wallet>, TransferError>;

    /// Resolve a committed transfer by id
    async fn find_transfer(&self, id: TransferId) -> Result<Option<Transfer>, TransferError>;

    /// Atomically persist every write staged in `unit`
    ///
    /// Implementations report failures as `TransferError::PersistenceFailure`.
    async fn commit(&self, unit: PersistenceUnit) -> Result<(), TransferError>;
}

/// External yes/no decision on whether a transfer may proceed
///
/// May be remote. The orchestrator bounds every call with a timeout and treats
/// `Ok(false)`, any error and a timeout alike.
#[async_trait]
pub trait AuthorizationGate: Send + Sync {
    async fn is_authorized(&self, request: &TransferRequest) -> Result<bool, AuthorizationError>;
}

/// Best-effort delivery of a post-transfer notification
///
/// Invoked from the notification worker, never from the request path.
#[async_trait]
pub trait NotificationDispatcher: Send + Sync {
    async fn send_notification(&self, transfer: &Transfer) -> Result<(), NotificationError>;
}
