//! Transfer orchestration
//!
//! This module provides the `TransferOrchestrator`, which executes one transfer
//! request end to end by coordinating the ledger, the authorization gate, the
//! per-wallet locks and the notification queue.
//!
//! # Flow
//!
//! ```text
//! request ─▶ shape check ─▶ lock payer+payee ─▶ resolve wallets
//!         ─▶ wallet type ─▶ balance ─▶ authorization (timeout-bounded)
//!         ─▶ debit/credit in a PersistenceUnit ─▶ ledger.commit
//!         ─▶ unlock ─▶ enqueue notification ─▶ Transfer
//! ```
//!
//! Every rejection happens before the first mutation, so nothing has to be
//! undone. A failed commit applies nothing. Notification is only enqueued
//! after a successful commit and its outcome never reaches the caller.

use crate::core::ledger::PersistenceUnit;
use crate::core::notification::NotificationQueue;
use crate::core::traits::{AuthorizationGate, Ledger};
use crate::core::wallet_locks::WalletLocks;
use crate::types::{Transfer, TransferError, TransferRequest, Wallet, WalletId};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Default bound on one authorization call
pub const DEFAULT_AUTHORIZATION_TIMEOUT: Duration = Duration::from_secs(3);

/// Stages a transfer request moves through, used as a log field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferStage {
    Pending,
    Validating,
    Mutating,
    Persisting,
    Committed,
    NotificationDispatched,
    NotificationFailed,
}

impl fmt::Display for TransferStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TransferStage::Pending => "pending",
            TransferStage::Validating => "validating",
            TransferStage::Mutating => "mutating",
            TransferStage::Persisting => "persisting",
            TransferStage::Committed => "committed",
            TransferStage::NotificationDispatched => "notification_dispatched",
            TransferStage::NotificationFailed => "notification_failed",
        };
        f.write_str(name)
    }
}

/// Orchestrator settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrchestratorConfig {
    /// Upper bound on one authorization call; expiry counts as a decline
    pub authorization_timeout: Duration,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            authorization_timeout: DEFAULT_AUTHORIZATION_TIMEOUT,
        }
    }
}

impl OrchestratorConfig {
    /// Create a config, replacing a zero timeout with the default
    pub fn new(authorization_timeout: Duration) -> Self {
        let default = Self::default();

        let authorization_timeout = if authorization_timeout.is_zero() {
            warn!(
                default_ms = default.authorization_timeout.as_millis() as u64,
                "Invalid authorization timeout (0), using default"
            );
            default.authorization_timeout
        } else {
            authorization_timeout
        };

        Self {
            authorization_timeout,
        }
    }
}

/// Executes transfer requests
///
/// Safe to share across tasks behind an `Arc`; each `execute` call is one
/// independent unit of work.
pub struct TransferOrchestrator {
    ledger: Arc<dyn Ledger>,
    authorization: Arc<dyn AuthorizationGate>,
    notifications: NotificationQueue,
    locks: WalletLocks,
    config: OrchestratorConfig,
}

impl TransferOrchestrator {
    pub fn new(
        ledger: Arc<dyn Ledger>,
        authorization: Arc<dyn AuthorizationGate>,
        notifications: NotificationQueue,
        config: OrchestratorConfig,
    ) -> Self {
        Self {
            ledger,
            authorization,
            notifications,
            locks: WalletLocks::new(),
            config,
        }
    }

    pub fn config(&self) -> &OrchestratorConfig {
        &self.config
    }

    /// Execute one transfer request
    ///
    /// Returns the persisted transfer. The notification for it has been
    /// enqueued but not necessarily delivered.
    ///
    /// # Errors
    ///
    /// * `InvalidAmount` / `SameWallet` - malformed request
    /// * `WalletNotFound` - payer or payee does not exist (payer checked first)
    /// * `TransferNotAllowedForWalletType` - payer may not send
    /// * `InsufficientBalance` - payer balance below the value
    /// * `TransferNotAuthorized` - gate declined, failed or timed out
    /// * `PersistenceFailure` - the atomic commit failed; nothing was applied
    pub async fn execute(&self, request: TransferRequest) -> Result<Transfer, TransferError> {
        debug!(
            payer = request.payer,
            payee = request.payee,
            value = %request.value,
            stage = %TransferStage::Pending,
            "Transfer requested"
        );

        let result = self.execute_locked(&request).await;

        match result {
            Ok(transfer) => {
                info!(
                    transfer_id = %transfer.id(),
                    payer = transfer.payer(),
                    payee = transfer.payee(),
                    value = %transfer.value(),
                    stage = %TransferStage::Committed,
                    "Transfer committed"
                );

                if !self.notifications.enqueue(transfer.clone()) {
                    debug!(
                        transfer_id = %transfer.id(),
                        stage = %TransferStage::NotificationFailed,
                        "Notification not enqueued"
                    );
                }

                Ok(transfer)
            }
            Err(e) => {
                warn!(
                    payer = request.payer,
                    payee = request.payee,
                    value = %request.value,
                    kind = e.kind(),
                    error = %e,
                    "Transfer rejected"
                );
                Err(e)
            }
        }
    }

    /// Everything up to and including the commit, under the wallet locks
    async fn execute_locked(&self, request: &TransferRequest) -> Result<Transfer, TransferError> {
        request.validate()?;

        // Unknown ids never get a lock entry; wallets are re-read under the locks
        self.find_wallet(request.payer).await?;
        self.find_wallet(request.payee).await?;

        let _guards = self.locks.acquire(&[request.payer, request.payee]).await;

        let mut payer = self.find_wallet(request.payer).await?;
        let mut payee = self.find_wallet(request.payee).await?;

        debug!(payer = payer.id(), stage = %TransferStage::Validating, "Validating transfer");
        self.validate_transfer(request, &payer).await?;

        debug!(payer = payer.id(), stage = %TransferStage::Mutating, "Moving funds");
        let mut unit = PersistenceUnit::begin();
        payer.debit(request.value)?;
        payee.credit(request.value)?;

        let transfer = Transfer::new(payer.id(), payee.id(), request.value);
        unit.save_wallet(payer);
        unit.save_wallet(payee);
        unit.save_transfer(transfer.clone());

        debug!(transfer_id = %transfer.id(), stage = %TransferStage::Persisting, "Committing transfer");
        self.ledger.commit(unit).await.map_err(as_persistence_failure)?;

        Ok(transfer)
    }

    async fn find_wallet(&self, id: WalletId) -> Result<Wallet, TransferError> {
        self.ledger
            .find_wallet(id)
            .await?
            .ok_or_else(|| TransferError::wallet_not_found(id))
    }

    /// Validation chain: wallet type, then balance, then the external gate
    async fn validate_transfer(
        &self,
        request: &TransferRequest,
        payer: &Wallet,
    ) -> Result<(), TransferError> {
        if !payer.is_transfer_allowed_for_wallet_type() {
            return Err(TransferError::transfer_not_allowed(
                payer.id(),
                payer.wallet_type(),
            ));
        }

        if !payer.is_balance_equal_or_greater_than(request.value) {
            return Err(TransferError::insufficient_balance(
                payer.id(),
                payer.balance(),
                request.value,
            ));
        }

        self.authorize(request).await
    }

    async fn authorize(&self, request: &TransferRequest) -> Result<(), TransferError> {
        let timeout = self.config.authorization_timeout;

        match tokio::time::timeout(timeout, self.authorization.is_authorized(request)).await {
            Ok(Ok(true)) => Ok(()),
            Ok(Ok(false)) => Err(TransferError::not_authorized(
                "declined by authorization gate",
            )),
            Ok(Err(e)) => Err(TransferError::not_authorized(e.to_string())),
            Err(_) => Err(TransferError::not_authorized(format!(
                "authorization timed out after {}ms",
                timeout.as_millis()
            ))),
        }
    }
}

fn as_persistence_failure(error: TransferError) -> TransferError {
    match error {
        TransferError::PersistenceFailure { .. } => error,
        other => TransferError::persistence_failure(other.to_string()),
    }
}
