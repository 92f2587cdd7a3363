//! Transfer-related types for the transfer engine
//!
//! This module defines the inbound transfer request and the immutable record
//! persisted for every committed transfer.

use super::error::TransferError;
use super::wallet::WalletId;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Transfer identifier, assigned when the record is built
pub type TransferId = Uuid;

/// Request to move `value` from `payer` to `payee`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransferRequest {
    /// Wallet to debit
    pub payer: WalletId,

    /// Wallet to credit
    pub payee: WalletId,

    /// Amount to move, must be strictly positive
    pub value: Decimal,
}

impl TransferRequest {
    pub fn new(payer: WalletId, payee: WalletId, value: Decimal) -> Self {
        TransferRequest {
            payer,
            payee,
            value,
        }
    }

    /// Check the request shape before any wallet is touched
    ///
    /// # Errors
    ///
    /// * `InvalidAmount` - value is zero or negative
    /// * `SameWallet` - payer and payee are the same wallet
    pub fn validate(&self) -> Result<(), TransferError> {
        if self.value <= Decimal::ZERO {
            return Err(TransferError::invalid_amount(self.value));
        }

        if self.payer == self.payee {
            return Err(TransferError::same_wallet(self.payer));
        }

        Ok(())
    }
}

/// Immutable record of a committed transfer
///
/// Holds the wallet ids only; wallets are owned by the ledger and outlive
/// any single transfer. There are no setters.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Transfer {
    id: TransferId,
    payer: WalletId,
    payee: WalletId,
    value: Decimal,
    created_at: DateTime<Utc>,
}

impl Transfer {
    /// Build a new record with a fresh id and the current timestamp
    pub fn new(payer: WalletId, payee: WalletId, value: Decimal) -> Self {
        Transfer {
            id: Uuid::new_v4(),
            payer,
            payee,
            value,
            created_at: Utc::now(),
        }
    }

    /// Rebuild a record that was already persisted
    pub fn from_parts(
        id: TransferId,
        payer: WalletId,
        payee: WalletId,
        value: Decimal,
        created_at: DateTime<Utc>,
    ) -> Self {
        Transfer {
            id,
            payer,
            payee,
            value,
            created_at,
        }
    }

    pub fn id(&self) -> TransferId {
        self.id
    }

    pub fn payer(&self) -> WalletId {
        self.payer
    }

    pub fn payee(&self) -> WalletId {
        self.payee
    }

    pub fn value(&self) -> Decimal {
        self.value
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}
