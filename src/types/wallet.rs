//! Wallet types for the transfer engine
//!
//! This module defines the Wallet entity and the guards that keep its balance
//! consistent while value moves in and out of it.

use super::error::TransferError;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Wallet identifier
pub type WalletId = u64;

/// Wallet classification
///
/// Only common wallets may send money. Merchant (shopkeeper) wallets can
/// only receive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WalletType {
    /// Regular user wallet, may act as payer or payee
    Common,

    /// Merchant wallet, may only act as payee
    #[serde(alias = "shopkeeper")]
    Merchant,
}

impl WalletType {
    /// Lowercase name used in CSV input and output
    pub fn as_str(&self) -> &'static str {
        match self {
            WalletType::Common => "common",
            WalletType::Merchant => "merchant",
        }
    }

    /// Whether wallets of this type may act as payer
    pub fn can_send(&self) -> bool {
        matches!(self, WalletType::Common)
    }
}

impl fmt::Display for WalletType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WalletType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "common" => Ok(WalletType::Common),
            "merchant" | "shopkeeper" => Ok(WalletType::Merchant),
            other => Err(format!("Invalid wallet type: '{}'", other)),
        }
    }
}

/// Stored balance account
///
/// Fields are private so the balance can only change through `debit` and
/// `credit`, both of which refuse to produce a negative balance.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Wallet {
    id: WalletId,
    balance: Decimal,
    wallet_type: WalletType,
}

impl Wallet {
    /// Create a wallet with an opening balance
    ///
    /// # Errors
    ///
    /// Returns `TransferError::InvalidAmount` if the opening balance is negative.
    pub fn new(
        id: WalletId,
        wallet_type: WalletType,
        balance: Decimal,
    ) -> Result<Self, TransferError> {
        if balance < Decimal::ZERO {
            return Err(TransferError::invalid_amount(balance));
        }

        Ok(Wallet {
            id,
            balance,
            wallet_type,
        })
    }

    pub fn id(&self) -> WalletId {
        self.id
    }

    pub fn balance(&self) -> Decimal {
        self.balance
    }

    pub fn wallet_type(&self) -> WalletType {
        self.wallet_type
    }

    /// Remove `amount` from the balance
    ///
    /// Callers are expected to check `is_balance_equal_or_greater_than` first.
    /// If they don't, the debit is refused with `ArithmeticUnderflow` and the
    /// balance is left untouched.
    ///
    /// # Errors
    ///
    /// * `InvalidAmount` - `amount` is zero or negative
    /// * `ArithmeticUnderflow` - `amount` exceeds the current balance
    pub fn debit(&mut self, amount: Decimal) -> Result<(), TransferError> {
        ensure_positive(amount)?;

        if !self.is_balance_equal_or_greater_than(amount) {
            return Err(TransferError::arithmetic_underflow("debit", self.id));
        }

        self.balance = self
            .balance
            .checked_sub(amount)
            .ok_or_else(|| TransferError::arithmetic_underflow("debit", self.id))?;

        Ok(())
    }

    /// Add `amount` to the balance
    ///
    /// # Errors
    ///
    /// * `InvalidAmount` - `amount` is zero or negative
    /// * `ArithmeticOverflow` - the new balance is not representable
    pub fn credit(&mut self, amount: Decimal) -> Result<(), TransferError> {
        ensure_positive(amount)?;

        self.balance = self
            .balance
            .checked_add(amount)
            .ok_or_else(|| TransferError::arithmetic_overflow("credit", self.id))?;

        Ok(())
    }

    /// True iff this wallet's type may act as a payer
    pub fn is_transfer_allowed_for_wallet_type(&self) -> bool {
        self.wallet_type.can_send()
    }

    /// True iff the balance covers `amount`
    pub fn is_balance_equal_or_greater_than(&self, amount: Decimal) -> bool {
        self.balance >= amount
    }
}

fn ensure_positive(amount: Decimal) -> Result<(), TransferError> {
    if amount > Decimal::ZERO {
        Ok(())
    } else {
        Err(TransferError::invalid_amount(amount))
    }
}
