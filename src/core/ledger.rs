//! In-memory wallet and transfer storage
//!
//! This module provides the `PersistenceUnit` used by the orchestrator to stage
//! writes, and `InMemoryLedger`, the reference `Ledger` implementation.
//!
//! # Atomicity
//!
//! A unit is validated in full before anything is applied, and it is applied
//! under a single write lock. Readers take the read lock, so they observe either
//! none or all of a unit's writes. Dropping a unit without committing it is the
//! rollback.

use crate::core::traits::Ledger;
use crate::types::{Transfer, TransferError, TransferId, Wallet, WalletId};
use async_trait::async_trait;
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Writes staged for one atomic commit
///
/// Saving the same wallet twice keeps only the latest state.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct PersistenceUnit {
    wallets: Vec<Wallet>,
    transfers: Vec<Transfer>,
}

impl PersistenceUnit {
    /// Open an empty unit
    pub fn begin() -> Self {
        Self::default()
    }

    /// Stage a wallet save
    pub fn save_wallet(&mut self, wallet: Wallet) {
        match self.wallets.iter_mut().find(|w| w.id() == wallet.id()) {
            Some(staged) => *staged = wallet,
            None => self.wallets.push(wallet),
        }
    }

    /// Stage a transfer save
    pub fn save_transfer(&mut self, transfer: Transfer) {
        self.transfers.push(transfer);
    }

    pub fn wallets(&self) -> &[Wallet] {
        &self.wallets
    }

    pub fn transfers(&self) -> &[Transfer] {
        &self.transfers
    }

    pub fn is_empty(&self) -> bool {
        self.wallets.is_empty() && self.transfers.is_empty()
    }
}

#[derive(Debug, Default)]
struct LedgerState {
    wallets: HashMap<WalletId, Wallet>,
    transfers: HashMap<TransferId, Transfer>,
    /// Transfer ids in commit order
    history: Vec<TransferId>,
}

/// Reference `Ledger` backed by process memory
///
/// Wallets are seeded with `insert_wallet` (they are created outside the
/// transfer flow) and then only change through committed units.
#[derive(Debug, Default)]
pub struct InMemoryLedger {
    state: RwLock<LedgerState>,
}

impl InMemoryLedger {
    /// Create an empty ledger
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a ledger seeded with `wallets`
    pub fn from_wallets(wallets: impl IntoIterator<Item = Wallet>) -> Self {
        let ledger = Self::new();
        for wallet in wallets {
            ledger.insert_wallet(wallet);
        }
        ledger
    }

    /// Seed a wallet, returning the previous wallet with the same id
    pub fn insert_wallet(&self, wallet: Wallet) -> Option<Wallet> {
        self.write().wallets.insert(wallet.id(), wallet)
    }

    /// Whether a wallet with `id` exists
    pub fn contains_wallet(&self, id: WalletId) -> bool {
        self.read().wallets.contains_key(&id)
    }

    /// Snapshot of all wallets, sorted by id
    pub fn wallets(&self) -> Vec<Wallet> {
        let mut wallets: Vec<Wallet> = self.read().wallets.values().cloned().collect();
        wallets.sort_by_key(|wallet| wallet.id());
        wallets
    }

    /// Snapshot of all committed transfers, in commit order
    pub fn transfers(&self) -> Vec<Transfer> {
        let state = self.read();
        state
            .history
            .iter()
            .filter_map(|id| state.transfers.get(id).cloned())
            .collect()
    }

    /// Sum of every wallet balance
    pub fn total_balance(&self) -> Decimal {
        self.read().wallets.values().map(Wallet::balance).sum()
    }

    fn read(&self) -> RwLockReadGuard<'_, LedgerState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, LedgerState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Validate and apply a unit while holding the write lock
    fn apply(&self, unit: PersistenceUnit) -> Result<(), TransferError> {
        let mut state = self.write();

        for wallet in unit.wallets() {
            if !state.wallets.contains_key(&wallet.id()) {
                return Err(TransferError::persistence_failure(format!(
                    "wallet {} does not exist",
                    wallet.id()
                )));
            }
        }

        for transfer in unit.transfers() {
            if state.transfers.contains_key(&transfer.id()) {
                return Err(TransferError::persistence_failure(format!(
                    "transfer {} already exists",
                    transfer.id()
                )));
            }
        }

        // Nothing below can fail
        let PersistenceUnit { wallets, transfers } = unit;
        for wallet in wallets {
            state.wallets.insert(wallet.id(), wallet);
        }
        for transfer in transfers {
            state.history.push(transfer.id());
            state.transfers.insert(transfer.id(), transfer);
        }

        Ok(())
    }
}

#[async_trait]
impl Ledger for InMemoryLedger {
    async fn find_wallet(&self, id: WalletId) -> Result<Option<Wallet>, TransferError> {
        Ok(self.read().wallets.get(&id).cloned())
    }

    async fn find_transfer(&self, id: TransferId) -> Result<Option<Transfer>, TransferError> {
        Ok(self.read().transfers.get(&id).cloned())
    }

    async fn commit(&self, unit: PersistenceUnit) -> Result<(), TransferError> {
        self.apply(unit)
    }
}
