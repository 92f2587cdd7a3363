//! Per-wallet mutual exclusion for concurrent transfers
//!
//! This module provides `WalletLocks`, which serializes transfers that touch the
//! same wallet while letting transfers over disjoint wallet pairs run in
//! parallel.
//!
//! # Design
//!
//! Each wallet id maps to its own `tokio::sync::Mutex`, stored in a `DashMap` so
//! that looking up or creating a lock never blocks unrelated wallets. A transfer
//! acquires the locks of both of its wallets in ascending id order, which rules
//! out lock-order deadlocks between two transfers over the same pair in
//! opposite directions.
//!
//! The read-validate-write sequence of a transfer runs while the guards are
//! held, so two transfers from the same payer can never both observe the same
//! pre-debit balance.

use crate::types::WalletId;
use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// Registry of per-wallet async locks
#[derive(Debug, Default)]
pub struct WalletLocks {
    /// One lock per existing wallet that took part in a transfer
    locks: DashMap<WalletId, Arc<Mutex<()>>>,
}

/// Guards for every wallet of one transfer
///
/// The locks are released when this value is dropped.
#[derive(Debug)]
pub struct WalletGuards {
    wallets: Vec<WalletId>,
    _guards: Vec<OwnedMutexGuard<()>>,
}

impl WalletGuards {
    /// Wallet ids held by these guards, ascending
    pub fn wallets(&self) -> &[WalletId] {
        &self.wallets
    }
}

impl WalletLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Lock every wallet in `wallets`
    ///
    /// Duplicates are collapsed and locks are taken in ascending id order.
    /// Waits until every lock is held.
    pub async fn acquire(&self, wallets: &[WalletId]) -> WalletGuards {
        let mut ids = wallets.to_vec();
        ids.sort_unstable();
        ids.dedup();

        let mut guards = Vec::with_capacity(ids.len());
        for id in &ids {
            // The DashMap entry guard is released before awaiting
            let lock = self.lock_for(*id);
            guards.push(lock.lock_owned().await);
        }

        WalletGuards {
            wallets: ids,
            _guards: guards,
        }
    }

    /// Number of wallets with a lock entry
    pub fn len(&self) -> usize {
        self.locks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locks.is_empty()
    }

    fn lock_for(&self, id: WalletId) -> Arc<Mutex<()>> {
        Arc::clone(self.locks.entry(id).or_default().value())
    }
}
