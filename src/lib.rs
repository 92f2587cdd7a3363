//! Wallet Transfer Engine Library
//! # Overview
//!
//! This library executes peer-to-peer transfers between wallets. Each transfer
//! request is validated, checked against an external authorization gate,
//! applied to both wallets as one atomic unit and, once committed, announced
//! through a fire-and-forget notification.
//!
//! # Architecture
//!
//! The system is organized into several key components:
//!
//! - [`types`] - Core data types (Wallet, Transfer, TransferError, etc.)
//! - [`cli`] - CLI arguments parsing
//! - [`core`] - Business logic components:
//!   - [`core::orchestrator`] - Transfer orchestration
//!   - [`core::ledger`] - Persistence units and the in-memory ledger
//!   - [`core::wallet_locks`] - Per-wallet serialization of concurrent requests
//!   - [`core::authorization`] - Authorization gates
//!   - [`core::notification`] - Post-commit notification delivery
//! - [`io`] - CSV reading and writing
//! - [`strategy`] - Sync and async processing pipelines
//! - [`logging`] - Tracing subscriber setup
//!
//! # Transfer Rules
//!
//! A transfer of `value` from payer to payee commits only if:
//!
//! - both wallets exist and differ, and `value` is positive
//! - the payer is a **common** wallet (merchant wallets only receive)
//! - the payer balance covers `value`
//! - the authorization gate approves the request
//!
//! Otherwise the request is rejected with a [`TransferError`] and no wallet
//! changes. A committed transfer debits the payer and credits the payee by the
//! same amount, so the combined balance never changes.

// Module declarations
pub mod cli;
pub mod core;
pub mod io;
pub mod logging;
pub mod strategy;
pub mod types;

pub use core::{
    AuthorizationGate, InMemoryLedger, Ledger, NotificationDispatcher, PersistenceUnit,
    TransferOrchestrator,
};
pub use io::{write_transfers_csv, write_wallets_csv};
pub use types::{
    Transfer, TransferError, TransferId, TransferRequest, Wallet, WalletId, WalletType,
};
