//! Core business logic module
//!
//! This module contains the transfer processing components:
//! - `traits` - Collaborator seams (ledger, authorization gate, notification dispatcher)
//! - `ledger` - Persistence unit and in-memory ledger
//! - `wallet_locks` - Per-wallet mutual exclusion
//! - `authorization` - Authorization gate implementations
//! - `notification` - Notification queue, worker and dispatchers
//! - `orchestrator` - Transfer orchestration

pub mod authorization;
pub mod ledger;
pub mod notification;
pub mod orchestrator;
pub mod traits;
pub mod wallet_locks;

pub use authorization::{HttpAuthorizationGate, StaticAuthorizationGate};
pub use ledger::{InMemoryLedger, PersistenceUnit};
pub use notification::{
    HttpNotificationDispatcher, LogNotificationDispatcher, NotificationQueue, NotificationStats,
    NotificationWorker,
};
pub use orchestrator::{OrchestratorConfig, TransferOrchestrator, TransferStage};
pub use traits::{AuthorizationGate, Ledger, NotificationDispatcher};
pub use wallet_locks::WalletLocks;
