//! Processing strategy module for transfer batches
//!
//! This module defines the Strategy pattern for complete processing pipelines:
//! seeding the ledger from a wallet file, executing every request of a transfer
//! file through the orchestrator, and writing the final wallet states. This
//! allows different execution models (one request at a time, or one task per
//! request) to be selected at runtime.

use crate::cli::StrategyType;
use crate::core::authorization::StaticAuthorizationGate;
use crate::core::notification::{
    LogNotificationDispatcher, DEFAULT_DELIVERY_TIMEOUT, DEFAULT_QUEUE_CAPACITY,
};
use crate::core::{
    AuthorizationGate, InMemoryLedger, NotificationDispatcher, NotificationStats,
    OrchestratorConfig,
};
use crate::io::sync_reader::SyncReader;
use crate::types::{Transfer, Wallet};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

pub mod r#async;
pub mod sync;

pub use self::r#async::{AsyncProcessingStrategy, BatchConfig};
pub use sync::SyncProcessingStrategy;

/// Files consumed by a processing run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessingInput {
    /// Wallet seed file (id, type, balance)
    pub wallets: PathBuf,
    /// Transfer request file (payer, payee, value)
    pub transfers: PathBuf,
}

impl ProcessingInput {
    pub fn new(wallets: impl Into<PathBuf>, transfers: impl Into<PathBuf>) -> Self {
        Self {
            wallets: wallets.into(),
            transfers: transfers.into(),
        }
    }
}

/// Outcome of a processing run
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessingReport {
    /// Final wallet states, sorted by id
    pub wallets: Vec<Wallet>,
    /// Committed transfers, in commit order
    pub transfers: Vec<Transfer>,
    /// Requests the orchestrator rejected
    pub rejected: usize,
    /// Rows that could not be parsed into requests
    pub skipped: usize,
    /// Notification delivery counts
    pub notifications: NotificationStats,
}

/// External collaborators and settings shared by every strategy
#[derive(Clone)]
pub struct Collaborators {
    pub authorization: Arc<dyn AuthorizationGate>,
    pub dispatcher: Arc<dyn NotificationDispatcher>,
    pub orchestrator: OrchestratorConfig,
    pub notification_capacity: usize,
    /// Bound on one notification delivery
    pub notification_timeout: Duration,
}

impl Default for Collaborators {
    fn default() -> Self {
        Self {
            authorization: Arc::new(StaticAuthorizationGate::allow_all()),
            dispatcher: Arc::new(LogNotificationDispatcher),
            orchestrator: OrchestratorConfig::default(),
            notification_capacity: DEFAULT_QUEUE_CAPACITY,
            notification_timeout: DEFAULT_DELIVERY_TIMEOUT,
        }
    }
}

/// Processing strategy trait for complete transfer pipelines
pub trait ProcessingStrategy: Send + Sync {
    /// Execute the transfer file against the wallet file
    ///
    /// Writes the final wallet states to `output` as CSV and returns the
    /// run report.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - An input file cannot be opened
    /// - The async runtime cannot be created
    /// - Output cannot be written
    ///
    /// Rejected transfers and unparsable rows are logged and counted; they do
    /// not stop the run.
    fn process(
        &self,
        input: &ProcessingInput,
        output: &mut dyn Write,
    ) -> Result<ProcessingReport, String>;
}

/// Create a processing strategy based on the specified strategy type
///
/// `config` only applies to the async strategy.
pub fn create_strategy(
    strategy_type: StrategyType,
    config: Option<BatchConfig>,
    collaborators: Collaborators,
) -> Box<dyn ProcessingStrategy> {
    match strategy_type {
        StrategyType::Sync => Box::new(SyncProcessingStrategy::new(collaborators)),
        StrategyType::Async => {
            let config = config.unwrap_or_default();
            Box::new(AsyncProcessingStrategy::new(config, collaborators))
        }
    }
}

/// Seed an in-memory ledger from a wallet file
///
/// Invalid rows and duplicate ids are logged and skipped; the first
/// occurrence of an id wins.
pub(crate) fn load_ledger(path: &Path) -> Result<InMemoryLedger, String> {
    let ledger = InMemoryLedger::new();

    for result in SyncReader::<Wallet>::new(path)? {
        match result {
            Ok(wallet) if ledger.contains_wallet(wallet.id()) => {
                warn!(wallet = wallet.id(), "Duplicate wallet id, row skipped");
            }
            Ok(wallet) => {
                ledger.insert_wallet(wallet);
            }
            Err(e) => warn!(error = %e, "Invalid wallet row skipped"),
        }
    }

    Ok(ledger)
}

/// Write the final wallets and assemble the report
pub(crate) fn finish(
    ledger: &InMemoryLedger,
    rejected: usize,
    skipped: usize,
    notifications: NotificationStats,
    output: &mut dyn Write,
) -> Result<ProcessingReport, String> {
    let wallets = ledger.wallets();
    crate::io::write_wallets_csv(&wallets, output)?;

    let report = ProcessingReport {
        wallets,
        transfers: ledger.transfers(),
        rejected,
        skipped,
        notifications,
    };

    info!(
        committed = report.transfers.len(),
        rejected = report.rejected,
        skipped = report.skipped,
        notifications_dispatched = report.notifications.dispatched,
        notifications_failed = report.notifications.failed,
        "Processing finished"
    );

    Ok(report)
}
