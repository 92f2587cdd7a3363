//! Concurrent processing strategy
//!
//! This module provides a multi-threaded implementation of the
//! ProcessingStrategy trait. Every transfer request runs as its own tokio task;
//! the number of requests in flight is bounded by `max_in_flight`, and finished
//! tasks are reaped as new ones are spawned.
//!
//! # Architecture
//!
//! ```text
//! AsyncProcessingStrategy
//!     ├── BatchConfig (batch_size, max_in_flight)
//!     ├── AsyncReader (batched CSV reading)
//!     ├── JoinSet (bounds in-flight requests)
//!     ├── TransferOrchestrator (shared via Arc, one task per request)
//!     │   ├── InMemoryLedger (atomic commits)
//!     │   └── WalletLocks (per-wallet serialization)
//!     └── NotificationWorker (drains post-commit notifications)
//! ```
//!
//! # Ordering
//!
//! Requests that share a wallet are serialized by the wallet locks but not in
//! file order. Results are only order independent when every payer can cover
//! all of its transfers; use the sync strategy when file order matters.

use crate::core::{NotificationWorker, TransferOrchestrator};
use crate::io::async_reader::AsyncReader;
use crate::strategy::{
    finish, load_ledger, Collaborators, ProcessingInput, ProcessingReport, ProcessingStrategy,
};
use std::io::Write;
use std::sync::Arc;
use tokio::task::{JoinError, JoinSet};
use tracing::{error, warn};

/// Configuration for concurrent processing
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BatchConfig {
    /// Number of requests read from the file at a time
    pub batch_size: usize,
    /// Maximum number of requests executing concurrently
    pub max_in_flight: usize,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            batch_size: 1000,
            max_in_flight: num_cpus::get() * 4,
        }
    }
}

impl BatchConfig {
    /// Create a new BatchConfig, replacing zero values with defaults
    pub fn new(batch_size: usize, max_in_flight: usize) -> Self {
        let default = Self::default();

        let batch_size = if batch_size == 0 {
            warn!(
                default = default.batch_size,
                "Invalid batch_size (0), using default"
            );
            default.batch_size
        } else {
            batch_size
        };

        let max_in_flight = if max_in_flight == 0 {
            warn!(
                default = default.max_in_flight,
                "Invalid max_in_flight (0), using default"
            );
            default.max_in_flight
        } else {
            max_in_flight
        };

        Self {
            batch_size,
            max_in_flight,
        }
    }
}

/// Concurrent processing strategy
#[derive(Clone)]
pub struct AsyncProcessingStrategy {
    config: BatchConfig,
    collaborators: Collaborators,
}

impl AsyncProcessingStrategy {
    pub fn new(config: BatchConfig, collaborators: Collaborators) -> Self {
        Self {
            config,
            collaborators,
        }
    }

    pub fn config(&self) -> &BatchConfig {
        &self.config
    }
}

impl ProcessingStrategy for AsyncProcessingStrategy {
    /// Process transfers with one task per request
    ///
    /// 1. Seeds the ledger from the wallet file
    /// 2. Creates a multi-threaded tokio runtime
    /// 3. Starts the notification worker and a shared orchestrator
    /// 4. Reads requests in batches and spawns a task for each, first waiting
    ///    for a running task to finish when `max_in_flight` are running
    /// 5. Waits for every task, then drains the notification worker
    /// 6. Writes final wallet states to output
    fn process(
        &self,
        input: &ProcessingInput,
        output: &mut dyn Write,
    ) -> Result<ProcessingReport, String> {
        let ledger = Arc::new(load_ledger(&input.wallets)?);

        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(num_cpus::get().min(self.config.max_in_flight).max(1))
            .enable_all()
            .build()
            .map_err(|e| format!("Failed to create tokio runtime: {}", e))?;

        let (rejected, skipped, notifications) = runtime.block_on(async {
            let file = tokio::fs::File::open(&input.transfers).await.map_err(|e| {
                format!(
                    "Failed to open file '{}': {}",
                    input.transfers.display(),
                    e
                )
            })?;

            // Wrap tokio file in a compatibility layer for csv-async
            let compat_file = tokio_util::compat::TokioAsyncReadCompatExt::compat(file);
            let mut reader = AsyncReader::new(compat_file);

            let (queue, worker) = NotificationWorker::spawn_with_timeout(
                Arc::clone(&self.collaborators.dispatcher),
                self.collaborators.notification_capacity,
                self.collaborators.notification_timeout,
            );
            let orchestrator = Arc::new(TransferOrchestrator::new(
                ledger.clone(),
                Arc::clone(&self.collaborators.authorization),
                queue,
                self.collaborators.orchestrator.clone(),
            ));
            let mut tasks = JoinSet::new();
            let mut rejected = 0;
            let mut skipped = 0;

            loop {
                let batch = reader.read_batch(self.config.batch_size).await;
                if batch.is_exhausted() {
                    break;
                }
                skipped += batch.skipped;

                for request in batch.requests {
                    while tasks.len() >= self.config.max_in_flight {
                        if let Some(result) = tasks.join_next().await {
                            rejected += count_rejection(result);
                        }
                    }

                    let orchestrator = Arc::clone(&orchestrator);
                    tasks.spawn(async move { orchestrator.execute(request).await.is_ok() });
                }
            }

            while let Some(result) = tasks.join_next().await {
                rejected += count_rejection(result);
            }

            // Closing the queue lets the worker finish
            drop(orchestrator);
            let notifications = worker.join().await;

            Ok::<_, String>((rejected, skipped, notifications))
        })?;

        finish(&ledger, rejected, skipped, notifications, output)
    }
}

/// 1 for a rejected or panicked request, 0 for a committed one
fn count_rejection(result: Result<bool, JoinError>) -> usize {
    match result {
        Ok(true) => 0,
        // Rejections are logged by the orchestrator
        Ok(false) => 1,
        Err(e) => {
            error!(error = ?e, "Transfer task panicked");
            1
        }
    }
}
