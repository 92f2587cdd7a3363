//! Sequential processing strategy
//!
//! This module provides a single-threaded implementation of the
//! ProcessingStrategy trait: requests are streamed from the transfer file with
//! `SyncReader` and executed one after another, each awaited to completion
//! before the next one starts.
//!
//! # Design
//!
//! The orchestrator is async (authorization and notification are), so the
//! strategy drives it on a current-thread tokio runtime. The notification
//! worker shares that thread and runs whenever a request is waiting.
//! Output is deterministic for a given input, which makes this the reference
//! strategy for fixtures.

use crate::core::{NotificationWorker, TransferOrchestrator};
use crate::io::sync_reader::SyncReader;
use crate::strategy::{
    finish, load_ledger, Collaborators, ProcessingInput, ProcessingReport, ProcessingStrategy,
};
use crate::types::TransferRequest;
use std::io::Write;
use std::sync::Arc;
use tracing::warn;

/// Sequential processing strategy
#[derive(Clone)]
pub struct SyncProcessingStrategy {
    collaborators: Collaborators,
}

impl SyncProcessingStrategy {
    pub fn new(collaborators: Collaborators) -> Self {
        Self { collaborators }
    }
}

impl Default for SyncProcessingStrategy {
    fn default() -> Self {
        Self::new(Collaborators::default())
    }
}

impl ProcessingStrategy for SyncProcessingStrategy {
    /// Process transfers one at a time
    ///
    /// 1. Seeds the ledger from the wallet file
    /// 2. Starts the notification worker and the orchestrator
    /// 3. Streams requests with SyncReader and executes each in turn
    /// 4. Drains the notification worker
    /// 5. Writes final wallet states to output
    fn process(
        &self,
        input: &ProcessingInput,
        output: &mut dyn Write,
    ) -> Result<ProcessingReport, String> {
        let ledger = Arc::new(load_ledger(&input.wallets)?);
        let reader = SyncReader::<TransferRequest>::new(&input.transfers)?;

        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| format!("Failed to create tokio runtime: {}", e))?;

        let (rejected, skipped, notifications) = runtime.block_on(async {
            let (queue, worker) = NotificationWorker::spawn_with_timeout(
                Arc::clone(&self.collaborators.dispatcher),
                self.collaborators.notification_capacity,
                self.collaborators.notification_timeout,
            );
            let orchestrator = TransferOrchestrator::new(
                ledger.clone(),
                Arc::clone(&self.collaborators.authorization),
                queue,
                self.collaborators.orchestrator.clone(),
            );

            let mut rejected = 0;
            let mut skipped = 0;

            for result in reader {
                match result {
                    Ok(request) => {
                        // Rejections are logged by the orchestrator
                        if orchestrator.execute(request).await.is_err() {
                            rejected += 1;
                        }
                    }
                    Err(e) => {
                        warn!(error = %e, "Transfer row skipped");
                        skipped += 1;
                    }
                }
            }

            // Closing the queue lets the worker finish
            drop(orchestrator);
            let notifications = worker.join().await;

            (rejected, skipped, notifications)
        });

        finish(&ledger, rejected, skipped, notifications, output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{NotificationDispatcher, StaticAuthorizationGate};
    use crate::types::{NotificationError, Transfer};
    use async_trait::async_trait;
    use std::io::Write;
    use std::time::Duration;
    use tempfile::NamedTempFile;

    /// Dispatcher whose deliveries never complete
    struct UnresponsiveDispatcher;

    #[async_trait]
    impl NotificationDispatcher for UnresponsiveDispatcher {
        async fn send_notification(&self, _transfer: &Transfer) -> Result<(), NotificationError> {
            std::future::pending().await
        }
    }

    /// Helper function to create a temporary CSV file for testing
    fn create_temp_csv(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().expect("Failed to create temp file");
        file.write_all(content.as_bytes())
            .expect("Failed to write to temp file");
        file.flush().expect("Failed to flush temp file");
        file
    }

    #[test]
    fn test_sync_strategy_executes_transfers_in_order() {
        let wallets = create_temp_csv("id,type,balance\n1,common,50\n2,common,0\n");
        // The second transfer is only possible after the first one
        let transfers = create_temp_csv("payer,payee,value\n1,2,50\n2,1,20\n");
        let input = ProcessingInput::new(wallets.path(), transfers.path());

        let mut output = Vec::new();
        let report = SyncProcessingStrategy::default()
            .process(&input, &mut output)
            .unwrap();

        assert_eq!(
            String::from_utf8(output).unwrap(),
            "id,type,balance\n1,common,20.0000\n2,common,30.0000\n"
        );
        assert_eq!(report.transfers.len(), 2);
        assert_eq!(report.rejected, 0);
        assert_eq!(report.notifications.dispatched, 2);
    }

    #[test]
    fn test_sync_strategy_counts_rejections_and_skipped_rows() {
        let wallets = create_temp_csv("id,type,balance\n1,common,10\n2,merchant,10\n");
        let transfers = create_temp_csv("payer,payee,value\n2,1,5\n1,2,oops\n1,2,11\n1,2,10\n");
        let input = ProcessingInput::new(wallets.path(), transfers.path());

        let mut output = Vec::new();
        let report = SyncProcessingStrategy::default()
            .process(&input, &mut output)
            .unwrap();

        assert_eq!(report.rejected, 2);
        assert_eq!(report.skipped, 1);
        assert_eq!(report.transfers.len(), 1);
        assert_eq!(
            String::from_utf8(output).unwrap(),
            "id,type,balance\n1,common,0.0000\n2,merchant,20.0000\n"
        );
    }

    #[test]
    fn test_sync_strategy_denied_authorization_rejects_everything() {
        let wallets = create_temp_csv("id,type,balance\n1,common,10\n2,common,10\n");
        let transfers = create_temp_csv("payer,payee,value\n1,2,5\n2,1,5\n");
        let input = ProcessingInput::new(wallets.path(), transfers.path());
        let collaborators = Collaborators {
            authorization: Arc::new(StaticAuthorizationGate::deny_all()),
            ..Collaborators::default()
        };

        let mut output = Vec::new();
        let report = SyncProcessingStrategy::new(collaborators)
            .process(&input, &mut output)
            .unwrap();

        assert_eq!(report.rejected, 2);
        assert!(report.transfers.is_empty());
        assert_eq!(report.notifications.dispatched, 0);
    }

    #[test]
    fn test_sync_strategy_finishes_when_notifier_never_answers() {
        let wallets = create_temp_csv("id,type,balance\n1,common,10\n2,common,0\n");
        let transfers = create_temp_csv("payer,payee,value\n1,2,4\n");
        let input = ProcessingInput::new(wallets.path(), transfers.path());
        let collaborators = Collaborators {
            dispatcher: Arc::new(UnresponsiveDispatcher),
            notification_timeout: Duration::from_millis(50),
            ..Collaborators::default()
        };

        let mut output = Vec::new();
        let report = SyncProcessingStrategy::new(collaborators)
            .process(&input, &mut output)
            .unwrap();

        assert_eq!(
            String::from_utf8(output).unwrap(),
            "id,type,balance\n1,common,6.0000\n2,common,4.0000\n"
        );
        assert_eq!(report.transfers.len(), 1);
        assert_eq!(report.notifications.dispatched, 0);
        assert_eq!(report.notifications.failed, 1);
    }

    #[test]
    fn test_sync_strategy_handles_missing_file() {
        let wallets = create_temp_csv("id,type,balance\n");
        let input = ProcessingInput::new(wallets.path(), "nonexistent.csv");

        let mut output = Vec::new();
        let result = SyncProcessingStrategy::default().process(&input, &mut output);

        assert!(result.unwrap_err().contains("Failed to open file"));
    }
}
