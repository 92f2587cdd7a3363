//! Post-commit notification delivery
//!
//! The orchestrator never talks to a `NotificationDispatcher` directly. It
//! enqueues committed transfers on a `NotificationQueue`; a separate
//! `NotificationWorker` task drains the queue and calls the dispatcher.
//!
//! ```text
//! TransferOrchestrator ──try_send──▶ mpsc channel ──▶ NotificationWorker ──▶ NotificationDispatcher
//!      (after commit)                (bounded)         (own tokio task)        (log / HTTP)
//! ```
//!
//! Enqueueing never waits: a full or closed queue drops the notification with
//! a warning. Dispatcher failures are logged by the worker and go no further.

use crate::core::orchestrator::TransferStage;
use crate::core::traits::NotificationDispatcher;
use crate::types::{NotificationError, Transfer};
use async_trait::async_trait;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Default number of notifications that may wait for the worker
pub const DEFAULT_QUEUE_CAPACITY: usize = 1024;

/// Default bound on one notification delivery
pub const DEFAULT_DELIVERY_TIMEOUT: Duration = Duration::from_secs(5);

/// Request timeout of the HTTP notification client
const HTTP_TIMEOUT: Duration = Duration::from_secs(10);

/// Dispatcher that only writes a log line
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotificationDispatcher;

#[async_trait]
impl NotificationDispatcher for LogNotificationDispatcher {
    async fn send_notification(&self, transfer: &Transfer) -> Result<(), NotificationError> {
        info!(
            transfer_id = %transfer.id(),
            payer = transfer.payer(),
            payee = transfer.payee(),
            value = %transfer.value(),
            "Transfer notification"
        );
        Ok(())
    }
}

/// Dispatcher posting the transfer as JSON to a remote notification service
#[derive(Debug, Clone)]
pub struct HttpNotificationDispatcher {
    client: reqwest::Client,
    url: String,
}

impl HttpNotificationDispatcher {
    /// Create a dispatcher posting to `url`
    ///
    /// # Errors
    ///
    /// Returns `NotificationError::Delivery` if the HTTP client cannot be built.
    pub fn new(url: impl Into<String>) -> Result<Self, NotificationError> {
        let client = reqwest::Client::builder().timeout(HTTP_TIMEOUT).build()?;
        Ok(Self::with_client(client, url))
    }

    pub fn with_client(client: reqwest::Client, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl NotificationDispatcher for HttpNotificationDispatcher {
    async fn send_notification(&self, transfer: &Transfer) -> Result<(), NotificationError> {
        let response = self.client.post(&self.url).json(transfer).send().await?;
        let status = response.status();

        if status.is_success() {
            Ok(())
        } else {
            Err(NotificationError::Rejected {
                status: status.as_u16(),
            })
        }
    }
}

/// Sending half of the notification channel, held by the orchestrator
#[derive(Debug, Clone)]
pub struct NotificationQueue {
    sender: mpsc::Sender<Transfer>,
}

impl NotificationQueue {
    /// Create a queue and the receiver a worker drains
    pub fn bounded(capacity: usize) -> (Self, mpsc::Receiver<Transfer>) {
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        (Self { sender }, receiver)
    }

    /// Submit a committed transfer without waiting
    ///
    /// Returns `false` when the notification was dropped because the queue is
    /// full or the worker is gone.
    pub fn enqueue(&self, transfer: Transfer) -> bool {
        match self.sender.try_send(transfer) {
            Ok(()) => true,
            Err(TrySendError::Full(transfer)) => {
                warn!(
                    transfer_id = %transfer.id(),
                    "Notification queue full, notification dropped"
                );
                false
            }
            Err(TrySendError::Closed(transfer)) => {
                warn!(
                    transfer_id = %transfer.id(),
                    "Notification worker stopped, notification dropped"
                );
                false
            }
        }
    }
}

/// Delivery counters shared between the worker and its handle
#[derive(Debug, Default)]
struct DeliveryCounters {
    dispatched: AtomicU64,
    failed: AtomicU64,
}

impl DeliveryCounters {
    fn snapshot(&self) -> NotificationStats {
        NotificationStats {
            dispatched: self.dispatched.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
        }
    }
}

/// Outcome counts of a notification worker
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct NotificationStats {
    /// Notifications the dispatcher accepted
    pub dispatched: u64,
    /// Notifications the dispatcher failed to deliver
    pub failed: u64,
}

/// Background task draining the notification queue
pub struct NotificationWorker {
    handle: JoinHandle<()>,
    counters: Arc<DeliveryCounters>,
}

impl NotificationWorker {
    /// Spawn a worker on the current tokio runtime
    ///
    /// Returns the queue to hand to the orchestrator and the worker handle.
    /// The worker exits once every clone of the queue has been dropped and
    /// the remaining notifications are delivered. Each delivery is bounded by
    /// `DEFAULT_DELIVERY_TIMEOUT`.
    pub fn spawn(
        dispatcher: Arc<dyn NotificationDispatcher>,
        capacity: usize,
    ) -> (NotificationQueue, Self) {
        Self::spawn_with_timeout(dispatcher, capacity, DEFAULT_DELIVERY_TIMEOUT)
    }

    /// Spawn a worker whose deliveries give up after `delivery_timeout`
    ///
    /// A delivery that times out counts as failed; the worker moves on to the
    /// next notification.
    pub fn spawn_with_timeout(
        dispatcher: Arc<dyn NotificationDispatcher>,
        capacity: usize,
        delivery_timeout: Duration,
    ) -> (NotificationQueue, Self) {
        let delivery_timeout = if delivery_timeout.is_zero() {
            DEFAULT_DELIVERY_TIMEOUT
        } else {
            delivery_timeout
        };
        let (queue, mut receiver) = NotificationQueue::bounded(capacity);
        let counters = Arc::new(DeliveryCounters::default());

        let task_counters = Arc::clone(&counters);
        let handle = tokio::spawn(async move {
            while let Some(transfer) = receiver.recv().await {
                let delivery =
                    tokio::time::timeout(delivery_timeout, dispatcher.send_notification(&transfer))
                        .await
                        .unwrap_or_else(|_| {
                            Err(NotificationError::TimedOut {
                                millis: delivery_timeout.as_millis() as u64,
                            })
                        });

                match delivery {
                    Ok(()) => {
                        task_counters.dispatched.fetch_add(1, Ordering::Relaxed);
                        debug!(
                            transfer_id = %transfer.id(),
                            stage = %TransferStage::NotificationDispatched,
                            "Notification dispatched"
                        );
                    }
                    Err(e) => {
                        task_counters.failed.fetch_add(1, Ordering::Relaxed);
                        warn!(
                            transfer_id = %transfer.id(),
                            stage = %TransferStage::NotificationFailed,
                            error = %e,
                            "Notification failed"
                        );
                    }
                }
            }
        });

        (queue, Self { handle, counters })
    }

    /// Counts observed so far
    pub fn stats(&self) -> NotificationStats {
        self.counters.snapshot()
    }

    /// Wait for the worker to drain the queue and exit
    ///
    /// Only returns once every `NotificationQueue` clone has been dropped.
    pub async fn join(self) -> NotificationStats {
        let Self { handle, counters } = self;
        if let Err(e) = handle.await {
            warn!(error = %e, "Notification worker panicked");
        }
        counters.snapshot()
    }
}
