//! Orchestrator integration tests
//!
//! These tests drive `TransferOrchestrator` through the public API with the
//! in-memory ledger and hand-written collaborators:
//! - balance conservation and rejection without mutation
//! - authorization declines and timeouts
//! - commit failures leaving the ledger untouched
//! - notification ordering and failure isolation
//! - concurrent debits against one payer

use async_trait::async_trait;
use rstest::rstest;
use rust_decimal::Decimal;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use wallet_transfer_engine::core::{
    NotificationWorker, OrchestratorConfig, StaticAuthorizationGate,
};
use wallet_transfer_engine::types::{AuthorizationError, NotificationError};
use wallet_transfer_engine::{
    AuthorizationGate, InMemoryLedger, Ledger, NotificationDispatcher, PersistenceUnit, Transfer,
    TransferError, TransferId, TransferOrchestrator, TransferRequest, Wallet, WalletId, WalletType,
};

fn wallet(id: WalletId, wallet_type: WalletType, balance: i64) -> Wallet {
    Wallet::new(id, wallet_type, Decimal::new(balance, 0)).unwrap()
}

fn request(payer: WalletId, payee: WalletId, value: i64) -> TransferRequest {
    TransferRequest::new(payer, payee, Decimal::new(value, 0))
}

async fn balance_of(ledger: &dyn Ledger, id: WalletId) -> Decimal {
    ledger.find_wallet(id).await.unwrap().unwrap().balance()
}

/// Dispatcher recording every notification it receives
#[derive(Default)]
struct RecordingDispatcher {
    delivered: Mutex<Vec<Transfer>>,
    fail: bool,
}

impl RecordingDispatcher {
    fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    fn delivered(&self) -> Vec<Transfer> {
        self.delivered.lock().unwrap().clone()
    }
}

#[async_trait]
impl NotificationDispatcher for RecordingDispatcher {
    async fn send_notification(&self, transfer: &Transfer) -> Result<(), NotificationError> {
        self.delivered.lock().unwrap().push(transfer.clone());
        if self.fail {
            return Err(NotificationError::Delivery {
                message: "service unavailable".to_string(),
            });
        }
        Ok(())
    }
}

/// Dispatcher asserting the transfer is already visible in the ledger
struct CommitCheckingDispatcher {
    ledger: Arc<InMemoryLedger>,
    seen_before_commit: AtomicBool,
    calls: AtomicUsize,
}

#[async_trait]
impl NotificationDispatcher for CommitCheckingDispatcher {
    async fn send_notification(&self, transfer: &Transfer) -> Result<(), NotificationError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let stored = self.ledger.find_transfer(transfer.id()).await.ok().flatten();
        if stored.as_ref() != Some(transfer) {
            self.seen_before_commit.store(true, Ordering::SeqCst);
        }
        Ok(())
    }
}

/// Gate that answers after a delay
struct SlowGate {
    delay: Duration,
}

#[async_trait]
impl AuthorizationGate for SlowGate {
    async fn is_authorized(&self, _request: &TransferRequest) -> Result<bool, AuthorizationError> {
        tokio::time::sleep(self.delay).await;
        Ok(true)
    }
}

/// Gate counting its calls
#[derive(Default)]
struct CountingGate {
    calls: AtomicUsize,
}

#[async_trait]
impl AuthorizationGate for CountingGate {
    async fn is_authorized(&self, _request: &TransferRequest) -> Result<bool, AuthorizationError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(true)
    }
}

/// Ledger whose commits always fail
struct FailingLedger {
    inner: Arc<InMemoryLedger>,
}

#[async_trait]
impl Ledger for FailingLedger {
    async fn find_wallet(&self, id: WalletId) -> Result<Option<Wallet>, TransferError> {
        self.inner.find_wallet(id).await
    }

    async fn find_transfer(&self, id: TransferId) -> Result<Option<Transfer>, TransferError> {
        self.inner.find_transfer(id).await
    }

    async fn commit(&self, _unit: PersistenceUnit) -> Result<(), TransferError> {
        Err(TransferError::persistence_failure("disk full"))
    }
}

struct Setup {
    ledger: Arc<InMemoryLedger>,
    orchestrator: TransferOrchestrator,
    worker: NotificationWorker,
}

fn setup(
    wallets: Vec<Wallet>,
    gate: Arc<dyn AuthorizationGate>,
    dispatcher: Arc<dyn NotificationDispatcher>,
    config: OrchestratorConfig,
) -> Setup {
    let ledger = Arc::new(InMemoryLedger::from_wallets(wallets));
    let (queue, worker) = NotificationWorker::spawn(dispatcher, 64);
    let orchestrator = TransferOrchestrator::new(ledger.clone(), gate, queue, config);

    Setup {
        ledger,
        orchestrator,
        worker,
    }
}

fn default_wallets() -> Vec<Wallet> {
    vec![
        wallet(1, WalletType::Common, 100),
        wallet(2, WalletType::Common, 50),
        wallet(3, WalletType::Merchant, 50),
    ]
}

#[tokio::test]
async fn test_transfer_moves_funds_and_notifies_once() {
    let dispatcher = Arc::new(RecordingDispatcher::default());
    let Setup {
        ledger,
        orchestrator,
        worker,
    } = setup(
        default_wallets(),
        Arc::new(StaticAuthorizationGate::allow_all()),
        dispatcher.clone(),
        OrchestratorConfig::default(),
    );

    let transfer = orchestrator.execute(request(1, 2, 40)).await.unwrap();

    assert_eq!(transfer.payer(), 1);
    assert_eq!(transfer.payee(), 2);
    assert_eq!(transfer.value(), Decimal::new(40, 0));
    assert_eq!(balance_of(&*ledger, 1).await, Decimal::new(60, 0));
    assert_eq!(balance_of(&*ledger, 2).await, Decimal::new(90, 0));
    assert_eq!(ledger.transfers(), vec![transfer.clone()]);

    drop(orchestrator);
    let stats = worker.join().await;

    assert_eq!(stats.dispatched, 1);
    assert_eq!(dispatcher.delivered(), vec![transfer]);
}

#[rstest]
#[case::common_to_common(1, 2, 30)]
#[case::common_to_merchant(1, 3, 100)]
#[case::reverse_direction(2, 1, 1)]
#[tokio::test]
async fn test_transfer_conserves_combined_balance(
    #[case] payer: WalletId,
    #[case] payee: WalletId,
    #[case] value: i64,
) {
    let Setup {
        ledger,
        orchestrator,
        ..
    } = setup(
        default_wallets(),
        Arc::new(StaticAuthorizationGate::allow_all()),
        Arc::new(RecordingDispatcher::default()),
        OrchestratorConfig::default(),
    );
    let before = balance_of(&*ledger, payer).await + balance_of(&*ledger, payee).await;

    orchestrator
        .execute(request(payer, payee, value))
        .await
        .unwrap();

    let after = balance_of(&*ledger, payer).await + balance_of(&*ledger, payee).await;
    assert_eq!(before, after);
    assert_eq!(ledger.total_balance(), Decimal::new(200, 0));
}

#[rstest]
#[case::merchant_payer(request(3, 1, 10), "transfer_not_allowed_for_wallet_type")]
#[case::insufficient_balance(request(2, 1, 51), "insufficient_balance")]
#[case::unknown_payer(request(9, 1, 10), "wallet_not_found")]
#[case::unknown_payee(request(1, 9, 10), "wallet_not_found")]
#[case::same_wallet(request(1, 1, 10), "same_wallet")]
#[case::zero_value(request(1, 2, 0), "invalid_amount")]
#[tokio::test]
async fn test_rejections_leave_state_and_gate_untouched(
    #[case] rejected: TransferRequest,
    #[case] expected_kind: &str,
) {
    let gate = Arc::new(CountingGate::default());
    let dispatcher = Arc::new(RecordingDispatcher::default());
    let Setup {
        ledger,
        orchestrator,
        worker,
    } = setup(
        default_wallets(),
        gate.clone(),
        dispatcher.clone(),
        OrchestratorConfig::default(),
    );

    let err = orchestrator.execute(rejected).await.unwrap_err();

    assert_eq!(err.kind(), expected_kind);
    assert_eq!(gate.calls.load(Ordering::SeqCst), 0);
    assert_eq!(ledger.wallets(), default_wallets());
    assert!(ledger.transfers().is_empty());

    drop(orchestrator);
    assert_eq!(worker.join().await.dispatched, 0);
    assert!(dispatcher.delivered().is_empty());
}

#[tokio::test]
async fn test_merchant_payer_example() {
    let Setup {
        ledger,
        orchestrator,
        ..
    } = setup(
        vec![wallet(1, WalletType::Merchant, 100), wallet(2, WalletType::Common, 0)],
        Arc::new(StaticAuthorizationGate::allow_all()),
        Arc::new(RecordingDispatcher::default()),
        OrchestratorConfig::default(),
    );

    let err = orchestrator.execute(request(1, 2, 10)).await.unwrap_err();

    assert_eq!(
        err,
        TransferError::transfer_not_allowed(1, WalletType::Merchant)
    );
    assert_eq!(balance_of(&*ledger, 1).await, Decimal::new(100, 0));
    assert_eq!(balance_of(&*ledger, 2).await, Decimal::ZERO);
}

#[tokio::test]
async fn test_declined_authorization_is_rejected() {
    let Setup {
        ledger,
        orchestrator,
        ..
    } = setup(
        default_wallets(),
        Arc::new(StaticAuthorizationGate::deny_all()),
        Arc::new(RecordingDispatcher::default()),
        OrchestratorConfig::default(),
    );

    let err = orchestrator.execute(request(1, 2, 10)).await.unwrap_err();

    assert!(matches!(err, TransferError::TransferNotAuthorized { .. }));
    assert_eq!(ledger.wallets(), default_wallets());
}

#[tokio::test]
async fn test_authorization_timeout_is_rejected() {
    let Setup {
        ledger,
        orchestrator,
        ..
    } = setup(
        default_wallets(),
        Arc::new(SlowGate {
            delay: Duration::from_secs(5),
        }),
        Arc::new(RecordingDispatcher::default()),
        OrchestratorConfig::new(Duration::from_millis(50)),
    );

    let err = orchestrator.execute(request(1, 2, 10)).await.unwrap_err();

    match err {
        TransferError::TransferNotAuthorized { reason } => {
            assert!(reason.contains("timed out"), "unexpected reason: {}", reason)
        }
        other => panic!("Expected TransferNotAuthorized, got {:?}", other),
    }
    assert_eq!(ledger.wallets(), default_wallets());
}

#[tokio::test]
async fn test_commit_failure_applies_nothing() {
    let inner = Arc::new(InMemoryLedger::from_wallets(default_wallets()));
    let dispatcher = Arc::new(RecordingDispatcher::default());
    let (queue, worker) = NotificationWorker::spawn(dispatcher.clone(), 8);
    let orchestrator = TransferOrchestrator::new(
        Arc::new(FailingLedger {
            inner: inner.clone(),
        }),
        Arc::new(StaticAuthorizationGate::allow_all()),
        queue,
        OrchestratorConfig::default(),
    );

    let err = orchestrator.execute(request(1, 2, 40)).await.unwrap_err();

    assert!(err.is_retryable());
    assert_eq!(err, TransferError::persistence_failure("disk full"));
    assert_eq!(inner.wallets(), default_wallets());
    assert!(inner.transfers().is_empty());

    drop(orchestrator);
    assert_eq!(worker.join().await.dispatched, 0);
    assert!(dispatcher.delivered().is_empty());
}

#[tokio::test]
async fn test_notification_never_precedes_commit() {
    let ledger = Arc::new(InMemoryLedger::from_wallets(default_wallets()));
    let dispatcher = Arc::new(CommitCheckingDispatcher {
        ledger: ledger.clone(),
        seen_before_commit: AtomicBool::new(false),
        calls: AtomicUsize::new(0),
    });
    let (queue, worker) = NotificationWorker::spawn(dispatcher.clone(), 8);
    let orchestrator = TransferOrchestrator::new(
        ledger.clone(),
        Arc::new(StaticAuthorizationGate::allow_all()),
        queue,
        OrchestratorConfig::default(),
    );

    for value in [10, 20, 30] {
        orchestrator.execute(request(1, 2, value)).await.unwrap();
    }

    drop(orchestrator);
    worker.join().await;

    assert_eq!(dispatcher.calls.load(Ordering::SeqCst), 3);
    assert!(!dispatcher.seen_before_commit.load(Ordering::SeqCst));
}

#[tokio::test]
async fn test_notification_failure_does_not_fail_transfer() {
    let dispatcher = Arc::new(RecordingDispatcher::failing());
    let Setup {
        ledger,
        orchestrator,
        worker,
    } = setup(
        default_wallets(),
        Arc::new(StaticAuthorizationGate::allow_all()),
        dispatcher.clone(),
        OrchestratorConfig::default(),
    );

    let transfer = orchestrator.execute(request(1, 2, 40)).await.unwrap();

    drop(orchestrator);
    let stats = worker.join().await;

    assert_eq!(stats.failed, 1);
    assert_eq!(stats.dispatched, 0);
    assert_eq!(dispatcher.delivered(), vec![transfer]);
    assert_eq!(balance_of(&*ledger, 1).await, Decimal::new(60, 0));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_debits_never_overdraw() {
    const REQUESTS: i64 = 10;
    const VALUE: i64 = 10;

    let Setup {
        ledger,
        orchestrator,
        worker,
    } = setup(
        vec![
            wallet(1, WalletType::Common, (REQUESTS - 1) * VALUE),
            wallet(2, WalletType::Common, 0),
        ],
        Arc::new(SlowGate {
            delay: Duration::from_millis(5),
        }),
        Arc::new(RecordingDispatcher::default()),
        OrchestratorConfig::default(),
    );
    let orchestrator = Arc::new(orchestrator);

    let handles: Vec<_> = (0..REQUESTS)
        .map(|_| {
            let orchestrator = Arc::clone(&orchestrator);
            tokio::spawn(async move { orchestrator.execute(request(1, 2, VALUE)).await })
        })
        .collect();

    let mut committed = 0;
    let mut insufficient = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => committed += 1,
            Err(TransferError::InsufficientBalance { .. }) => insufficient += 1,
            Err(other) => panic!("Unexpected error: {:?}", other),
        }
    }

    assert_eq!(committed, REQUESTS - 1);
    assert_eq!(insufficient, 1);
    assert_eq!(balance_of(&*ledger, 1).await, Decimal::ZERO);
    assert_eq!(
        balance_of(&*ledger, 2).await,
        Decimal::new((REQUESTS - 1) * VALUE, 0)
    );

    drop(orchestrator);
    assert_eq!(worker.join().await.dispatched, (REQUESTS - 1) as u64);
}
