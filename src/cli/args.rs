use crate::core::notification::{DEFAULT_DELIVERY_TIMEOUT, DEFAULT_QUEUE_CAPACITY};
use crate::core::{
    HttpAuthorizationGate, HttpNotificationDispatcher, LogNotificationDispatcher,
    OrchestratorConfig, StaticAuthorizationGate,
};
use crate::logging::LogConfig;
use crate::strategy::{BatchConfig, Collaborators};
use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// Execute wallet-to-wallet transfers
#[derive(Parser, Debug)]
#[command(name = "wallet-transfer-engine")]
#[command(about = "Execute wallet-to-wallet transfers from CSV files", long_about = None)]
pub struct CliArgs {
    /// Input CSV file path containing transfer requests
    #[arg(value_name = "TRANSFERS", help = "Path to the transfer requests CSV file")]
    pub transfers_file: PathBuf,

    /// Wallet seed file
    #[arg(
        long = "wallets",
        value_name = "FILE",
        env = "TRANSFER_WALLETS",
        help = "Path to the wallets CSV file (id,type,balance)"
    )]
    pub wallets_file: PathBuf,

    /// Processing strategy to use
    #[arg(
        long = "strategy",
        value_name = "STRATEGY",
        default_value = "async",
        env = "TRANSFER_STRATEGY",
        help = "Processing strategy: 'sync' for file order or 'async' for one task per request"
    )]
    pub strategy: StrategyType,

    /// Number of requests read per batch (async mode only)
    #[arg(
        long = "batch-size",
        value_name = "SIZE",
        env = "TRANSFER_BATCH_SIZE",
        help = "Number of requests read per batch (default: 1000)"
    )]
    pub batch_size: Option<usize>,

    /// Maximum number of requests in flight (async mode only)
    #[arg(
        long = "max-concurrent",
        value_name = "COUNT",
        env = "TRANSFER_MAX_CONCURRENT",
        help = "Maximum number of requests executing concurrently (default: 4 x CPU cores)"
    )]
    pub max_concurrent: Option<usize>,

    #[arg(
        long = "authorization-timeout-ms",
        value_name = "MILLIS",
        env = "TRANSFER_AUTHORIZATION_TIMEOUT_MS",
        help = "Timeout for one authorization call in milliseconds (default: 3000)"
    )]
    pub authorization_timeout_ms: Option<u64>,

    /// Remote authorization service; every transfer is authorized when absent
    #[arg(
        long = "authorizer-url",
        value_name = "URL",
        env = "TRANSFER_AUTHORIZER_URL",
        help = "URL of the authorization service (default: authorize everything)"
    )]
    pub authorizer_url: Option<String>,

    /// Remote notification service; notifications are only logged when absent
    #[arg(
        long = "notifier-url",
        value_name = "URL",
        env = "TRANSFER_NOTIFIER_URL",
        help = "URL of the notification service (default: log notifications)"
    )]
    pub notifier_url: Option<String>,

    #[arg(
        long = "notification-timeout-ms",
        value_name = "MILLIS",
        env = "TRANSFER_NOTIFICATION_TIMEOUT_MS",
        help = "Timeout for one notification delivery in milliseconds (default: 5000)"
    )]
    pub notification_timeout_ms: Option<u64>,

    #[arg(
        long = "notification-queue",
        value_name = "SIZE",
        env = "TRANSFER_NOTIFICATION_QUEUE",
        help = "Capacity of the notification queue (default: 1024)"
    )]
    pub notification_queue: Option<usize>,

    /// Optional output file for committed transfers
    #[arg(
        long = "transfers-out",
        value_name = "FILE",
        env = "TRANSFER_TRANSFERS_OUT",
        help = "Write committed transfers to this CSV file"
    )]
    pub transfers_out: Option<PathBuf>,

    #[arg(
        long = "log-level",
        value_name = "LEVEL",
        default_value = "info",
        env = "TRANSFER_LOG_LEVEL",
        help = "Log level or filter directive; RUST_LOG takes precedence"
    )]
    pub log_level: String,

    #[arg(
        long = "log-json",
        env = "TRANSFER_LOG_JSON",
        help = "Emit logs as JSON lines"
    )]
    pub log_json: bool,
}

/// Available processing strategies
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum StrategyType {
    Sync,
    Async,
}

impl CliArgs {
    /// Create a BatchConfig from CLI arguments
    ///
    /// Missing values fall back to defaults; zero values are replaced with
    /// defaults by `BatchConfig::new`, which logs a warning.
    pub fn to_batch_config(&self) -> BatchConfig {
        if self.batch_size.is_some() || self.max_concurrent.is_some() {
            let default = BatchConfig::default();
            BatchConfig::new(
                self.batch_size.unwrap_or(default.batch_size),
                self.max_concurrent.unwrap_or(default.max_in_flight),
            )
        } else {
            BatchConfig::default()
        }
    }

    pub fn orchestrator_config(&self) -> OrchestratorConfig {
        match self.authorization_timeout_ms {
            Some(ms) => OrchestratorConfig::new(Duration::from_millis(ms)),
            None => OrchestratorConfig::default(),
        }
    }

    /// Build the collaborators selected by the CLI arguments
    ///
    /// # Errors
    ///
    /// Returns an error if an HTTP client cannot be created.
    pub fn collaborators(&self) -> Result<Collaborators, String> {
        let authorization: Arc<dyn crate::core::AuthorizationGate> = match &self.authorizer_url {
            Some(url) => Arc::new(
                HttpAuthorizationGate::new(url.clone())
                    .map_err(|e| format!("Failed to create authorization client: {}", e))?,
            ),
            None => Arc::new(StaticAuthorizationGate::allow_all()),
        };

        let dispatcher: Arc<dyn crate::core::NotificationDispatcher> = match &self.notifier_url {
            Some(url) => Arc::new(
                HttpNotificationDispatcher::new(url.clone())
                    .map_err(|e| format!("Failed to create notification client: {}", e))?,
            ),
            None => Arc::new(LogNotificationDispatcher),
        };

        let notification_capacity = match self.notification_queue {
            Some(0) | None => DEFAULT_QUEUE_CAPACITY,
            Some(capacity) => capacity,
        };

        let notification_timeout = match self.notification_timeout_ms {
            Some(0) | None => DEFAULT_DELIVERY_TIMEOUT,
            Some(ms) => Duration::from_millis(ms),
        };

        Ok(Collaborators {
            authorization,
            dispatcher,
            orchestrator: self.orchestrator_config(),
            notification_capacity,
            notification_timeout,
        })
    }

    pub fn log_config(&self) -> LogConfig {
        LogConfig {
            level: self.log_level.clone(),
            json: self.log_json,
        }
    }
}
