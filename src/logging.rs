//! Structured logging setup
//!
//! Logs go to stderr; stdout carries the wallet CSV.

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Logging options collected from the CLI
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogConfig {
    /// Default filter directive, used when `RUST_LOG` is not set
    pub level: String,
    /// Emit JSON lines instead of human readable text
    pub json: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

impl LogConfig {
    fn filter(&self) -> Result<EnvFilter, String> {
        match EnvFilter::try_from_default_env() {
            Ok(filter) => Ok(filter),
            Err(_) => EnvFilter::try_new(&self.level)
                .map_err(|e| format!("Invalid log level '{}': {}", self.level, e)),
        }
    }
}

/// Install the global tracing subscriber
///
/// # Errors
///
/// Returns an error if the level is not a valid filter directive or a global
/// subscriber is already installed.
pub fn init_logging(config: &LogConfig) -> Result<(), String> {
    let registry = tracing_subscriber::registry().with(config.filter()?);

    let result = if config.json {
        let layer = fmt::layer()
            .json()
            .with_target(true)
            .with_writer(std::io::stderr)
            .with_ansi(false);
        registry.with(layer).try_init()
    } else {
        let layer = fmt::layer()
            .with_target(false)
            .with_writer(std::io::stderr);
        registry.with(layer).try_init()
    };

    result.map_err(|e| format!("Failed to initialize logging: {}", e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_default_log_config() {
        let config = LogConfig::default();
        assert_eq!(config.level, "info");
        assert!(!config.json);
    }

    #[rstest]
    #[case::plain_level("debug")]
    #[case::per_target("wallet_transfer_engine=trace,reqwest=warn")]
    fn test_valid_level_builds_filter(#[case] level: &str) {
        let config = LogConfig {
            level: level.to_string(),
            json: false,
        };

        assert!(config.filter().is_ok());
    }

    #[test]
    fn test_invalid_level_is_rejected() {
        if std::env::var_os("RUST_LOG").is_some() {
            return;
        }
        let config = LogConfig {
            level: "wallet_transfer_engine=loud".to_string(),
            json: false,
        };

        assert!(config.filter().unwrap_err().contains("Invalid log level"));
    }
}
