//! Wallet Transfer Engine CLI
//!
//! Command-line interface for executing wallet-to-wallet transfers from CSV files.
//!
//! # Usage
//!
//! ```bash
//! cargo run -- --wallets wallets.csv transfers.csv > wallets_out.csv
//! cargo run -- --wallets wallets.csv --strategy sync transfers.csv > wallets_out.csv
//! cargo run -- --wallets wallets.csv --max-concurrent 8 --transfers-out committed.csv transfers.csv
//! cargo run -- --wallets wallets.csv --authorizer-url http://localhost:8080/authorize transfers.csv
//! ```
//!
//! The program seeds wallets from the wallet file, executes every request of
//! the transfer file through the selected processing strategy, and writes the
//! final wallet states to stdout. Logs go to stderr.
//!
//! # Processing Strategies
//!
//! - **sync**: Requests executed one at a time in file order
//! - **async**: One task per request with bounded concurrency (default)
//!
//! # Exit Codes
//!
//! - 0: Success (rejected transfers do not change the exit code)
//! - 1: Error (missing arguments, file not found, file not readable, etc.)

use std::fs::File;
use std::io::BufWriter;
use std::process;
use tracing::error;
use wallet_transfer_engine::cli;
use wallet_transfer_engine::io::write_transfers_csv;
use wallet_transfer_engine::logging;
use wallet_transfer_engine::strategy::{self, ProcessingInput};

fn main() {
    let args = cli::parse_args();

    if let Err(e) = logging::init_logging(&args.log_config()) {
        eprintln!("Error: {}", e);
        process::exit(1);
    }

    if let Err(e) = run(&args) {
        error!(error = %e, "Processing failed");
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn run(args: &cli::CliArgs) -> Result<(), String> {
    let collaborators = args.collaborators()?;

    // Create the appropriate processing strategy based on CLI arguments
    let strategy = {
        let config = if matches!(args.strategy, cli::StrategyType::Async) {
            Some(args.to_batch_config())
        } else {
            None
        };
        strategy::create_strategy(args.strategy, config, collaborators)
    };

    let input = ProcessingInput::new(&args.wallets_file, &args.transfers_file);
    let mut output = std::io::stdout();
    let report = strategy.process(&input, &mut output)?;

    if let Some(path) = &args.transfers_out {
        let file = File::create(path)
            .map_err(|e| format!("Failed to create file '{}': {}", path.display(), e))?;
        let mut writer = BufWriter::new(file);
        write_transfers_csv(&report.transfers, &mut writer)?;
    }

    Ok(())
}
