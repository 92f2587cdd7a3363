// CLI module
// Command-line interface and argument parsing

mod args;

pub use args::{CliArgs, StrategyType};

use clap::Parser;

/// Parse command-line arguments using clap
///
/// Values not given on the command line are read from `TRANSFER_*`
/// environment variables. If parsing fails (invalid or missing arguments, or
/// --help), clap displays an error message or help text and exits.
pub fn parse_args() -> CliArgs {
    CliArgs::parse()
}
