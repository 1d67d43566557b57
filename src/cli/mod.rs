//! Command Line Interface module
//!
//! Argument parsing and the command implementations built on the library.

pub mod args;
pub mod commands;

pub use args::*;

use anyhow::Result;

use crate::config::default_config_path;
use crate::utils::logging::init_cli_logging;

/// Main CLI application runner
pub async fn run() -> Result<()> {
    let cli = Cli::parse_args();

    init_cli_logging(cli.verbose, cli.quiet, cli.log_json)?;

    let config_path = cli.config.clone().unwrap_or_else(default_config_path);
    commands::execute_command(cli.command, &config_path).await
}
