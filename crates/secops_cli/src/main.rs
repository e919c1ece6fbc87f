//! secops CLI - Main entry point.
//!
//! Exit codes:
//! - 0: Success
//! - 1: General error
//! - 2: Invalid arguments (reported by clap before any command runs)
//! - 3: Compliance failures or rule errors

use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod commands;

use commands::{Cli, Commands};

/// CI-friendly exit codes
pub struct ExitCodes;

impl ExitCodes {
    pub const SUCCESS: u8 = 0;
    pub const GENERAL_ERROR: u8 = 1;
    pub const COMPLIANCE_FAILURE: u8 = 3;
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    init_logging(cli.verbose, cli.quiet);

    let result = match cli.command {
        Commands::Check(args) => commands::check::execute(args),
        Commands::Rules(args) => commands::rules::execute(args),
    };

    if let Err(e) = &result {
        eprintln!("❌ Error: {:#}", e);
    }
    ExitCode::from(exit_code(&result))
}

/// Map a command outcome to the process exit code.
fn exit_code(result: &anyhow::Result<bool>) -> u8 {
    match result {
        Ok(true) => ExitCodes::SUCCESS,
        Ok(false) => ExitCodes::COMPLIANCE_FAILURE,
        Err(_) => ExitCodes::GENERAL_ERROR,
    }
}

/// Logs go to stderr so JSON on stdout stays machine readable.
fn init_logging(verbose: bool, quiet: bool) {
    let default_directives = if verbose {
        "secops_compliance=debug,secops_cli=debug,warn"
    } else if quiet {
        "warn"
    } else {
        "secops_compliance=info,secops_cli=info,warn"
    };

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directives));

    let _ = tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .with(filter)
        .try_init();
}
