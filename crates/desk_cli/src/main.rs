//! deskchat CLI - Main entry point.
//!
//! Exit codes:
//! - 0: Success
//! - 1: General error
//! - 2: Invalid arguments or configuration
//! - 3: Validation failure

use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod commands;
mod console;

use commands::{Cli, Commands};
use desk_chat::ChatError;

/// CI-friendly exit codes
pub struct ExitCodes;

impl ExitCodes {
    pub const SUCCESS: u8 = 0;
    pub const GENERAL_ERROR: u8 = 1;
    pub const INVALID_ARGS: u8 = 2;
    pub const VALIDATION_FAILURE: u8 = 3;
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    init_logging(cli.verbose, cli.quiet);

    let result = match cli.command {
        Commands::Chat(args) => commands::chat::execute(args).await,
        Commands::Send(args) => commands::send::execute(args).await,
        Commands::CheckContact(args) => commands::check_contact::execute(args).await,
        Commands::InitConfig(args) => commands::init_config::execute(args).await,
    };

    match result {
        Ok(()) => ExitCode::from(ExitCodes::SUCCESS),
        Err(e) => {
            let exit_code = categorize_error(&e);
            eprintln!("❌ Error: {:#}", e);
            ExitCode::from(exit_code)
        }
    }
}

const DEFAULT_DIRECTIVES: &str = "deskchat=info,desk_chat=info,warn";
const VERBOSE_DIRECTIVES: &str = "deskchat=debug,desk_chat=debug,info";
const QUIET_DIRECTIVES: &str = "error";

fn default_directives(verbose: bool, quiet: bool) -> &'static str {
    if verbose {
        VERBOSE_DIRECTIVES
    } else if quiet {
        QUIET_DIRECTIVES
    } else {
        DEFAULT_DIRECTIVES
    }
}

/// Logs go to stderr so they never mix with the transcript on stdout
fn init_logging(verbose: bool, quiet: bool) {
    let default_directives = default_directives(verbose, quiet);

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directives));

    let log_result = tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .with(filter)
        .try_init();

    if log_result.is_err() {
        // Logging already initialized, continue
    }
}

/// Categorize error to determine exit code
fn categorize_error(e: &anyhow::Error) -> u8 {
    match e.downcast_ref::<ChatError>() {
        Some(ChatError::Validation(_)) => ExitCodes::VALIDATION_FAILURE,
        Some(ChatError::Config(_)) => ExitCodes::INVALID_ARGS,
        _ => ExitCodes::GENERAL_ERROR,
    }
}
