//! infractl CLI - Main entry point.
//!
//! Exit codes:
//! - 0: Success
//! - 1: General error
//! - 2: Invalid arguments or something not found
//! - 3: Validation failure (format, parse, configuration, variables, hierarchy)
//! - 5: Terragrunt failed

use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use infractl_core::{Action, CoreError, ErrorCategory};

mod commands;

use commands::{Cli, Commands, GlobalOptions};

/// CI-friendly exit codes
pub struct ExitCodes;

impl ExitCodes {
    pub const SUCCESS: u8 = 0;
    pub const GENERAL_ERROR: u8 = 1;
    pub const INVALID_ARGS: u8 = 2;
    pub const VALIDATION_FAILURE: u8 = 3;
    pub const SUBPROCESS_FAILURE: u8 = 5;
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let level = if cli.verbose {
        "infractl=debug"
    } else if cli.quiet {
        "infractl=warn"
    } else {
        "infractl=info"
    };

    let mut filter = EnvFilter::from_default_env();
    if let Ok(directive) = level.parse() {
        filter = filter.add_directive(directive);
    }

    // Already initialised is fine.
    let _ = tracing_subscriber::registry()
        .with(fmt::layer().with_target(false))
        .with(filter)
        .try_init();

    let global = GlobalOptions::from(&cli);

    let result = match cli.command {
        Commands::Plan(args) => commands::run::execute(Action::Plan, args, &global).await,
        Commands::Apply(args) => commands::run::execute(Action::Apply, args, &global).await,
        Commands::Destroy(args) => commands::run::execute(Action::Destroy, args, &global).await,
        Commands::Validate(args) => commands::validate::execute(args, &global).await,
    };

    match result {
        Ok(()) => ExitCode::from(ExitCodes::SUCCESS),
        Err(e) => {
            let exit_code = categorize_error(&e);
            eprintln!("Error: {:#}", e);
            ExitCode::from(exit_code)
        }
    }
}

/// Pick the exit code from the first `CoreError` in the chain.
fn categorize_error(e: &anyhow::Error) -> u8 {
    let category = e
        .chain()
        .find_map(|cause| cause.downcast_ref::<CoreError>())
        .map(CoreError::category);

    match category {
        Some(ErrorCategory::NotFound | ErrorCategory::InvalidArguments) => ExitCodes::INVALID_ARGS,
        Some(
            ErrorCategory::InvalidFormat
            | ErrorCategory::ParseError
            | ErrorCategory::ConfigurationError
            | ErrorCategory::MissingVariable
            | ErrorCategory::HierarchyMismatch,
        ) => ExitCodes::VALIDATION_FAILURE,
        Some(ErrorCategory::SubprocessFailure) => ExitCodes::SUBPROCESS_FAILURE,
        Some(ErrorCategory::General) | None => ExitCodes::GENERAL_ERROR,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Context;

    #[test]
    fn test_exit_code_follows_core_category() {
        let err = Err::<(), _>(CoreError::InvalidSelection("x".into()))
            .context("Invalid selection")
            .unwrap_err();
        assert_eq!(categorize_error(&err), ExitCodes::INVALID_ARGS);

        let err = anyhow::Error::new(CoreError::NoStacks);
        assert_eq!(categorize_error(&err), ExitCodes::VALIDATION_FAILURE);

        let err = anyhow::anyhow!("something else");
        assert_eq!(categorize_error(&err), ExitCodes::GENERAL_ERROR);
    }
}
