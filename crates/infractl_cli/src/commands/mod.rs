//! CLI command definitions.
//!
//! `plan`, `apply` and `destroy` share one argument set and one flow; they
//! differ only in the Terragrunt command they launch.

use clap::{Parser, Subcommand};

pub mod run;
pub mod validate;

/// infractl - compile environment configuration and drive Terragrunt
#[derive(Parser)]
#[command(name = "infractl")]
#[command(version, about = "infractl - compile environment configuration and drive Terragrunt")]
#[command(long_about = r#"
infractl merges a base environment file with a target environment file,
expands ${VAR} / ${VAR:-default} placeholders, checks the declared stacks
against the infra/terragrunt directory tree, writes the result as JSON to
infra/.infractl-cache and runs Terragrunt with INFRACTL_CONFIG_FILE_PATH
pointing at it.

COMMANDS:
  plan       → terragrunt plan for a stack, layer or component
  apply      → terragrunt apply
  destroy    → terragrunt destroy
  validate   → compile and check without running Terragrunt

EXIT CODES:
  0 - Success
  1 - General error
  2 - Invalid arguments or something not found
  3 - Validation failure
  5 - Terragrunt failed
"#)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress non-essential output
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Reject unknown keys in environment files
    #[arg(long, global = true)]
    pub strict: bool,

    /// Print the Terragrunt command instead of running it
    #[arg(long, global = true)]
    pub dry_run: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run `terragrunt plan`
    Plan(run::RunArgs),

    /// Run `terragrunt apply`
    Apply(run::RunArgs),

    /// Run `terragrunt destroy`
    Destroy(run::RunArgs),

    /// Compile and validate without running Terragrunt
    Validate(validate::ValidateArgs),
}

/// Flags every command honours.
#[derive(Debug, Clone, Copy, Default)]
pub struct GlobalOptions {
    pub strict: bool,
    pub dry_run: bool,
}

impl From<&Cli> for GlobalOptions {
    fn from(cli: &Cli) -> Self {
        Self {
            strict: cli.strict,
            dry_run: cli.dry_run,
        }
    }
}
