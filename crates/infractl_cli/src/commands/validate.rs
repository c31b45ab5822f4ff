//! Validate command - compile and check without running Terragrunt.

use anyhow::{Context, Result};
use clap::Args;
use tracing::info;

use infractl_config::MissingPolicy;
use infractl_core::{sanity, Client, ClientOptions, RepoPaths};

use super::GlobalOptions;

#[derive(Args, Debug)]
pub struct ValidateArgs {
    /// Base environment file under _ENVS
    #[arg(long, default_value = "base")]
    base: String,

    /// Target environment file under _ENVS (defaults to terragrunt/target.yaml)
    #[arg(short, long)]
    target_env: Option<String>,

    /// Require every placeholder variable to be set, even when it has a default
    #[arg(long)]
    require_env: bool,
}

pub async fn execute(args: ValidateArgs, global: &GlobalOptions) -> Result<()> {
    let target_env = args.target_env.as_deref();
    let paths = RepoPaths::discover().context("Failed to locate the repository root")?;

    let options = ClientOptions::new()
        .base(args.base)
        .strict(global.strict);
    let mut client = Client::new(paths, options);
    client.initialise().context("Failed to initialise")?;

    sanity_check(&client, target_env)?;

    let policy = if args.require_env {
        MissingPolicy::RequireEnvironment
    } else {
        MissingPolicy::Unresolvable
    };
    client
        .check_variables(target_env, policy)
        .context("Environment configuration references unset variables")?;

    let compiled = client
        .compile(target_env)
        .context("Failed to compile environment configuration")?;

    let stacks: Vec<&str> = compiled.stacks.iter().map(|s| s.name.as_str()).collect();
    info!("Configuration is valid: {} stack(s)", stacks.len());
    println!("OK: {} ({})", client.target_file(target_env).display(), stacks.join(", "));
    Ok(())
}

/// The file checks of the full sanity check. Terragrunt need not be installed.
fn sanity_check(client: &Client, target_env: Option<&str>) -> Result<()> {
    sanity::check_envs_dir(&client.paths().envs).context("Sanity check failed")?;
    sanity::check_env_file(&client.base_file()).context("Sanity check failed")?;
    sanity::check_env_file(&client.target_file(target_env)).context("Sanity check failed")?;
    Ok(())
}
