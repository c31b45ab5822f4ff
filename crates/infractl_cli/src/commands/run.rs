//! Plan, apply and destroy commands.

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Args;
use tracing::{info, warn};

use infractl_config::MissingPolicy;
use infractl_core::{
    Action, Client, ClientOptions, LaunchOptions, RepoPaths, StackLauncher, StackSelection,
};
use infractl_runner::{CliRunner, CliRunnerOptions};

use super::GlobalOptions;

#[derive(Args, Debug)]
pub struct RunArgs {
    /// Stack to run
    #[arg(short, long)]
    stack: String,

    /// Layer inside the stack
    #[arg(short, long)]
    layer: Option<String>,

    /// Component inside the layer (requires --layer)
    #[arg(short, long)]
    component: Option<String>,

    /// Base environment file under _ENVS
    #[arg(long, default_value = "base")]
    base: String,

    /// Target environment file under _ENVS (defaults to terragrunt/target.yaml)
    #[arg(short, long)]
    target_env: Option<String>,

    /// Fixed name for the compiled JSON file instead of a generated one
    #[arg(long)]
    override_json_name: Option<String>,

    /// Use `terragrunt run-all`
    #[arg(long)]
    all: bool,

    /// Maximum parallel modules for run-all
    #[arg(long, requires = "all")]
    parallelism: Option<u32>,

    /// Skip the interactive approval (apply and destroy)
    #[arg(long)]
    auto_approve: bool,

    /// Extra arguments passed to Terragrunt after `--`
    #[arg(last = true)]
    extra_args: Vec<String>,
}

pub async fn execute(action: Action, args: RunArgs, global: &GlobalOptions) -> Result<()> {
    let selection = StackSelection::new(args.stack, args.layer, args.component)
        .context("Invalid stack selection")?;
    let target_env = args.target_env.as_deref();

    let paths = RepoPaths::discover().context("Failed to locate the repository root")?;

    let options = ClientOptions::new()
        .base(args.base)
        .strict(global.strict)
        .dry_run(global.dry_run);
    let mut client = Client::new(paths.clone(), options);
    client.initialise().context("Failed to initialise")?;

    let mut runner_options = CliRunnerOptions::new();
    if global.dry_run {
        runner_options = runner_options.dry_run();
    }
    let runner = Arc::new(CliRunner::new(runner_options));

    client
        .run_sanity_check(&*runner, target_env)
        .await
        .context("Sanity check failed")?;
    // Unresolved placeholders are passed through as written; only report them.
    let missing = client
        .missing_variables(target_env, MissingPolicy::Unresolvable)
        .context("Failed to read environment configuration")?;
    let mut names: Vec<&str> = Vec::new();
    for var in &missing {
        if !names.contains(&var.name.as_str()) {
            names.push(&var.name);
        }
    }
    if !names.is_empty() {
        warn!("Unset variables left as written: {}", names.join(", "));
    }

    let compiled = client
        .compile(target_env)
        .context("Failed to compile environment configuration")?;
    client
        .validate_selection(&compiled, &selection)
        .with_context(|| format!("'{selection}' does not match the configuration"))?;

    let json = client.to_json(&compiled).context("Failed to serialize")?;
    let cached = client
        .write_cache(target_env, &json, args.override_json_name.as_deref())
        .context("Failed to write the compiled configuration")?;

    let launcher = StackLauncher::new(runner, paths, &cached).with_env(client.env().child_overlay());

    let mut launch = LaunchOptions::new()
        .auto_approve(args.auto_approve)
        .extra_args(args.extra_args);
    if args.all {
        launch = launch.run_all(args.parallelism);
    }

    let result = launcher
        .launch(action, &selection, &launch)
        .await
        .with_context(|| format!("terragrunt {action} failed for '{selection}'"))?;

    if result.dry_run {
        println!("{}", result.command_line);
    } else {
        info!("terragrunt {} finished in {}ms", action, result.duration_ms);
    }
    Ok(())
}
