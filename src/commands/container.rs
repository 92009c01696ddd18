use clap::Args;
use serde::Serialize;

use arthur_ops::command::SystemRunner;
use arthur_ops::container::{self, Action, ContainerPlan, ContainerRequest};
use arthur_ops::defaults;
use arthur_ops::environment::Environment;

use super::CmdResult;

#[derive(Args)]
pub struct ContainerArgs {
    /// One of: run, run-ro, deploy, upload, validate
    #[arg(value_parser = parse_action)]
    action: Action,

    /// AWS profile passed into the container
    #[arg(short = 'p', long)]
    profile: Option<String>,

    /// Image tag
    #[arg(short = 't', long)]
    tag: Option<String>,

    /// Mount the config directory read-write
    #[arg(short = 'w', long)]
    writable: bool,

    /// Print the docker command instead of running it
    #[arg(long)]
    dry_run: bool,

    /// Warehouse config directory (defaults to DATA_WAREHOUSE_CONFIG)
    config_dir: Option<String>,

    /// Target environment (defaults to ARTHUR_DEFAULT_PREFIX, then the login name)
    target_env: Option<String>,
}

fn parse_action(value: &str) -> Result<Action, String> {
    Action::from_name(value).ok_or_else(|| {
        let names: Vec<&str> = Action::ALL.iter().map(Action::as_str).collect();
        format!("unknown action '{}' (expected one of: {})", value, names.join(", "))
    })
}

/// The container owns the terminal unless this is a dry run.
pub fn is_passthrough(args: &ContainerArgs) -> bool {
    !args.dry_run
}

/// Shell actions need a terminal on both ends.
pub fn needs_tty(args: &ContainerArgs) -> bool {
    !args.dry_run && matches!(args.action, Action::Run | Action::RunRo)
}

#[derive(Serialize)]
#[serde(tag = "command")]
pub enum ContainerOutput {
    #[serde(rename = "container.plan")]
    Plan {
        #[serde(flatten)]
        plan: ContainerPlan,
    },
    #[serde(rename = "container.run")]
    Run {
        #[serde(flatten)]
        plan: ContainerPlan,
        exit_code: i32,
    },
}

pub fn run(args: ContainerArgs, _global: &crate::commands::GlobalArgs) -> CmdResult<ContainerOutput> {
    let env = Environment::capture()?;
    let defaults = defaults::load_defaults();

    let request = ContainerRequest {
        action: args.action,
        profile: args.profile,
        tag: args.tag,
        writable_config: args.writable,
        config_dir: args.config_dir,
        target_env: args.target_env,
    };

    let plan = container::plan(&request, &env, &defaults)?;
    if args.dry_run {
        return Ok((ContainerOutput::Plan { plan }, 0));
    }

    let exit_code = container::dispatch(&plan, &SystemRunner)?;
    Ok((ContainerOutput::Run { plan, exit_code }, exit_code))
}
