use clap::Args;
use serde::Serialize;

use arthur_ops::command::SystemRunner;
use arthur_ops::defaults;
use arthur_ops::environment::Environment;
use arthur_ops::provision::{self, ProvisionOutput, ProvisionRequest};

use super::CmdResult;

#[derive(Args)]
pub struct ProvisionArgs {
    /// Target environment (defaults to ARTHUR_DEFAULT_PREFIX, then the login name)
    #[arg(long)]
    prefix: Option<String>,

    /// Warehouse config directory (defaults to DATA_WAREHOUSE_CONFIG)
    #[arg(long, value_name = "DIR")]
    config: Option<String>,

    /// AWS profile for the aws CLI calls
    #[arg(long)]
    profile: Option<String>,

    /// Delete the pipeline again if defining or activating it fails
    #[arg(long)]
    cleanup_on_failure: bool,

    /// Arguments for the extract step, joined with commas
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    extract_args: Vec<String>,
}

#[derive(Serialize)]
#[serde(tag = "command")]
pub enum ProvisionCommandOutput {
    #[serde(rename = "provision")]
    Provisioned {
        #[serde(flatten)]
        pipeline: ProvisionOutput,
    },
}

pub fn run(args: ProvisionArgs, _global: &crate::commands::GlobalArgs) -> CmdResult<ProvisionCommandOutput> {
    let env = Environment::capture()?;
    let defaults = defaults::load_defaults();

    let request = ProvisionRequest {
        extract_args: args.extract_args,
        prefix: args.prefix,
        config_dir: args.config,
        profile: args.profile,
        cleanup_on_failure: args.cleanup_on_failure,
    };

    let pipeline = provision::run(&request, &env, &defaults, &SystemRunner)?;
    Ok((ProvisionCommandOutput::Provisioned { pipeline }, 0))
}
