use clap::Args;
use serde::Serialize;

use arthur_ops::command::SystemRunner;
use arthur_ops::defaults;
use arthur_ops::environment::Environment;
use arthur_ops::pipelines::{self, PipelineListing};

use super::CmdResult;

#[derive(Args)]
pub struct PipelinesArgs {
    /// Glob patterns for pipeline ids (e.g. 'df-*'); all project pipelines if omitted
    selection: Vec<String>,

    /// AWS profile for the aws CLI calls
    #[arg(long)]
    profile: Option<String>,
}

#[derive(Serialize)]
#[serde(tag = "command")]
pub enum PipelinesOutput {
    #[serde(rename = "pipelines")]
    List {
        #[serde(flatten)]
        listing: PipelineListing,
    },
}

pub fn run(args: PipelinesArgs, _global: &crate::commands::GlobalArgs) -> CmdResult<PipelinesOutput> {
    let env = Environment::capture()?;
    let defaults = defaults::load_defaults();
    let profile = env.resolve_profile(args.profile.as_deref());

    let listing = pipelines::show(&args.selection, profile.as_deref(), &defaults, &SystemRunner)?;
    Ok((PipelinesOutput::List { listing }, 0))
}
