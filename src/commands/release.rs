use clap::Args;
use serde::Serialize;

use arthur_ops::command::SystemRunner;
use arthur_ops::defaults;
use arthur_ops::environment::Environment;
use arthur_ops::release::{self, ReleaseOutput};

use super::CmdResult;

#[derive(Args)]
pub struct ReleaseArgs {
    /// Release file, relative to the repository root unless absolute
    #[arg(long, value_name = "PATH")]
    file: Option<String>,

    /// Directory inside the checkout (defaults to the current directory)
    #[arg(long, value_name = "DIR")]
    dir: Option<String>,
}

#[derive(Serialize)]
#[serde(tag = "command")]
pub enum ReleaseCommandOutput {
    #[serde(rename = "release")]
    Release {
        #[serde(flatten)]
        release: ReleaseOutput,
    },
}

pub fn run(args: ReleaseArgs, _global: &crate::commands::GlobalArgs) -> CmdResult<ReleaseCommandOutput> {
    let env = Environment::capture()?;
    let defaults = defaults::load_defaults();

    let dir = match args.dir.as_deref() {
        Some(dir) => env.resolve_path(dir),
        None => env.cwd.clone(),
    };

    let release = release::update(&dir, args.file.as_deref(), &defaults, &SystemRunner)?;
    Ok((ReleaseCommandOutput::Release { release }, 0))
}
