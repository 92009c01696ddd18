use clap::{Parser, Subcommand};

use arthur_ops::container::Action;
use arthur_ops::{args, signals};
use commands::GlobalArgs;

#[derive(Debug, Clone, Copy)]
enum ResponseMode {
    Json,
    InteractivePassthrough,
}

mod commands;
mod output;
mod tty;

use commands::{config, container, pipelines, provision, release};

const VERSION: &str = env!("CARGO_PKG_VERSION");
const BIN_NAME: &str = "arthur-ops";

#[derive(Parser)]
#[command(name = "arthur-ops")]
#[command(version = VERSION)]
#[command(about = "Deployment and operations helper for the arthur ETL warehouse")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create, define and activate an extract pipeline
    Provision(provision::ProvisionArgs),
    /// Write the release marker file for the current checkout
    Release(release::ReleaseArgs),
    /// Run an arthur action inside the ETL container
    Container(container::ContainerArgs),
    /// List the project's data pipelines
    Pipelines(pipelines::PipelinesArgs),
    /// Manage arthur-ops configuration
    Config(config::ConfigArgs),
}

fn response_mode(command: &Commands) -> ResponseMode {
    match command {
        Commands::Container(args) if container::is_passthrough(args) => {
            ResponseMode::InteractivePassthrough
        }
        _ => ResponseMode::Json,
    }
}

/// `run_arthur.sh ARGS` behaves like `arthur-ops container run ARGS`.
fn normalize_args(raw: Vec<String>) -> Vec<String> {
    let expansions: Vec<[&str; 2]> = Action::ALL
        .iter()
        .map(|action| ["container", action.as_str()])
        .collect();
    let aliases: Vec<(&str, &[&str])> = Action::ALL
        .iter()
        .zip(expansions.iter())
        .map(|(action, expansion)| (action.script_name(), &expansion[..]))
        .collect();

    args::normalize_invocation_alias(raw, BIN_NAME, &aliases)
}

fn main() -> std::process::ExitCode {
    if let Err(err) = signals::install() {
        let _ = output::print_json_result(Err(err));
        return std::process::ExitCode::from(1);
    }

    let cli = match Cli::try_parse_from(normalize_args(std::env::args().collect())) {
        Ok(cli) => cli,
        Err(e) => {
            let _ = e.print();
            let code = if e.use_stderr() { 1 } else { 0 };
            return std::process::ExitCode::from(code);
        }
    };

    let mode = response_mode(&cli.command);

    if let Commands::Container(args) = &cli.command {
        if container::needs_tty(args) && !tty::require_tty_for_interactive() {
            let err = arthur_ops::Error::validation_invalid_argument(
                "tty",
                "This command requires an interactive TTY",
                None,
            )
            .with_hint("Use --dry-run to print the docker command instead");
            let _ = output::print_json_result(Err(err));
            return std::process::ExitCode::from(1);
        }
    }

    let global = GlobalArgs {};
    let (json_result, exit_code) = commands::run_json(cli.command, &global);

    match mode {
        ResponseMode::Json => {
            let _ = output::print_json_result(json_result);
        }
        ResponseMode::InteractivePassthrough => {
            // The container already wrote to the terminal; only failures to
            // launch it are reported.
            if json_result.is_err() {
                let _ = output::print_json_result(json_result);
            }
        }
    }

    std::process::ExitCode::from(exit_code_to_u8(exit_code))
}

fn exit_code_to_u8(code: i32) -> u8 {
    if code <= 0 {
        0
    } else if code >= 255 {
        255
    } else {
        code as u8
    }
}
