pub type CmdResult<T> = arthur_ops::Result<(T, i32)>;

pub(crate) struct GlobalArgs {}

pub mod config;
pub mod container;
pub mod pipelines;
pub mod provision;
pub mod release;

/// Dispatch a command to its handler and map result to JSON.
macro_rules! dispatch {
    ($args:expr, $global:expr, $module:ident) => {
        crate::output::map_cmd_result_to_json($module::run($args, $global))
    };
}

pub(crate) fn run_json(
    command: crate::Commands,
    global: &GlobalArgs,
) -> (arthur_ops::Result<serde_json::Value>, i32) {
    crate::tty::status("arthur-ops is working...");

    match command {
        crate::Commands::Provision(args) => dispatch!(args, global, provision),
        crate::Commands::Release(args) => dispatch!(args, global, release),
        crate::Commands::Container(args) => dispatch!(args, global, container),
        crate::Commands::Pipelines(args) => dispatch!(args, global, pipelines),
        crate::Commands::Config(args) => dispatch!(args, global, config),
    }
}
