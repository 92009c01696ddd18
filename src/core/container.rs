//! Containerized actions: fixed `docker run` templates for working with
//! the ETL image against a local config directory.

use std::fs;
use std::path::Path;

use serde::Serialize;

use crate::command::{CommandRunner, Invocation};
use crate::defaults::{ContainerConfig, Defaults};
use crate::environment::{Environment, AWS_PROFILE_VAR, CONFIG_DIR_VAR, DEFAULT_PREFIX_VAR};
use crate::error::{Error, Result};
use crate::template::{self, TemplateVars};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Action {
    Run,
    RunRo,
    Deploy,
    Upload,
    Validate,
}

impl Action {
    pub const ALL: [Action; 5] = [
        Action::Run,
        Action::RunRo,
        Action::Deploy,
        Action::Upload,
        Action::Validate,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Run => "run",
            Action::RunRo => "run-ro",
            Action::Deploy => "deploy",
            Action::Upload => "upload",
            Action::Validate => "validate",
        }
    }

    /// Script name the binary may be linked as to run this action directly.
    pub fn script_name(&self) -> &'static str {
        match self {
            Action::Run => "run_arthur",
            Action::RunRo => "run-ro_arthur",
            Action::Deploy => "deploy_arthur",
            Action::Upload => "upload_env",
            Action::Validate => "validate_env",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|a| a.as_str() == name)
    }

    fn is_interactive(&self) -> bool {
        matches!(self, Action::Run | Action::RunRo)
    }
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone)]
pub struct ContainerRequest {
    pub action: Action,
    pub profile: Option<String>,
    pub tag: Option<String>,
    /// Mount the config directory read-write.
    pub writable_config: bool,
    pub config_dir: Option<String>,
    pub target_env: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ContainerPlan {
    pub requested: Action,
    pub action: Action,
    pub downgraded: bool,
    pub config_dir: String,
    pub target_env: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile: Option<String>,
    pub image: String,
    pub command_line: String,
    #[serde(skip)]
    pub invocation: Invocation,
}

/// Whether `dir` is a checkout of the ETL sources: the marker file exists
/// and mentions the marker text.
pub fn is_source_checkout(dir: &Path, marker_file: &str, marker_text: &str) -> bool {
    fs::read_to_string(dir.join(marker_file))
        .map(|content| content.contains(marker_text))
        .unwrap_or(false)
}

/// `run` needs the sources to mount; without them it becomes `run-ro`.
pub fn effective_action(requested: Action, in_source_checkout: bool) -> Action {
    match requested {
        Action::Run if !in_source_checkout => Action::RunRo,
        other => other,
    }
}

/// Resolve inputs and build the `docker run` invocation for an action.
pub fn plan(request: &ContainerRequest, env: &Environment, defaults: &Defaults) -> Result<ContainerPlan> {
    let settings = &defaults.container;

    let config_dir = env.resolve_config_dir(request.config_dir.as_deref(), &defaults.config_dir);
    if !config_dir.is_dir() {
        return Err(Error::preflight_config_dir_missing(
            config_dir.display().to_string(),
        ));
    }
    let config_dir = fs::canonicalize(&config_dir).map_err(|e| {
        Error::internal_io(e.to_string(), Some(format!("resolve {}", config_dir.display())))
    })?;
    let config_name = config_dir
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .ok_or_else(|| {
            Error::validation_invalid_argument(
                "config_dir",
                "Config directory must not be the filesystem root",
                None,
            )
        })?;

    let target_env = env.resolve_prefix(request.target_env.as_deref())?;
    let profile = env.resolve_profile(request.profile.as_deref());
    let tag = request.tag.as_deref().unwrap_or(settings.tag.as_str());
    let image = format!("{}:{}", settings.image, tag);

    let in_checkout = is_source_checkout(
        &env.cwd,
        &settings.source_marker_file,
        &settings.source_marker_text,
    );
    let action = effective_action(request.action, in_checkout);
    if action != request.action {
        log_status!(
            "container",
            "Not in a source checkout, using {} instead of {}",
            action,
            request.action
        );
    }

    let container_config = format!("{}/{}", settings.config_mount_root, config_name);
    let aws_dir = env.require_home()?.join(".aws");

    let mut args = vec!["run".to_string(), "--rm".to_string()];
    if action.is_interactive() {
        args.extend(["--interactive".to_string(), "--tty".to_string()]);
    }

    let config_mode = if request.writable_config { "" } else { ":ro" };
    args.extend(volume(&config_dir.display().to_string(), &container_config, config_mode));
    args.extend(volume(&aws_dir.display().to_string(), &settings.aws_mount, ""));
    if action == Action::Run {
        args.extend(volume(&env.cwd.display().to_string(), &settings.source_mount, ""));
    }

    args.extend(env_flag(DEFAULT_PREFIX_VAR, &target_env));
    args.extend(env_flag(CONFIG_DIR_VAR, &container_config));
    if let Some(profile) = &profile {
        args.extend(env_flag(AWS_PROFILE_VAR, profile));
    }

    args.push(image.clone());
    args.extend(template::render_all(
        entry_command(settings, action),
        &[(TemplateVars::TARGET_ENV, target_env.as_str())],
    ));

    let invocation = Invocation::new(defaults.tools.docker.as_str()).args(args);

    Ok(ContainerPlan {
        requested: request.action,
        action,
        downgraded: action != request.action,
        config_dir: config_dir.display().to_string(),
        target_env,
        profile,
        image,
        command_line: invocation.command_line(),
        invocation,
    })
}

/// Run the planned container with inherited stdio; returns its exit code.
pub fn dispatch(plan: &ContainerPlan, runner: &dyn CommandRunner) -> Result<i32> {
    log_status!("container", "{}", plan.command_line);
    runner.interactive(&plan.invocation)
}

fn entry_command(settings: &ContainerConfig, action: Action) -> &[String] {
    match action {
        Action::Run | Action::RunRo => &settings.entry.run,
        Action::Deploy => &settings.entry.deploy,
        Action::Upload => &settings.entry.upload,
        Action::Validate => &settings.entry.validate,
    }
}

fn volume(host: &str, container: &str, mode: &str) -> [String; 2] {
    ["--volume".to_string(), format!("{}:{}{}", host, container, mode)]
}

fn env_flag(key: &str, value: &str) -> [String; 2] {
    ["--env".to_string(), format!("{}={}", key, value)]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn action_names_round_trip() {
        for action in Action::ALL {
            assert_eq!(Action::from_name(action.as_str()), Some(action));
        }
        assert!(Action::from_name("shell").is_none());
    }

    #[test]
    fn only_run_is_downgraded_outside_checkout() {
        assert_eq!(effective_action(Action::Run, false), Action::RunRo);
        assert_eq!(effective_action(Action::Run, true), Action::Run);
        for action in [Action::RunRo, Action::Deploy, Action::Upload, Action::Validate] {
            assert_eq!(effective_action(action, false), action);
            assert_eq!(effective_action(action, true), action);
        }
    }
}
