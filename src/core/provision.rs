//! Extract pipeline provisioning.
//!
//! One straight pass: validate input, check the local config directory,
//! check the bootstrap object in S3, render the definition, then create,
//! define and activate the pipeline. Every remote mutation happens after
//! all preflight checks have passed. Nothing is retried.

use std::path::Path;

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use serde_json_path::JsonPath;

use crate::command::{self, CommandRunner, Invocation};
use crate::defaults::Defaults;
use crate::environment::{Environment, AWS_PROFILE_VAR, CONFIG_DIR_VAR};
use crate::error::{Error, Result};
use crate::io::ScopedTempFile;
use crate::template::{self, TemplateVars};
use crate::validation;

pub const USAGE: &str =
    "arthur-ops provision [--prefix PREFIX] [--config DIR] [--profile NAME] EXTRACT_ARGS...";

/// UTC timestamp format shared by the pipeline name and its start parameter.
pub const START_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

const PIPELINE_ID_PATH: &str = "$.pipelineId";

#[derive(Debug, Clone, Default)]
pub struct ProvisionRequest {
    pub extract_args: Vec<String>,
    pub prefix: Option<String>,
    pub config_dir: Option<String>,
    pub profile: Option<String>,
    /// Delete the pipeline again if defining or activating it fails.
    pub cleanup_on_failure: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProvisionOutput {
    pub pipeline_id: String,
    pub name: String,
    pub prefix: String,
    pub bucket: String,
    pub start_time: String,
    pub extract_arguments: String,
    pub monitor_command: String,
}

/// Join extract arguments into the single parameter value the pipeline expects.
pub fn join_extract_args(args: &[String]) -> String {
    args.join(",")
}

/// Pull `pipelineId` out of a create-pipeline response.
///
/// A response that is empty, not JSON, or lacks a non-empty id means the
/// create call did not take effect even though the command succeeded.
pub fn extract_pipeline_id(response: &str) -> Result<String> {
    let value: Value =
        serde_json::from_str(response).map_err(|_| Error::pipeline_missing_id(response.trim()))?;
    let path = JsonPath::parse(PIPELINE_ID_PATH)
        .map_err(|e| Error::internal_unexpected(format!("invalid JSON path: {}", e)))?;

    match path.query(&value).exactly_one() {
        Ok(Value::String(id)) if !id.trim().is_empty() => Ok(id.trim().to_string()),
        _ => Err(Error::pipeline_missing_id(response.trim())),
    }
}

pub fn run(
    request: &ProvisionRequest,
    env: &Environment,
    defaults: &Defaults,
    runner: &dyn CommandRunner,
) -> Result<ProvisionOutput> {
    run_at(request, env, defaults, runner, Utc::now())
}

/// Provision with an explicit start time.
pub fn run_at(
    request: &ProvisionRequest,
    env: &Environment,
    defaults: &Defaults,
    runner: &dyn CommandRunner,
    now: DateTime<Utc>,
) -> Result<ProvisionOutput> {
    let settings = &defaults.provision;

    let args = validation::require_args(&request.extract_args, "extract_args", USAGE)?;
    let extract_arguments = join_extract_args(args);
    let prefix = env.resolve_prefix(request.prefix.as_deref())?;

    let config_dir = env.resolve_config_dir(request.config_dir.as_deref(), &defaults.config_dir);
    if !config_dir.is_dir() {
        return Err(Error::preflight_config_dir_missing(
            config_dir.display().to_string(),
        ));
    }

    let aws = AwsCli {
        program: &defaults.tools.aws,
        profile: env.resolve_profile(request.profile.as_deref()),
    };
    let arthur = ArthurCli {
        program: &defaults.tools.arthur,
        config_dir: &config_dir,
    };

    let bucket = lookup_bucket(runner, &arthur, &settings.bucket_setting, &prefix)?;
    check_bootstrap(runner, &aws, &bucket, &prefix, &settings.bootstrap_object)?;

    let start_time = now.format(START_TIME_FORMAT).to_string();
    let name = template::render(
        &settings.name_template,
        &[
            (TemplateVars::PREFIX, prefix.as_str()),
            (TemplateVars::START_TIME, start_time.as_str()),
        ],
    );

    let user = env.user_name();
    let definition = ScopedTempFile::create(
        &env.temp_dir,
        &format!("{}_definition", settings.temp_file_prefix),
        &user,
        env.pid,
        "json",
    )?;
    let id_file = ScopedTempFile::create(
        &env.temp_dir,
        &format!("{}_id", settings.temp_file_prefix),
        &user,
        env.pid,
        "json",
    )?;

    log_status!("provision", "Rendering '{}' for prefix '{}'", settings.template_name, prefix);
    let rendered = command::run_checked(
        runner,
        &arthur
            .invocation()
            .args(["render_template", "--prefix", prefix.as_str()])
            .arg(settings.template_name.as_str()),
    )?;
    definition.write(&rendered)?;

    log_status!("provision", "Creating pipeline \"{}\"", name);
    let mut create = aws.invocation().args([
        "datapipeline",
        "create-pipeline",
        "--unique-id",
        settings.unique_id.as_str(),
        "--name",
        name.as_str(),
        "--tags",
    ]);
    create = create.args(settings.tags.iter().map(|tag| tag.to_cli_arg()));
    let response = command::run_checked(runner, &create)?;
    id_file.write(&response)?;

    let pipeline_id = extract_pipeline_id(&id_file.read()?)?;
    log_status!("provision", "Created pipeline {}", pipeline_id);

    let configured = submit_definition(
        runner,
        &aws,
        &pipeline_id,
        definition.path(),
        &[
            (settings.start_time_parameter.as_str(), start_time.as_str()),
            (settings.arguments_parameter.as_str(), extract_arguments.as_str()),
        ],
    )
    .and_then(|_| activate(runner, &aws, &pipeline_id));

    if let Err(err) = configured {
        let hint = if request.cleanup_on_failure && delete_pipeline(runner, &aws, &pipeline_id) {
            format!("Pipeline {} was deleted after the failure", pipeline_id)
        } else {
            format!(
                "Pipeline {} was created but not activated; delete it with 'aws datapipeline delete-pipeline --pipeline-id {}'",
                pipeline_id, pipeline_id
            )
        };
        return Err(err.with_hint(hint));
    }

    let monitor_command = template::render(
        &settings.monitor_command,
        &[(TemplateVars::PIPELINE_ID, pipeline_id.as_str())],
    );
    log_status!("provision", "Activated {}; monitor with: {}", pipeline_id, monitor_command);

    Ok(ProvisionOutput {
        pipeline_id,
        name,
        prefix,
        bucket,
        start_time,
        extract_arguments,
        monitor_command,
    })
}

struct AwsCli<'a> {
    program: &'a str,
    profile: Option<String>,
}

impl AwsCli<'_> {
    fn invocation(&self) -> Invocation {
        let inv = Invocation::new(self.program);
        match &self.profile {
            Some(profile) => inv.env(AWS_PROFILE_VAR, profile.as_str()),
            None => inv,
        }
    }
}

struct ArthurCli<'a> {
    program: &'a str,
    config_dir: &'a Path,
}

impl ArthurCli<'_> {
    fn invocation(&self) -> Invocation {
        Invocation::new(self.program).env(CONFIG_DIR_VAR, self.config_dir.display().to_string())
    }
}

fn lookup_bucket(
    runner: &dyn CommandRunner,
    arthur: &ArthurCli<'_>,
    setting: &str,
    prefix: &str,
) -> Result<String> {
    let hint = format!(
        "Check whether the bucket and folder \"{}\" are configured in {}",
        prefix,
        arthur.config_dir.display()
    );

    let stdout = command::run_trimmed(runner, &arthur.invocation().args(["show_value", setting]))
        .map_err(|e| e.with_hint(hint.clone()))?;

    if stdout.is_empty() {
        return Err(
            Error::config_invalid_value(setting, None, "setting has no value").with_hint(hint),
        );
    }
    Ok(stdout)
}

fn check_bootstrap(
    runner: &dyn CommandRunner,
    aws: &AwsCli<'_>,
    bucket: &str,
    prefix: &str,
    object: &str,
) -> Result<()> {
    let uri = format!("s3://{}/{}/{}", bucket, prefix, object);
    log_status!("provision", "Checking for {}", uri);

    let found = command::succeeded(runner, &aws.invocation().args(["s3", "ls", uri.as_str()]))?;
    if found {
        Ok(())
    } else {
        Err(Error::preflight_bootstrap_missing(bucket, prefix, uri))
    }
}

fn submit_definition(
    runner: &dyn CommandRunner,
    aws: &AwsCli<'_>,
    pipeline_id: &str,
    definition: &Path,
    parameters: &[(&str, &str)],
) -> Result<()> {
    log_status!("provision", "Uploading definition for {}", pipeline_id);
    let file_uri = format!("file://{}", definition.display());

    let inv = aws
        .invocation()
        .args([
            "datapipeline",
            "put-pipeline-definition",
            "--pipeline-definition",
            file_uri.as_str(),
            "--parameter-values",
        ])
        .args(parameters.iter().map(|(key, value)| format!("{}={}", key, value)))
        .args(["--pipeline-id", pipeline_id]);

    command::run_checked(runner, &inv).map(|_| ())
}

fn activate(runner: &dyn CommandRunner, aws: &AwsCli<'_>, pipeline_id: &str) -> Result<()> {
    log_status!("provision", "Activating {}", pipeline_id);
    let inv = aws
        .invocation()
        .args(["datapipeline", "activate-pipeline", "--pipeline-id", pipeline_id]);
    command::run_checked(runner, &inv).map(|_| ())
}

/// Compensating delete; its own failure is reported but does not replace
/// the error that triggered it.
fn delete_pipeline(runner: &dyn CommandRunner, aws: &AwsCli<'_>, pipeline_id: &str) -> bool {
    log_status!("provision", "Deleting unconfigured pipeline {}", pipeline_id);
    let inv = aws
        .invocation()
        .args(["datapipeline", "delete-pipeline", "--pipeline-id", pipeline_id]);
    match command::run_checked(runner, &inv) {
        Ok(_) => true,
        Err(err) => {
            log_status!("provision", "Failed to delete {}: {}", pipeline_id, err);
            false
        }
    }
}
