use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fs;

use crate::paths;

/// Root configuration structure for arthur-ops.json
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ArthurOpsConfig {
    #[serde(default)]
    pub defaults: Defaults,
}

/// All configurable defaults that can be overridden via arthur-ops.json
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Defaults {
    /// Config directory used when neither a flag nor DATA_WAREHOUSE_CONFIG names one
    #[serde(default = "default_config_dir")]
    pub config_dir: String,

    #[serde(default)]
    pub tools: ToolsConfig,

    #[serde(default)]
    pub provision: ProvisionConfig,

    #[serde(default)]
    pub pipelines: PipelinesConfig,

    #[serde(default)]
    pub container: ContainerConfig,

    #[serde(default)]
    pub release: ReleaseConfig,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            config_dir: default_config_dir(),
            tools: ToolsConfig::default(),
            provision: ProvisionConfig::default(),
            pipelines: PipelinesConfig::default(),
            container: ContainerConfig::default(),
            release: ReleaseConfig::default(),
        }
    }
}

/// Executables for the external collaborators
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolsConfig {
    pub aws: String,
    pub arthur: String,
    pub docker: String,
    pub git: String,
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            aws: "aws".to_string(),
            arthur: "arthur.py".to_string(),
            docker: "docker".to_string(),
            git: "git".to_string(),
        }
    }
}

/// AWS resource tag, in the `{key, value}` shape the AWS CLI uses
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceTag {
    pub key: String,
    pub value: String,
}

impl ResourceTag {
    pub fn new(key: &str, value: &str) -> Self {
        Self {
            key: key.to_string(),
            value: value.to_string(),
        }
    }

    /// Shorthand syntax accepted by `aws ... --tags`
    pub fn to_cli_arg(&self) -> String {
        format!("key={},value={}", self.key, self.value)
    }
}

/// Constants for creating the extract pipeline
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProvisionConfig {
    pub template_name: String,
    pub unique_id: String,
    /// Display name; supports {{prefix}} and {{start_time}}
    pub name_template: String,
    pub bucket_setting: String,
    /// Bootstrap object key below `<bucket>/<prefix>/`
    pub bootstrap_object: String,
    pub tags: Vec<ResourceTag>,
    pub start_time_parameter: String,
    pub arguments_parameter: String,
    /// Follow-up command shown after activation; supports {{pipeline_id}}
    pub monitor_command: String,
    pub temp_file_prefix: String,
}

impl Default for ProvisionConfig {
    fn default() -> Self {
        Self {
            template_name: "extract_pipeline".to_string(),
            unique_id: "extract-etl-pipeline".to_string(),
            name_template: "ETL Extract Pipeline ({{prefix}} @ {{start_time}})".to_string(),
            bucket_setting: "object_store.s3.bucket_name".to_string(),
            bootstrap_object: "current/bin/bootstrap.sh".to_string(),
            tags: default_tags(),
            start_time_parameter: "myStartDateTime".to_string(),
            arguments_parameter: "myExtractArguments".to_string(),
            monitor_command: "arthur-ops pipelines {{pipeline_id}}".to_string(),
            temp_file_prefix: "pipeline".to_string(),
        }
    }
}

/// Selection of pipelines that belong to this project
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelinesConfig {
    pub project_tag: ResourceTag,
    pub describe_chunk_size: usize,
}

impl Default for PipelinesConfig {
    fn default() -> Self {
        Self {
            project_tag: ResourceTag::new("user:project", "data-warehouse"),
            describe_chunk_size: 25,
        }
    }
}

/// Entry command per container action; `run-ro` shares `run`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ContainerEntryCommands {
    pub run: Vec<String>,
    pub deploy: Vec<String>,
    pub upload: Vec<String>,
    pub validate: Vec<String>,
}

impl Default for ContainerEntryCommands {
    fn default() -> Self {
        Self {
            run: strings(&["/bin/bash", "--login"]),
            deploy: strings(&["upload_env.sh", "-y", "{{target_env}}"]),
            upload: strings(&["arthur.py", "sync", "--force", "--deploy", "--prefix", "{{target_env}}"]),
            validate: strings(&["arthur.py", "validate", "--prefix", "{{target_env}}", "--keep-going"]),
        }
    }
}

/// Docker image and bind-mount layout for container actions
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ContainerConfig {
    pub image: String,
    pub tag: String,
    pub config_mount_root: String,
    pub source_mount: String,
    pub aws_mount: String,
    pub source_marker_file: String,
    pub source_marker_text: String,
    pub entry: ContainerEntryCommands,
}

impl Default for ContainerConfig {
    fn default() -> Self {
        Self {
            image: "arthur-redshift-etl".to_string(),
            tag: "latest".to_string(),
            config_mount_root: "/opt/data-warehouse".to_string(),
            source_mount: "/opt/src/arthur-redshift-etl".to_string(),
            aws_mount: "/root/.aws".to_string(),
            source_marker_file: "setup.py".to_string(),
            source_marker_text: "redshift_etl".to_string(),
            entry: ContainerEntryCommands::default(),
        }
    }
}

/// Location of the release marker file
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReleaseConfig {
    /// Relative paths resolve against the repository toplevel
    pub file: String,
}

impl Default for ReleaseConfig {
    fn default() -> Self {
        Self {
            file: "python/etl/config/release.txt".to_string(),
        }
    }
}

fn default_config_dir() -> String {
    "config".to_string()
}

fn default_tags() -> Vec<ResourceTag> {
    vec![
        ResourceTag::new("user:project", "data-warehouse"),
        ResourceTag::new("user:sub-project", "dw-etl"),
    ]
}

fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| v.to_string()).collect()
}

// =============================================================================
// Loading functions
// =============================================================================

/// Load defaults, merging file config with built-in defaults.
/// If arthur-ops.json is missing or invalid, silently returns built-in defaults.
pub fn load_defaults() -> Defaults {
    load_config().defaults
}

/// Load the full arthur-ops.json config, falling back to defaults on any error.
pub fn load_config() -> ArthurOpsConfig {
    load_config_from_file().unwrap_or_default()
}

fn load_config_from_file() -> crate::Result<ArthurOpsConfig> {
    let path = paths::arthur_ops_json()?;

    if !path.exists() {
        return Err(crate::Error::other("arthur-ops.json not found"));
    }

    let content = fs::read_to_string(&path).map_err(|e| {
        crate::Error::internal_io(e.to_string(), Some(format!("read {}", path.display())))
    })?;

    parse_config(&content)
        .map_err(|e| crate::Error::config_invalid_json(path.display().to_string(), e))
}

fn parse_config(content: &str) -> serde_json::Result<ArthurOpsConfig> {
    serde_json::from_str(content)
}

/// Save config to arthur-ops.json file (creates if missing).
pub fn save_config(config: &ArthurOpsConfig) -> crate::Result<()> {
    let path = paths::arthur_ops_json()?;

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| {
            crate::Error::internal_io(e.to_string(), Some(format!("create {}", parent.display())))
        })?;
    }

    let content = serde_json::to_string_pretty(config).map_err(|e| {
        crate::Error::internal_json(e.to_string(), Some("serialize arthur-ops.json".to_string()))
    })?;

    crate::io::write_file_atomic(&path, &content, "write arthur-ops.json")
}

/// Delete arthur-ops.json file (reset to defaults)
pub fn reset_config() -> crate::Result<bool> {
    let path = paths::arthur_ops_json()?;

    if path.exists() {
        fs::remove_file(&path).map_err(|e| {
            crate::Error::internal_io(e.to_string(), Some(format!("delete {}", path.display())))
        })?;
        Ok(true)
    } else {
        Ok(false)
    }
}

/// Get the path to arthur-ops.json (for display purposes)
pub fn config_path() -> crate::Result<String> {
    Ok(paths::arthur_ops_json()?.display().to_string())
}

/// Whether arthur-ops.json exists
pub fn config_exists() -> bool {
    paths::arthur_ops_json()
        .map(|p| p.exists())
        .unwrap_or(false)
}

/// Get built-in defaults (ignoring any file config)
pub fn builtin_defaults() -> Defaults {
    Defaults::default()
}

// =============================================================================
// JSON pointer edits
// =============================================================================

/// Set the value at a JSON pointer (e.g. `/defaults/container/tag`),
/// creating intermediate objects as needed. The result must still parse
/// as a config.
pub fn set_pointer(config: &ArthurOpsConfig, pointer: &str, value: Value) -> crate::Result<ArthurOpsConfig> {
    let (parent_ptr, key) = split_pointer(pointer)?;
    let mut root = to_json(config)?;

    let mut parent = &mut root;
    for token in parent_ptr.split('/').filter(|t| !t.is_empty()) {
        let object = parent.as_object_mut().ok_or_else(|| not_an_object(pointer))?;
        parent = object
            .entry(unescape_token(token))
            .or_insert_with(|| Value::Object(Map::new()));
    }
    parent
        .as_object_mut()
        .ok_or_else(|| not_an_object(pointer))?
        .insert(key, value);

    from_json(root)
}

/// Remove the value at a JSON pointer so the built-in default applies again.
pub fn remove_pointer(config: &ArthurOpsConfig, pointer: &str) -> crate::Result<ArthurOpsConfig> {
    let (parent_ptr, key) = split_pointer(pointer)?;
    let mut root = to_json(config)?;

    let removed = root
        .pointer_mut(&parent_ptr)
        .and_then(Value::as_object_mut)
        .and_then(|object| object.remove(&key));
    if removed.is_none() {
        return Err(crate::Error::validation_invalid_argument(
            "pointer",
            format!("No value at {}", pointer),
            None,
        ));
    }

    from_json(root)
}

fn split_pointer(pointer: &str) -> crate::Result<(String, String)> {
    if !pointer.starts_with('/') || pointer == "/" {
        return Err(crate::Error::validation_invalid_argument(
            "pointer",
            format!("JSON pointer must start with '/' and name a key: {}", pointer),
            None,
        ));
    }
    let (parent, token) = pointer.rsplit_once('/').unwrap_or(("", pointer));
    Ok((parent.to_string(), unescape_token(token)))
}

fn unescape_token(token: &str) -> String {
    token.replace("~1", "/").replace("~0", "~")
}

fn not_an_object(pointer: &str) -> crate::Error {
    crate::Error::validation_invalid_argument(
        "pointer",
        format!("{} does not point into an object", pointer),
        None,
    )
}

fn to_json(config: &ArthurOpsConfig) -> crate::Result<Value> {
    serde_json::to_value(config).map_err(|e| {
        crate::Error::internal_json(e.to_string(), Some("serialize arthur-ops.json".to_string()))
    })
}

fn from_json(value: Value) -> crate::Result<ArthurOpsConfig> {
    serde_json::from_value(value).map_err(|e| {
        crate::Error::validation_invalid_json(e, Some("apply config change".to_string()), None)
    })
}
