//! Snapshot of the process environment.
//!
//! Captured once by the CLI layer and passed explicitly into each procedure,
//! so nothing below the command handlers reads environment variables or the
//! working directory on its own.

use std::env;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::validation::first_non_empty;

pub const CONFIG_DIR_VAR: &str = "DATA_WAREHOUSE_CONFIG";
pub const DEFAULT_PREFIX_VAR: &str = "ARTHUR_DEFAULT_PREFIX";
pub const AWS_PROFILE_VAR: &str = "AWS_PROFILE";
pub const AWS_DEFAULT_PROFILE_VAR: &str = "AWS_DEFAULT_PROFILE";

#[derive(Debug, Clone, Default)]
pub struct Environment {
    pub cwd: PathBuf,
    pub home: Option<PathBuf>,
    pub temp_dir: PathBuf,
    pub pid: u32,
    pub user: Option<String>,
    pub logname: Option<String>,
    pub default_prefix: Option<String>,
    pub config_dir: Option<String>,
    pub aws_profile: Option<String>,
    pub aws_default_profile: Option<String>,
}

impl Environment {
    pub fn capture() -> Result<Self> {
        let cwd = env::current_dir().map_err(|e| {
            Error::internal_io(e.to_string(), Some("read current directory".to_string()))
        })?;

        Ok(Self {
            cwd,
            home: env::var_os("HOME").map(PathBuf::from),
            temp_dir: env::temp_dir(),
            pid: std::process::id(),
            user: env::var("USER").ok(),
            logname: env::var("LOGNAME").ok(),
            default_prefix: env::var(DEFAULT_PREFIX_VAR).ok(),
            config_dir: env::var(CONFIG_DIR_VAR).ok(),
            aws_profile: env::var(AWS_PROFILE_VAR).ok(),
            aws_default_profile: env::var(AWS_DEFAULT_PROFILE_VAR).ok(),
        })
    }

    /// Login name, used to qualify temp file names.
    pub fn user_name(&self) -> String {
        first_non_empty([self.user.as_deref(), self.logname.as_deref()])
            .unwrap_or_else(|| "unknown".to_string())
    }

    /// Target environment: flag, then ARTHUR_DEFAULT_PREFIX, then the login name.
    pub fn resolve_prefix(&self, flag: Option<&str>) -> Result<String> {
        first_non_empty([
            flag,
            self.default_prefix.as_deref(),
            self.user.as_deref(),
            self.logname.as_deref(),
        ])
        .ok_or_else(|| {
            Error::validation_missing_argument(vec!["prefix".to_string()]).with_hint(format!(
                "Pass --prefix or set {} to choose the target environment",
                DEFAULT_PREFIX_VAR
            ))
        })
    }

    /// Config directory: flag, then DATA_WAREHOUSE_CONFIG, then the configured default.
    /// Relative paths resolve against the captured working directory.
    pub fn resolve_config_dir(&self, flag: Option<&str>, fallback: &str) -> PathBuf {
        let raw = first_non_empty([flag, self.config_dir.as_deref()])
            .unwrap_or_else(|| fallback.to_string());
        self.resolve_path(&raw)
    }

    /// AWS profile: flag, then AWS_PROFILE, then AWS_DEFAULT_PROFILE.
    pub fn resolve_profile(&self, flag: Option<&str>) -> Option<String> {
        first_non_empty([
            flag,
            self.aws_profile.as_deref(),
            self.aws_default_profile.as_deref(),
        ])
    }

    /// Expand a leading `~` and anchor relative paths at the working directory.
    pub fn resolve_path(&self, raw: &str) -> PathBuf {
        let expanded = shellexpand::tilde_with_context(raw, || {
            self.home.as_ref().map(|h| h.to_string_lossy().to_string())
        });
        let path = Path::new(expanded.as_ref());
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.cwd.join(path)
        }
    }

    pub fn require_home(&self) -> Result<&Path> {
        self.home.as_deref().ok_or_else(|| {
            Error::internal_unexpected("HOME environment variable not set".to_string())
        })
    }
}
