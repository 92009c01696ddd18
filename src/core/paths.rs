use crate::error::{Error, Result};
use std::env;
use std::path::PathBuf;

/// Base arthur-ops config directory (~/.config/arthur-ops/)
pub fn arthur_ops() -> Result<PathBuf> {
    let home = env::var("HOME").map_err(|_| {
        Error::internal_unexpected("HOME environment variable not set".to_string())
    })?;
    Ok(PathBuf::from(home).join(".config").join("arthur-ops"))
}

/// Global arthur-ops.json config file path
pub fn arthur_ops_json() -> Result<PathBuf> {
    Ok(arthur_ops()?.join("arthur-ops.json"))
}
