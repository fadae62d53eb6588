// src/config/loader.rs

use std::fs;
use std::path::Path;

use crate::config::model::{EngineConfig, RawConfigFile};
use crate::errors::Result;

/// Read and deserialize a config file without validating it.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<RawConfigFile> {
    let contents = fs::read_to_string(path.as_ref())?;
    let config: RawConfigFile = toml::from_str(&contents)?;
    Ok(config)
}

/// Read a config file and validate it.
pub fn load_and_validate(path: impl AsRef<Path>) -> Result<EngineConfig> {
    let raw = load_from_path(path)?;
    EngineConfig::try_from(raw)
}

/// Load from `path` when given, otherwise fall back to built-in defaults.
pub fn load_or_default(path: Option<&Path>) -> Result<EngineConfig> {
    match path {
        Some(path) => load_and_validate(path),
        None => Ok(EngineConfig::default()),
    }
}
