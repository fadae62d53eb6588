// src/config/validate.rs

use crate::config::model::{EngineConfig, EngineSection, PtySection, RawConfigFile};
use crate::errors::{EngineError, Result};

impl TryFrom<RawConfigFile> for EngineConfig {
    type Error = EngineError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        validate_engine_section(&raw.engine)?;
        validate_pty_section(&raw.pty)?;
        Ok(EngineConfig::new_unchecked(raw.engine, raw.pty))
    }
}

fn validate_engine_section(engine: &EngineSection) -> Result<()> {
    if engine.command.trim().is_empty() {
        return Err(EngineError::ConfigError(
            "[engine].command must not be empty".to_string(),
        ));
    }

    if engine.command.chars().any(char::is_whitespace) {
        return Err(EngineError::ConfigError(format!(
            "[engine].command must be a single executable name, got {:?}",
            engine.command
        )));
    }

    Ok(())
}

fn validate_pty_section(pty: &PtySection) -> Result<()> {
    if pty.rows == 0 || pty.cols == 0 {
        return Err(EngineError::ConfigError(format!(
            "[pty] rows and cols must be >= 1 (got {}x{})",
            pty.rows, pty.cols
        )));
    }
    Ok(())
}
