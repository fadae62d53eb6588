// src/errors.rs

//! Crate-wide error type and result alias.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// The child process could not be started (missing executable, bad
    /// working directory, pipe setup).
    #[error("failed to start `{command}`: {message}")]
    Spawn { command: String, message: String },

    #[error("pseudo-terminal error: {0}")]
    PtyError(String),

    /// The response sink refused a unit; the caller is gone.
    #[error("response sink closed: {0}")]
    SinkClosed(String),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, EngineError>;
