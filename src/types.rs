// src/types.rs

//! Request and response types exchanged with the host orchestrator.

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Result code sent when the child could not be started at all.
pub const ERROR_RESULT_CODE: i32 = 1;

/// Result code used when the exit status carries no numeric code.
pub const ABNORMAL_EXIT_CODE: i32 = 1;

/// Request to initialise the engine. Carries no data.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct InitRequest {}

/// Request to shut the engine down. Carries no data.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ShutdownRequest {}

/// Description of a single command invocation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RunRequest {
    /// Directory the child process starts in. Empty means the engine's own
    /// working directory.
    pub working_dir: PathBuf,
    /// Arguments passed to the engine command, in order.
    pub args: Vec<String>,
    /// Variables added on top of the inherited environment.
    pub env_vars: BTreeMap<String, String>,
    /// Attach the child to a pseudo-terminal instead of pipes.
    pub allocate_pseudo_tty: bool,
}

/// One streamed unit. Init, Run and Shutdown all share this shape.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineResponse {
    pub stdout: String,
    pub stderr: String,
    pub result_code: i32,
}

impl EngineResponse {
    /// Acknowledgement carrying a fixed message and code 0.
    pub fn acknowledge(message: impl Into<String>) -> Self {
        Self {
            stdout: message.into(),
            ..Self::default()
        }
    }

    /// Error unit sent when an invocation aborts before the child runs.
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            stderr: message.into(),
            result_code: ERROR_RESULT_CODE,
            ..Self::default()
        }
    }

    /// True if this unit carries output text rather than a result.
    pub fn has_output(&self) -> bool {
        !self.stdout.is_empty() || !self.stderr.is_empty()
    }
}

/// Which standard stream a character came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StreamOrigin {
    Stdout,
    Stderr,
}

impl fmt::Display for StreamOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StreamOrigin::Stdout => f.write_str("stdout"),
            StreamOrigin::Stderr => f.write_str("stderr"),
        }
    }
}

/// One decoded character tagged with its origin.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutputUnit {
    pub origin: StreamOrigin,
    pub ch: char,
}

impl From<OutputUnit> for EngineResponse {
    fn from(unit: OutputUnit) -> Self {
        let text = unit.ch.to_string();
        match unit.origin {
            StreamOrigin::Stdout => EngineResponse {
                stdout: text,
                ..EngineResponse::default()
            },
            StreamOrigin::Stderr => EngineResponse {
                stderr: text,
                ..EngineResponse::default()
            },
        }
    }
}

/// Final outcome of a Run invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunResult {
    pub code: i32,
}

impl From<RunResult> for EngineResponse {
    fn from(result: RunResult) -> Self {
        EngineResponse {
            result_code: result.code,
            ..EngineResponse::default()
        }
    }
}
