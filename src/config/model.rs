// src/config/model.rs

use std::time::Duration;

use serde::Deserialize;

/// Configuration file as read from TOML, before validation.
///
/// ```toml
/// [engine]
/// command = "terraform"
/// init_message = "Terraform Initialization completed\n"
/// shutdown_message = "Terraform Shutdown completed\n"
///
/// [pty]
/// rows = 24
/// cols = 80
/// drain_timeout_ms = 500
/// ```
///
/// Both sections are optional.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawConfigFile {
    #[serde(default)]
    pub engine: EngineSection,

    #[serde(default)]
    pub pty: PtySection,
}

/// `[engine]` section.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EngineSection {
    /// Executable run for every invocation, resolved from `PATH`.
    #[serde(default = "default_command")]
    pub command: String,

    /// Text sent back on `Init`.
    #[serde(default = "default_init_message")]
    pub init_message: String,

    /// Text sent back on `Shutdown`.
    #[serde(default = "default_shutdown_message")]
    pub shutdown_message: String,
}

fn default_command() -> String {
    "terraform".to_string()
}

fn default_init_message() -> String {
    "Terraform Initialization completed\n".to_string()
}

fn default_shutdown_message() -> String {
    "Terraform Shutdown completed\n".to_string()
}

impl Default for EngineSection {
    fn default() -> Self {
        Self {
            command: default_command(),
            init_message: default_init_message(),
            shutdown_message: default_shutdown_message(),
        }
    }
}

/// `[pty]` section: pseudo-terminal geometry and relay behaviour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PtySection {
    #[serde(default = "default_rows")]
    pub rows: u16,

    #[serde(default = "default_cols")]
    pub cols: u16,

    /// How long to wait for the output mirrors to flush after the child
    /// exits.
    #[serde(default = "default_drain_timeout_ms")]
    pub drain_timeout_ms: u64,
}

fn default_rows() -> u16 {
    24
}

fn default_cols() -> u16 {
    80
}

fn default_drain_timeout_ms() -> u64 {
    500
}

impl Default for PtySection {
    fn default() -> Self {
        Self {
            rows: default_rows(),
            cols: default_cols(),
            drain_timeout_ms: default_drain_timeout_ms(),
        }
    }
}

impl PtySection {
    pub fn drain_timeout(&self) -> Duration {
        Duration::from_millis(self.drain_timeout_ms)
    }
}

/// Validated configuration.
///
/// Only obtainable through `TryFrom<RawConfigFile>` (see `validate.rs`) or
/// [`EngineConfig::default`], so every instance has passed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    engine: EngineSection,
    pty: PtySection,
}

impl EngineConfig {
    pub(crate) fn new_unchecked(engine: EngineSection, pty: PtySection) -> Self {
        Self { engine, pty }
    }

    pub fn command(&self) -> &str {
        &self.engine.command
    }

    pub fn init_message(&self) -> &str {
        &self.engine.init_message
    }

    pub fn shutdown_message(&self) -> &str {
        &self.engine.shutdown_message
    }

    pub fn pty(&self) -> &PtySection {
        &self.pty
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::new_unchecked(EngineSection::default(), PtySection::default())
    }
}
