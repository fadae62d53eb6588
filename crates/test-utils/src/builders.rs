#![allow(dead_code)]

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use tfengine::config::{EngineConfig, EngineSection, PtySection, RawConfigFile};
use tfengine::types::RunRequest;

/// Builder for `EngineConfig` to simplify test setup.
pub struct EngineConfigBuilder {
    config: RawConfigFile,
}

impl EngineConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: RawConfigFile {
                engine: EngineSection::default(),
                pty: PtySection::default(),
            },
        }
    }

    /// Shorthand for an engine that runs `sh`, so tests can pass
    /// `-c <script>` as the request arguments.
    pub fn shell() -> Self {
        Self::new().command("sh")
    }

    pub fn command(mut self, command: &str) -> Self {
        self.config.engine.command = command.to_string();
        self
    }

    pub fn init_message(mut self, message: &str) -> Self {
        self.config.engine.init_message = message.to_string();
        self
    }

    pub fn drain_timeout_ms(mut self, ms: u64) -> Self {
        self.config.pty.drain_timeout_ms = ms;
        self
    }

    pub fn build(self) -> EngineConfig {
        EngineConfig::try_from(self.config).expect("Failed to build valid config from builder")
    }
}

impl Default for EngineConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for `RunRequest`.
pub struct RunRequestBuilder {
    request: RunRequest,
}

impl RunRequestBuilder {
    pub fn new() -> Self {
        Self {
            request: RunRequest {
                working_dir: PathBuf::new(),
                args: vec![],
                env_vars: BTreeMap::new(),
                allocate_pseudo_tty: false,
            },
        }
    }

    /// Request running `sh -c <script>` (with a `sh` engine config).
    pub fn script(script: &str) -> Self {
        Self::new().arg("-c").arg(script)
    }

    pub fn arg(mut self, arg: &str) -> Self {
        self.request.args.push(arg.to_string());
        self
    }

    pub fn working_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.request.working_dir = dir.as_ref().to_path_buf();
        self
    }

    pub fn env(mut self, key: &str, value: &str) -> Self {
        self.request
            .env_vars
            .insert(key.to_string(), value.to_string());
        self
    }

    pub fn pty(mut self, val: bool) -> Self {
        self.request.allocate_pseudo_tty = val;
        self
    }

    pub fn build(self) -> RunRequest {
        self.request
    }
}

impl Default for RunRequestBuilder {
    fn default() -> Self {
        Self::new()
    }
}
