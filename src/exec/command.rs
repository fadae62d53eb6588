// src/exec/command.rs

//! Command builder: turns a [`RunRequest`] into a process specification.
//!
//! The same spec renders either as a piped `tokio::process::Command` or as a
//! `portable_pty::CommandBuilder` for pseudo-terminal mode. Environment
//! entries are added on top of the inherited environment.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::process::Stdio;

use portable_pty::CommandBuilder;
use tokio::process::Command;

use crate::types::RunRequest;

/// Everything needed to start one child process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    pub program: String,
    pub args: Vec<String>,
    /// `None` inherits the engine's working directory.
    pub working_dir: Option<PathBuf>,
    pub env: BTreeMap<String, String>,
}

impl CommandSpec {
    /// Build a spec for `program` from a run request. No validation: a bad
    /// directory or missing executable shows up when spawning.
    pub fn from_request(program: &str, request: &RunRequest) -> Self {
        let working_dir = if request.working_dir.as_os_str().is_empty() {
            None
        } else {
            Some(request.working_dir.clone())
        };

        Self {
            program: program.to_string(),
            args: request.args.clone(),
            working_dir,
            env: request.env_vars.clone(),
        }
    }

    /// Human readable command line for logs and error messages.
    pub fn display(&self) -> String {
        if self.args.is_empty() {
            self.program.clone()
        } else {
            format!("{} {}", self.program, self.args.join(" "))
        }
    }

    /// Piped command: stdout and stderr are captured, stdin is inherited.
    ///
    /// The child is killed if the returned handle is dropped before it exits.
    pub fn to_piped_command(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args)
            .envs(&self.env)
            .stdin(Stdio::inherit())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        if let Some(dir) = &self.working_dir {
            cmd.current_dir(dir);
        }
        cmd
    }

    /// Command for a pseudo-terminal child. `CommandBuilder` starts from the
    /// current process environment, so entries are merged the same way.
    pub fn to_pty_command(&self) -> CommandBuilder {
        let mut cmd = CommandBuilder::new(&self.program);
        cmd.args(&self.args);
        for (key, value) in &self.env {
            cmd.env(key, value);
        }

        if let Some(dir) = &self.working_dir {
            cmd.cwd(dir);
        }
        cmd
    }
}
