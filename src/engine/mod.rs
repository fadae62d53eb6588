// src/engine/mod.rs

//! The engine: the three operations exposed to the host orchestrator.
//!
//! - `init` / `shutdown` send a single fixed acknowledgement.
//! - `run` starts the configured command for one [`RunRequest`], streams its
//!   output into the caller's [`ResponseSink`] and finishes with the result
//!   code. See [`run`] for the invocation itself and [`state`] for its
//!   lifecycle.
//!
//! An `Engine` holds no per-invocation state, so one instance can serve any
//! number of concurrent runs.

use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use tracing::info;

use crate::config::EngineConfig;
use crate::errors::Result;
use crate::exec::command::CommandSpec;
use crate::exec::pty::LocalTerminal;
use crate::sink::ResponseSink;
use crate::types::{EngineResponse, InitRequest, RunRequest, RunResult, ShutdownRequest};

pub mod run;
pub mod state;

pub use state::{Invocation, RunState};

/// Produces the local endpoints for a pseudo-terminal relay.
pub type TerminalFactory = Arc<dyn Fn() -> LocalTerminal + Send + Sync>;

#[derive(Clone)]
pub struct Engine {
    config: Arc<EngineConfig>,
    terminal: TerminalFactory,
    next_invocation: Arc<AtomicU64>,
}

impl Engine {
    /// Engine relaying pseudo-terminal sessions to this process's stdio.
    pub fn new(config: EngineConfig) -> Self {
        Self {
            config: Arc::new(config),
            terminal: Arc::new(LocalTerminal::stdio),
            next_invocation: Arc::new(AtomicU64::new(1)),
        }
    }

    /// Replace the local endpoints used in pseudo-terminal mode.
    pub fn with_terminal<F>(mut self, factory: F) -> Self
    where
        F: Fn() -> LocalTerminal + Send + Sync + 'static,
    {
        self.terminal = Arc::new(factory);
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub async fn init(&self, _request: InitRequest, sink: &dyn ResponseSink) -> Result<()> {
        info!(command = %self.config.command(), "init engine");
        sink.send(EngineResponse::acknowledge(self.config.init_message()))
            .await
    }

    pub async fn shutdown(&self, _request: ShutdownRequest, sink: &dyn ResponseSink) -> Result<()> {
        info!(command = %self.config.command(), "shutdown engine");
        sink.send(EngineResponse::acknowledge(self.config.shutdown_message()))
            .await
    }

    /// Run the command described by `request` to completion.
    pub async fn run(&self, request: RunRequest, sink: Arc<dyn ResponseSink>) -> Result<RunResult> {
        self.run_until(request, sink, std::future::pending()).await
    }

    /// Like [`Engine::run`], but kills the child once `cancel` resolves.
    ///
    /// On success the returned result is the same one sent as the final
    /// unit. Errors mean the command never started (an error unit was sent)
    /// or the sink refused the final unit.
    pub async fn run_until<F>(
        &self,
        request: RunRequest,
        sink: Arc<dyn ResponseSink>,
        cancel: F,
    ) -> Result<RunResult>
    where
        F: Future<Output = ()> + Send,
    {
        let mut invocation = Invocation::new(self.next_invocation.fetch_add(1, Ordering::Relaxed));
        let spec = CommandSpec::from_request(self.config.command(), &request);

        info!(
            invocation = invocation.id(),
            working_dir = ?request.working_dir,
            command = %spec.display(),
            env_names = ?spec.env.keys().collect::<Vec<_>>(),
            pty = request.allocate_pseudo_tty,
            "run requested"
        );

        if request.allocate_pseudo_tty {
            self.run_pty(&mut invocation, &spec, sink, cancel).await
        } else {
            self.run_piped(&mut invocation, &spec, sink, cancel).await
        }
    }
}
