// src/engine/run.rs

//! One Run invocation, in either capture mode.
//!
//! Exactly one capture mechanism is used per invocation: pipes feeding the
//! output multiplexer, or a pseudo-terminal relayed to the local terminal.
//! In pseudo-terminal mode the sink only receives the final result.

use std::future::Future;
use std::io;
use std::sync::Arc;

use portable_pty::{Child as _, ChildKiller as _};
use tokio::sync::Notify;
use tracing::{error, info, warn};

use crate::engine::Engine;
use crate::engine::state::{Invocation, RunState};
use crate::errors::{EngineError, Result};
use crate::exec::command::CommandSpec;
use crate::exec::completion::{Completion, Interruption, pty_exit_code, track_piped};
use crate::exec::multiplexer::OutputReaders;
use crate::exec::pty::PtyDevice;
use crate::sink::ResponseSink;
use crate::types::{EngineResponse, RunResult};

impl Engine {
    pub(crate) async fn run_piped<F>(
        &self,
        invocation: &mut Invocation,
        spec: &CommandSpec,
        sink: Arc<dyn ResponseSink>,
        cancel: F,
    ) -> Result<RunResult>
    where
        F: Future<Output = ()> + Send,
    {
        let mut cmd = spec.to_piped_command();
        invocation.advance(RunState::Piped)?;

        let mut child = match cmd.spawn() {
            Ok(child) => child,
            Err(e) => {
                let err = EngineError::Spawn {
                    command: spec.display(),
                    message: e.to_string(),
                };
                return abort(invocation, sink.as_ref(), err).await;
            }
        };
        invocation.advance(RunState::Started)?;

        let (Some(stdout), Some(stderr)) = (child.stdout.take(), child.stderr.take()) else {
            let err = EngineError::Spawn {
                command: spec.display(),
                message: "stdout/stderr pipes were not created".to_string(),
            };
            return abort(invocation, sink.as_ref(), err).await;
        };

        let disconnect = Arc::new(Notify::new());
        let readers = OutputReaders::spawn(
            invocation.id(),
            stdout,
            stderr,
            Arc::clone(&sink),
            Arc::clone(&disconnect),
        );
        invocation.advance(RunState::Streaming)?;

        let completion = track_piped(invocation.id(), child, readers, disconnect, cancel).await;
        invocation.advance(RunState::Exited)?;

        report(invocation, sink.as_ref(), completion).await
    }

    pub(crate) async fn run_pty<F>(
        &self,
        invocation: &mut Invocation,
        spec: &CommandSpec,
        sink: Arc<dyn ResponseSink>,
        cancel: F,
    ) -> Result<RunResult>
    where
        F: Future<Output = ()> + Send,
    {
        let pty_config = *self.config.pty();

        let device = match PtyDevice::allocate(&pty_config) {
            Ok(device) => device,
            Err(err) => return abort(invocation, sink.as_ref(), err).await,
        };
        invocation.advance(RunState::Piped)?;

        // `guard` closes the terminal on every return path below.
        let (guard, mut child) = match device.spawn(spec) {
            Ok(started) => started,
            Err(err) => return abort(invocation, sink.as_ref(), err).await,
        };
        invocation.advance(RunState::Started)?;

        let relay = match guard.start_relay((self.terminal)()) {
            Ok(relay) => relay,
            Err(err) => {
                if let Err(e) = child.kill() {
                    warn!(invocation = invocation.id(), error = %e, "failed to kill child process");
                }
                return abort(invocation, sink.as_ref(), err).await;
            }
        };
        invocation.advance(RunState::Streaming)?;

        let mut killer = child.clone_killer();
        let mut wait = tokio::task::spawn_blocking(move || child.wait());
        tokio::pin!(cancel);

        let mut interruption = None;
        let joined = tokio::select! {
            joined = &mut wait => joined,
            _ = &mut cancel => {
                interruption = Some(Interruption::Cancelled);
                info!(invocation = invocation.id(), reason = %Interruption::Cancelled, "stopping child process");
                if let Err(e) = killer.kill() {
                    warn!(invocation = invocation.id(), error = %e, "failed to kill child process");
                }
                (&mut wait).await
            }
        };
        let status = joined.unwrap_or_else(|e| Err(io::Error::other(e)));

        relay.drain(pty_config.drain_timeout()).await;
        drop(guard);
        invocation.advance(RunState::Exited)?;

        let completion = Completion {
            code: pty_exit_code(status),
            interruption,
        };
        report(invocation, sink.as_ref(), completion).await
    }
}

/// Early exit before the child produced anything: one error unit, then the
/// failure goes back to the caller.
async fn abort(
    invocation: &mut Invocation,
    sink: &dyn ResponseSink,
    err: EngineError,
) -> Result<RunResult> {
    error!(invocation = invocation.id(), state = %invocation.state(), error = %err, "run aborted");

    if let Err(send_err) = sink.send(EngineResponse::error(err.to_string())).await {
        warn!(invocation = invocation.id(), error = %send_err, "error sending response");
    }

    invocation.advance(RunState::Reported)?;
    Err(err)
}

/// Send the final unit. Only called once every reader has been joined.
async fn report(
    invocation: &mut Invocation,
    sink: &dyn ResponseSink,
    completion: Completion,
) -> Result<RunResult> {
    info!(
        invocation = invocation.id(),
        exit_code = completion.code,
        interrupted = ?completion.interruption,
        "command exited"
    );

    let result = RunResult {
        code: completion.code,
    };
    let sent = sink.send(result.into()).await;
    invocation.advance(RunState::Reported)?;

    match sent {
        Ok(()) => Ok(result),
        Err(e) => {
            warn!(invocation = invocation.id(), error = %e, "error sending result");
            Err(e)
        }
    }
}
