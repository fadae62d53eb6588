// src/exec/completion.rs

//! Completion tracking: join the readers, wait for exit, derive the code.

use std::fmt;
use std::future::Future;
use std::io;
use std::process::ExitStatus;
use std::sync::Arc;

use tokio::process::Child;
use tokio::sync::Notify;
use tracing::{info, warn};

use crate::exec::multiplexer::OutputReaders;
use crate::types::ABNORMAL_EXIT_CODE;

/// Why the engine stopped a child before it exited on its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Interruption {
    /// The caller's cancellation future resolved.
    Cancelled,
    /// The response sink rejected a unit.
    Disconnected,
}

impl fmt::Display for Interruption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Interruption::Cancelled => f.write_str("cancelled"),
            Interruption::Disconnected => f.write_str("caller disconnected"),
        }
    }
}

/// What the tracker observed for one child.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Completion {
    pub code: i32,
    pub interruption: Option<Interruption>,
}

/// Map the result of waiting on a piped child to a result code.
///
/// A normal exit yields its code. Termination by signal has no code and, like
/// a failed wait, maps to [`ABNORMAL_EXIT_CODE`].
pub fn exit_code(status: io::Result<ExitStatus>) -> i32 {
    match status {
        Ok(status) => status.code().unwrap_or(ABNORMAL_EXIT_CODE),
        Err(e) => {
            warn!(error = %e, "waiting for child process failed");
            ABNORMAL_EXIT_CODE
        }
    }
}

/// Same mapping for a pseudo-terminal child.
pub fn pty_exit_code(status: io::Result<portable_pty::ExitStatus>) -> i32 {
    match status {
        Ok(status) if status.success() => 0,
        Ok(status) => i32::try_from(status.exit_code()).unwrap_or(ABNORMAL_EXIT_CODE),
        Err(e) => {
            warn!(error = %e, "waiting for pseudo-terminal child failed");
            ABNORMAL_EXIT_CODE
        }
    }
}

/// Wait for both readers, then for the child, and return its result code.
///
/// If `cancel` resolves or a reader reports a closed sink first, the child is
/// killed and the readers are still drained before the exit status is read.
pub async fn track_piped<F>(
    invocation: u64,
    mut child: Child,
    readers: OutputReaders,
    disconnect: Arc<Notify>,
    cancel: F,
) -> Completion
where
    F: Future<Output = ()>,
{
    let joined = readers.join();
    tokio::pin!(joined);
    tokio::pin!(cancel);

    let mut interruption = None;
    let exits = tokio::select! {
        exits = &mut joined => Some(exits),
        _ = disconnect.notified() => {
            interruption = Some(Interruption::Disconnected);
            None
        }
        _ = &mut cancel => {
            interruption = Some(Interruption::Cancelled);
            None
        }
    };

    if let Some(reason) = interruption {
        stop_child(invocation, &mut child, reason);
    }

    let exits = match exits {
        Some(exits) => exits,
        None => joined.await,
    };

    if interruption.is_none() && exits.sink_closed() {
        interruption = Some(Interruption::Disconnected);
        stop_child(invocation, &mut child, Interruption::Disconnected);
    }

    let status = tokio::select! {
        status = child.wait() => status,
        _ = &mut cancel, if interruption.is_none() => {
            interruption = Some(Interruption::Cancelled);
            stop_child(invocation, &mut child, Interruption::Cancelled);
            child.wait().await
        }
    };

    Completion {
        code: exit_code(status),
        interruption,
    }
}

fn stop_child(invocation: u64, child: &mut Child, reason: Interruption) {
    info!(invocation, %reason, "stopping child process");
    if let Err(e) = child.start_kill() {
        warn!(invocation, error = %e, "failed to kill child process");
    }
}
