// src/exec/pty.rs

//! Pseudo-terminal relay.
//!
//! Allocates a pseudo-terminal, starts the child on its slave side and
//! bridges the local terminal to the master side with three byte-copy loops:
//!
//! - local input  -> terminal
//! - terminal     -> local output
//! - terminal     -> local error
//!
//! The terminal API is blocking, so each loop runs on its own OS thread. A
//! loop ends on the first I/O error; EOF/EIO after the child exits is the
//! normal way for the output loops to stop, so nothing is reported upwards.
//!
//! The input loop is never joined: it may sit in a blocking read of the local
//! input long after the child is gone. It writes through a slot owned by
//! [`PtyGuard`], and dropping the guard empties that slot, so the terminal is
//! closed as soon as the guard goes. The loop itself exits on its next read.

use std::io::{self, Read, Write};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread;
use std::time::Duration;

use portable_pty::{
    Child, MasterPty, PtyPair, PtySize, PtySystem as _, SlavePty as _, native_pty_system,
};
use tokio::sync::oneshot;
use tracing::debug;

use crate::config::PtySection;
use crate::errors::{EngineError, Result};
use crate::exec::command::CommandSpec;

/// The caller-side endpoints the relay copies to and from.
pub struct LocalTerminal {
    pub input: Box<dyn Read + Send>,
    pub output: Box<dyn Write + Send>,
    pub error: Box<dyn Write + Send>,
}

impl LocalTerminal {
    /// The engine process's own stdin/stdout/stderr.
    pub fn stdio() -> Self {
        Self {
            input: Box::new(io::stdin()),
            output: Box::new(io::stdout()),
            error: Box::new(io::stderr()),
        }
    }
}

/// A freshly allocated pseudo-terminal with no child attached yet.
pub struct PtyDevice {
    pair: PtyPair,
}

impl PtyDevice {
    pub fn allocate(size: &PtySection) -> Result<Self> {
        let pair = native_pty_system()
            .openpty(PtySize {
                rows: size.rows,
                cols: size.cols,
                pixel_width: 0,
                pixel_height: 0,
            })
            .map_err(|e| EngineError::PtyError(format!("allocating pseudo-terminal: {e:#}")))?;
        Ok(Self { pair })
    }

    /// Start the child with the slave side as its controlling terminal.
    ///
    /// Our copy of the slave is closed right away so the master reports
    /// end-of-file once the child (and anything it spawned) lets go of it.
    ///
    /// `CommandBuilder` silently falls back to the home directory when the
    /// working directory is missing, so that case is rejected up front.
    pub fn spawn(self, spec: &CommandSpec) -> Result<(PtyGuard, Box<dyn Child + Send + Sync>)> {
        if let Some(dir) = spec.working_dir.as_deref().filter(|dir| !dir.is_dir()) {
            return Err(EngineError::Spawn {
                command: spec.display(),
                message: format!("working directory {} is not a directory", dir.display()),
            });
        }

        let PtyPair { slave, master } = self.pair;
        let child = slave
            .spawn_command(spec.to_pty_command())
            .map_err(|e| EngineError::Spawn {
                command: spec.display(),
                message: format!("{e:#}"),
            })?;
        drop(slave);
        let guard = PtyGuard {
            master,
            input: Arc::new(Mutex::new(None)),
        };
        Ok((guard, child))
    }
}

/// Writer end of the terminal, shared with the input loop until the guard
/// takes it back.
type InputSlot = Arc<Mutex<Option<Box<dyn Write + Send>>>>;

fn lock_slot(slot: &InputSlot) -> MutexGuard<'_, Option<Box<dyn Write + Send>>> {
    slot.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Owns the master side of the terminal. Dropping it closes the device,
/// including the descriptor lent to the input loop.
pub struct PtyGuard {
    master: Box<dyn MasterPty + Send>,
    input: InputSlot,
}

impl PtyGuard {
    /// Start the three copy loops.
    pub fn start_relay(&self, terminal: LocalTerminal) -> Result<RelayHandles> {
        let LocalTerminal {
            input,
            output,
            error,
        } = terminal;

        let to_output = self.clone_reader()?;
        let to_error = self.clone_reader()?;
        let writer = self
            .master
            .take_writer()
            .map_err(|e| EngineError::PtyError(format!("opening pseudo-terminal writer: {e:#}")))?;

        *lock_slot(&self.input) = Some(writer);
        spawn_input_loop(input, Arc::clone(&self.input))?;

        let (output_tx, output_done) = oneshot::channel();
        spawn_copy_loop("pty-output", to_output, output, output_tx)?;

        let (error_tx, error_done) = oneshot::channel();
        spawn_copy_loop("pty-error", to_error, error, error_tx)?;

        Ok(RelayHandles {
            output_done,
            error_done,
        })
    }

    fn clone_reader(&self) -> Result<Box<dyn Read + Send>> {
        self.master
            .try_clone_reader()
            .map_err(|e| EngineError::PtyError(format!("cloning pseudo-terminal reader: {e:#}")))
    }
}

impl Drop for PtyGuard {
    fn drop(&mut self) {
        lock_slot(&self.input).take();
        debug!("closing pseudo-terminal");
    }
}

/// Completion signals of the two output mirror loops.
pub struct RelayHandles {
    output_done: oneshot::Receiver<()>,
    error_done: oneshot::Receiver<()>,
}

impl RelayHandles {
    /// Give the output mirrors up to `grace` to flush what the child wrote
    /// before it exited.
    pub async fn drain(self, grace: Duration) {
        let both = async {
            let _ = self.output_done.await;
            let _ = self.error_done.await;
        };
        if tokio::time::timeout(grace, both).await.is_err() {
            debug!(?grace, "pseudo-terminal mirrors still open after grace period");
        }
    }
}

/// Forward local input to the terminal for as long as the slot holds a
/// writer. Local end-of-input releases the writer, which the child sees as
/// end-of-file.
fn spawn_input_loop<R>(mut from: R, slot: InputSlot) -> Result<()>
where
    R: Read + Send + 'static,
{
    thread::Builder::new()
        .name("pty-input".to_string())
        .spawn(move || {
            let mut buf = [0u8; 1024];
            loop {
                let n = match from.read(&mut buf) {
                    Ok(0) => {
                        debug!(relay = "pty-input", "local input closed");
                        break;
                    }
                    Ok(n) => n,
                    Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                    Err(e) => {
                        debug!(relay = "pty-input", error = %e, "relay loop ended");
                        break;
                    }
                };

                let mut writer = lock_slot(&slot);
                let Some(to) = writer.as_mut() else {
                    debug!(relay = "pty-input", bytes = n, "terminal closed, input dropped");
                    return;
                };
                if let Err(e) = to.write_all(&buf[..n]).and_then(|()| to.flush()) {
                    debug!(relay = "pty-input", error = %e, "relay loop ended");
                    break;
                }
            }
            lock_slot(&slot).take();
        })
        .map_err(|e| EngineError::PtyError(format!("starting pty-input thread: {e}")))?;
    Ok(())
}

/// Copy `from` into `to` until either side fails. `done` fires only after
/// both ends are dropped, so a drained relay holds no terminal descriptor.
fn spawn_copy_loop<R, W>(
    name: &'static str,
    mut from: R,
    mut to: W,
    done: oneshot::Sender<()>,
) -> Result<()>
where
    R: Read + Send + 'static,
    W: Write + Send + 'static,
{
    thread::Builder::new()
        .name(name.to_string())
        .spawn(move || {
            match io::copy(&mut from, &mut to) {
                Ok(bytes) => debug!(relay = name, bytes, "relay loop finished"),
                Err(e) => debug!(relay = name, error = %e, "relay loop ended"),
            }
            let _ = to.flush();
            drop(from);
            drop(to);
            let _ = done.send(());
        })
        .map_err(|e| EngineError::PtyError(format!("starting {name} thread: {e}")))?;
    Ok(())
}
