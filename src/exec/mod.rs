// src/exec/mod.rs

//! Process execution layer.
//!
//! - [`command`] turns a run request into a process specification.
//! - [`decode`] incrementally decodes output bytes as UTF-8.
//! - [`multiplexer`] runs the stdout/stderr reader tasks that stream one
//!   unit per character.
//! - [`completion`] joins the readers, waits for exit and maps the status
//!   to a result code.
//! - [`pty`] allocates a pseudo-terminal and relays it to the local terminal.

pub mod command;
pub mod completion;
pub mod decode;
pub mod multiplexer;
pub mod pty;

pub use command::CommandSpec;
pub use completion::{Completion, Interruption};
pub use decode::Utf8Decoder;
pub use multiplexer::{OutputReaders, ReaderExit, ReaderExits};
pub use pty::LocalTerminal;
