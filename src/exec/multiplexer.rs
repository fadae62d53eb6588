// src/exec/multiplexer.rs

//! Output multiplexer: one reader task per captured stream.
//!
//! Each reader decodes its pipe as UTF-8 and forwards every character as its
//! own [`EngineResponse`] as soon as it is decoded. No line buffering: an
//! interactive prompt without a trailing newline still reaches the caller.
//!
//! [`OutputReaders::join`] is the barrier the completion tracker waits on
//! before it looks at the exit status.

use std::sync::Arc;

use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tracing::{debug, error};

use crate::exec::decode::Utf8Decoder;
use crate::sink::ResponseSink;
use crate::types::{EngineResponse, OutputUnit, StreamOrigin};

const READ_BUF_SIZE: usize = 4096;

/// Why a reader stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReaderExit {
    /// End of stream reached, everything forwarded.
    Drained,
    /// The pipe returned an error; the rest of the stream was dropped.
    ReadFailed,
    /// The sink rejected a unit.
    SinkClosed,
}

/// Outcome of both readers after the join.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReaderExits {
    pub stdout: ReaderExit,
    pub stderr: ReaderExit,
}

impl ReaderExits {
    pub fn sink_closed(&self) -> bool {
        self.stdout == ReaderExit::SinkClosed || self.stderr == ReaderExit::SinkClosed
    }
}

/// The stdout/stderr reader pair of one invocation.
pub struct OutputReaders {
    stdout: JoinHandle<ReaderExit>,
    stderr: JoinHandle<ReaderExit>,
}

impl OutputReaders {
    /// Start both readers. `disconnect` is notified the first time a reader
    /// sees the sink reject a unit.
    pub fn spawn<O, E>(
        invocation: u64,
        stdout: O,
        stderr: E,
        sink: Arc<dyn ResponseSink>,
        disconnect: Arc<Notify>,
    ) -> Self
    where
        O: AsyncRead + Unpin + Send + 'static,
        E: AsyncRead + Unpin + Send + 'static,
    {
        let stdout = tokio::spawn(forward_stream(
            invocation,
            stdout,
            StreamOrigin::Stdout,
            Arc::clone(&sink),
            Arc::clone(&disconnect),
        ));
        let stderr = tokio::spawn(forward_stream(
            invocation,
            stderr,
            StreamOrigin::Stderr,
            sink,
            disconnect,
        ));
        Self { stdout, stderr }
    }

    /// Wait until both readers have finished.
    pub async fn join(self) -> ReaderExits {
        let (stdout, stderr) = tokio::join!(self.stdout, self.stderr);
        ReaderExits {
            stdout: stdout.unwrap_or_else(|e| {
                error!(stream = %StreamOrigin::Stdout, error = %e, "reader task failed");
                ReaderExit::ReadFailed
            }),
            stderr: stderr.unwrap_or_else(|e| {
                error!(stream = %StreamOrigin::Stderr, error = %e, "reader task failed");
                ReaderExit::ReadFailed
            }),
        }
    }
}

/// Read `reader` to the end, sending one unit per decoded character.
pub async fn forward_stream<R>(
    invocation: u64,
    mut reader: R,
    origin: StreamOrigin,
    sink: Arc<dyn ResponseSink>,
    disconnect: Arc<Notify>,
) -> ReaderExit
where
    R: AsyncRead + Unpin + Send,
{
    let mut decoder = Utf8Decoder::new();
    let mut buf = vec![0u8; READ_BUF_SIZE];
    let mut chars = Vec::new();

    loop {
        let read = reader.read(&mut buf).await;
        let at_eof = match read {
            Ok(0) => {
                if decoder.has_pending() {
                    debug!(invocation, stream = %origin, "stream ended inside a character");
                }
                decoder.finish(&mut chars);
                true
            }
            Ok(n) => {
                decoder.decode(&buf[..n], &mut chars);
                false
            }
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(e) => {
                error!(invocation, stream = %origin, error = %e, "error reading stream");
                return ReaderExit::ReadFailed;
            }
        };

        for ch in chars.drain(..) {
            let unit = EngineResponse::from(OutputUnit { origin, ch });
            if let Err(e) = sink.send(unit).await {
                error!(invocation, stream = %origin, error = %e, "error sending output");
                disconnect.notify_one();
                return ReaderExit::SinkClosed;
            }
        }

        if at_eof {
            debug!(invocation, stream = %origin, "stream drained");
            return ReaderExit::Drained;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::ChannelSink;

    use std::io;
    use std::pin::Pin;
    use std::task::{Context, Poll};

    use tokio::io::ReadBuf;

    /// A pipe that fails on the first read.
    struct BrokenPipe;

    impl AsyncRead for BrokenPipe {
        fn poll_read(
            self: Pin<&mut Self>,
            _cx: &mut Context<'_>,
            _buf: &mut ReadBuf<'_>,
        ) -> Poll<io::Result<()>> {
            Poll::Ready(Err(io::Error::other("pipe broke")))
        }
    }

    #[tokio::test]
    async fn read_failure_ends_only_that_reader() {
        let (sink, mut rx) = ChannelSink::channel(64);
        let disconnect = Arc::new(Notify::new());

        let readers = OutputReaders::spawn(
            1,
            BrokenPipe,
            &b"still here"[..],
            Arc::new(sink),
            Arc::clone(&disconnect),
        );
        let exits = readers.join().await;

        assert_eq!(
            exits,
            ReaderExits {
                stdout: ReaderExit::ReadFailed,
                stderr: ReaderExit::Drained,
            }
        );
        assert!(!exits.sink_closed());

        let mut units = Vec::new();
        while let Ok(unit) = rx.try_recv() {
            units.push(unit);
        }
        assert!(units.iter().all(|u| u.stdout.is_empty()));
        let text: String = units.iter().map(|u| u.stderr.as_str()).collect();
        assert_eq!(text, "still here");
    }

    #[tokio::test]
    async fn forwards_one_unit_per_character() {
        let (sink, mut rx) = ChannelSink::channel(64);
        let exit = forward_stream(
            1,
            "héllo\n".as_bytes(),
            StreamOrigin::Stdout,
            Arc::new(sink),
            Arc::new(Notify::new()),
        )
        .await;
        assert_eq!(exit, ReaderExit::Drained);

        let mut units = Vec::new();
        while let Ok(unit) = rx.try_recv() {
            units.push(unit);
        }
        assert_eq!(units.len(), 6);
        assert!(units.iter().all(|u| u.stderr.is_empty() && u.result_code == 0));
        let text: String = units.iter().map(|u| u.stdout.as_str()).collect();
        assert_eq!(text, "héllo\n");
    }

    #[tokio::test]
    async fn closed_sink_stops_reader_and_signals_disconnect() {
        let (sink, rx) = ChannelSink::channel(1);
        drop(rx);
        let disconnect = Arc::new(Notify::new());

        let exit = forward_stream(
            1,
            &b"abc"[..],
            StreamOrigin::Stderr,
            Arc::new(sink),
            Arc::clone(&disconnect),
        )
        .await;
        assert_eq!(exit, ReaderExit::SinkClosed);

        // The stored permit makes this resolve immediately.
        tokio::time::timeout(std::time::Duration::from_secs(1), disconnect.notified())
            .await
            .expect("disconnect should have been signalled");
    }
}
