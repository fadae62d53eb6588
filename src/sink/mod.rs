// src/sink/mod.rs

//! Response sink abstraction.
//!
//! Every engine operation writes its streamed units into a [`ResponseSink`]
//! instead of a concrete transport. A transport adapter implements the trait
//! over its server stream; tests use an in-memory collector.
//!
//! - [`ChannelSink`] forwards units into a Tokio mpsc channel.
//! - [`console`] prints units to the local terminal (used by the CLI).

use std::future::Future;
use std::pin::Pin;

use tokio::sync::mpsc;

use crate::errors::{EngineError, Result};
use crate::types::EngineResponse;

pub mod console;

pub use console::{JsonLinesSink, TextSink};

/// Streaming output capability supplied by the caller.
///
/// `send` may be called concurrently from the stdout and stderr readers.
/// An error means the caller is gone; the engine stops streaming.
pub trait ResponseSink: Send + Sync {
    fn send(
        &self,
        response: EngineResponse,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>>;
}

/// Sink backed by a bounded mpsc channel. A dropped receiver counts as a
/// disconnected caller.
#[derive(Debug, Clone)]
pub struct ChannelSink {
    tx: mpsc::Sender<EngineResponse>,
}

impl ChannelSink {
    pub fn new(tx: mpsc::Sender<EngineResponse>) -> Self {
        Self { tx }
    }

    /// Create a sink together with the receiving end.
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<EngineResponse>) {
        let (tx, rx) = mpsc::channel(capacity);
        (Self::new(tx), rx)
    }
}

impl ResponseSink for ChannelSink {
    fn send(
        &self,
        response: EngineResponse,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
        Box::pin(async move {
            self.tx
                .send(response)
                .await
                .map_err(|e| EngineError::SinkClosed(e.to_string()))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn channel_sink_delivers_in_order() {
        let (sink, mut rx) = ChannelSink::channel(4);
        sink.send(EngineResponse::acknowledge("a")).await.unwrap();
        sink.send(EngineResponse::acknowledge("b")).await.unwrap();
        assert_eq!(rx.recv().await.unwrap().stdout, "a");
        assert_eq!(rx.recv().await.unwrap().stdout, "b");
    }

    #[tokio::test]
    async fn dropped_receiver_is_reported_as_closed() {
        let (sink, rx) = ChannelSink::channel(1);
        drop(rx);
        let err = sink.send(EngineResponse::default()).await.unwrap_err();
        assert!(matches!(err, EngineError::SinkClosed(_)));
    }
}
