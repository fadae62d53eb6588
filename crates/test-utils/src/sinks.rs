use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use tfengine::errors::{EngineError, Result};
use tfengine::sink::ResponseSink;
use tfengine::types::EngineResponse;

/// In-memory sink that records every unit in arrival order.
#[derive(Debug, Default, Clone)]
pub struct RecordingSink {
    responses: Arc<Mutex<Vec<EngineResponse>>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn responses(&self) -> Vec<EngineResponse> {
        self.responses.lock().unwrap().clone()
    }

    /// Concatenated stdout text of all units.
    pub fn stdout(&self) -> String {
        self.responses()
            .iter()
            .map(|r| r.stdout.as_str())
            .collect()
    }

    /// Concatenated stderr text of all units.
    pub fn stderr(&self) -> String {
        self.responses()
            .iter()
            .map(|r| r.stderr.as_str())
            .collect()
    }

    /// Result code of the last unit, if any unit arrived.
    pub fn final_code(&self) -> Option<i32> {
        self.responses().last().map(|r| r.result_code)
    }
}

impl ResponseSink for RecordingSink {
    fn send(
        &self,
        response: EngineResponse,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
        Box::pin(async move {
            self.responses.lock().unwrap().push(response);
            Ok(())
        })
    }
}

/// Sink that accepts `accept` units and rejects everything after, like a
/// caller that disconnects mid-stream.
#[derive(Debug)]
pub struct RejectingSink {
    accept: usize,
    seen: AtomicUsize,
    accepted: RecordingSink,
}

impl RejectingSink {
    pub fn after(accept: usize) -> Self {
        Self {
            accept,
            seen: AtomicUsize::new(0),
            accepted: RecordingSink::new(),
        }
    }

    pub fn accepted(&self) -> Vec<EngineResponse> {
        self.accepted.responses()
    }
}

impl ResponseSink for RejectingSink {
    fn send(
        &self,
        response: EngineResponse,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
        Box::pin(async move {
            if self.seen.fetch_add(1, Ordering::SeqCst) >= self.accept {
                return Err(EngineError::SinkClosed("caller went away".to_string()));
            }
            self.accepted.send(response).await
        })
    }
}
