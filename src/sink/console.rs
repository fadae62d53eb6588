// src/sink/console.rs

//! Console sinks used by the `tfengine` binary.

use std::future::Future;
use std::io::{self, Write};
use std::pin::Pin;

use crate::errors::Result;
use crate::sink::ResponseSink;
use crate::types::EngineResponse;

/// Mirrors stdout units to the local stdout and stderr units to the local
/// stderr. Result codes are not printed; the binary turns them into its exit
/// status.
#[derive(Debug, Default, Clone, Copy)]
pub struct TextSink;

impl ResponseSink for TextSink {
    fn send(
        &self,
        response: EngineResponse,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
        Box::pin(async move {
            if !response.stdout.is_empty() {
                let mut out = io::stdout().lock();
                out.write_all(response.stdout.as_bytes())?;
                out.flush()?;
            }
            if !response.stderr.is_empty() {
                let mut err = io::stderr().lock();
                err.write_all(response.stderr.as_bytes())?;
                err.flush()?;
            }
            Ok(())
        })
    }
}

/// Prints each unit as one JSON object per line on stdout, using the wire
/// field names (`stdout`, `stderr`, `resultCode`).
#[derive(Debug, Default, Clone, Copy)]
pub struct JsonLinesSink;

impl ResponseSink for JsonLinesSink {
    fn send(
        &self,
        response: EngineResponse,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
        Box::pin(async move {
            let line = serde_json::to_string(&response).map_err(anyhow::Error::from)?;
            let mut out = io::stdout().lock();
            writeln!(out, "{line}")?;
            out.flush()?;
            Ok(())
        })
    }
}
