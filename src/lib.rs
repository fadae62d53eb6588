// src/lib.rs

pub mod cli;
pub mod config;
pub mod engine;
pub mod errors;
pub mod exec;
pub mod logging;
pub mod sink;
pub mod types;

use std::sync::Arc;

use anyhow::Result;
use tracing::debug;

use crate::cli::{CliArgs, EngineCommand, OutputFormat, RunArgs};
use crate::config::load_or_default;
use crate::engine::Engine;
use crate::errors::EngineError;
use crate::sink::{JsonLinesSink, ResponseSink, TextSink};
use crate::types::{ERROR_RESULT_CODE, InitRequest, RunRequest, ShutdownRequest};

/// High-level entry point used by `main.rs`.
///
/// Loads the config, performs the requested operation against a console
/// sink and returns the process exit status:
/// - `init` / `shutdown`: 0 once the acknowledgement is printed
/// - `run`: the reported result code; Ctrl-C kills the child
pub async fn run(args: CliArgs) -> Result<i32> {
    let config = load_or_default(args.config.as_deref())?;
    debug!(?config, "engine config loaded");
    let engine = Engine::new(config);

    match args.command {
        EngineCommand::Init => {
            engine.init(InitRequest::default(), &TextSink).await?;
            Ok(0)
        }
        EngineCommand::Shutdown => {
            engine.shutdown(ShutdownRequest::default(), &TextSink).await?;
            Ok(0)
        }
        EngineCommand::Run(run_args) => run_once(&engine, run_args).await,
    }
}

async fn run_once(engine: &Engine, args: RunArgs) -> Result<i32> {
    let sink: Arc<dyn ResponseSink> = match args.format {
        OutputFormat::Text => Arc::new(TextSink),
        OutputFormat::Json => Arc::new(JsonLinesSink),
    };

    let request = RunRequest {
        working_dir: args.working_dir,
        args: args.args,
        env_vars: args.env.into_iter().collect(),
        allocate_pseudo_tty: args.pty,
    };

    // Ctrl-C → kill the child. If the handler cannot be installed, never
    // cancel.
    let cancel = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!(error = %e, "failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    match engine.run_until(request, sink, cancel).await {
        Ok(result) => Ok(result.code),
        // The error unit has already been printed by the sink.
        Err(EngineError::Spawn { .. } | EngineError::PtyError(_)) => Ok(ERROR_RESULT_CODE),
        Err(e) => Err(e.into()),
    }
}
