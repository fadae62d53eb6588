// tests/lifecycle.rs

mod common;
use crate::common::{EngineConfigBuilder, RecordingSink, init_tracing};

use std::error::Error;

use tfengine::config::EngineConfig;
use tfengine::engine::Engine;
use tfengine::types::{InitRequest, ShutdownRequest};

type TestResult = Result<(), Box<dyn Error>>;

#[tokio::test]
async fn init_sends_single_acknowledgement() -> TestResult {
    init_tracing();

    let engine = Engine::new(EngineConfig::default());
    let sink = RecordingSink::new();
    engine.init(InitRequest::default(), &sink).await?;

    let responses = sink.responses();
    assert_eq!(responses.len(), 1);
    assert_eq!(responses[0].stdout, "Terraform Initialization completed\n");
    assert_eq!(responses[0].stderr, "");
    assert_eq!(responses[0].result_code, 0);
    Ok(())
}

#[tokio::test]
async fn shutdown_sends_single_acknowledgement() -> TestResult {
    init_tracing();

    let engine = Engine::new(EngineConfig::default());
    let sink = RecordingSink::new();
    engine.shutdown(ShutdownRequest::default(), &sink).await?;

    let responses = sink.responses();
    assert_eq!(responses.len(), 1);
    assert_eq!(responses[0].stdout, "Terraform Shutdown completed\n");
    assert_eq!(responses[0].result_code, 0);
    Ok(())
}

#[tokio::test]
async fn init_message_comes_from_config() -> TestResult {
    init_tracing();

    let engine = Engine::new(
        EngineConfigBuilder::new()
            .command("tofu")
            .init_message("OpenTofu ready\n")
            .build(),
    );
    let sink = RecordingSink::new();
    engine.init(InitRequest::default(), &sink).await?;

    assert_eq!(sink.stdout(), "OpenTofu ready\n");
    assert_eq!(sink.final_code(), Some(0));
    Ok(())
}
