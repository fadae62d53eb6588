// tests/run_errors.rs

#![cfg(unix)]

mod common;
use crate::common::{
    EngineConfigBuilder, RecordingSink, RejectingSink, RunRequestBuilder, init_tracing,
    shell_engine, with_timeout,
};

use std::sync::Arc;
use std::time::{Duration, Instant};

use tfengine::engine::Engine;
use tfengine::errors::EngineError;
use tfengine::types::ERROR_RESULT_CODE;

#[tokio::test]
async fn missing_working_dir_aborts_with_single_error_unit() {
    init_tracing();

    let engine = shell_engine();
    let sink = Arc::new(RecordingSink::new());
    let request = RunRequestBuilder::script("echo never")
        .working_dir("/definitely/not/a/real/dir")
        .build();

    let result = with_timeout(engine.run(request, sink.clone())).await;

    match result {
        Err(EngineError::Spawn { command, .. }) => assert!(command.starts_with("sh")),
        other => panic!("expected Spawn error, got {other:?}"),
    }

    let responses = sink.responses();
    assert_eq!(responses.len(), 1);
    assert_eq!(responses[0].result_code, ERROR_RESULT_CODE);
    assert!(responses[0].stdout.is_empty());
    assert!(!responses[0].stderr.is_empty());
}

#[tokio::test]
async fn missing_executable_aborts_with_single_error_unit() {
    init_tracing();

    let engine = Engine::new(
        EngineConfigBuilder::new()
            .command("tfengine-no-such-binary")
            .build(),
    );
    let sink = Arc::new(RecordingSink::new());

    let result = with_timeout(engine.run(RunRequestBuilder::new().arg("--help").build(), sink.clone())).await;
    assert!(matches!(result, Err(EngineError::Spawn { .. })));

    let responses = sink.responses();
    assert_eq!(responses.len(), 1);
    assert_ne!(responses[0].result_code, 0);
    assert!(responses[0].stderr.contains("tfengine-no-such-binary"));
}

#[tokio::test]
async fn killed_child_reports_fallback_code() {
    init_tracing();

    let engine = shell_engine();
    let sink = Arc::new(RecordingSink::new());
    let request = RunRequestBuilder::script("printf partial; kill -9 $$").build();

    let result = with_timeout(engine.run(request, sink.clone())).await.unwrap();
    assert_eq!(result.code, 1);
    assert_eq!(sink.stdout(), "partial");
    assert_eq!(sink.final_code(), Some(1));
}

#[tokio::test]
async fn disconnected_caller_stops_the_child() {
    init_tracing();

    let engine = shell_engine();
    let sink = Arc::new(RejectingSink::after(3));
    let request = RunRequestBuilder::script("printf abcdef; exec sleep 30").build();

    let started = Instant::now();
    let result = with_timeout(engine.run(request, sink.clone())).await;

    assert!(matches!(result, Err(EngineError::SinkClosed(_))));
    assert!(started.elapsed() < Duration::from_secs(10));

    let accepted: String = sink.accepted().iter().map(|r| r.stdout.as_str()).collect();
    assert_eq!(accepted, "abc");
}

#[tokio::test]
async fn cancellation_kills_the_child_and_still_reports() {
    init_tracing();

    let engine = shell_engine();
    let sink = Arc::new(RecordingSink::new());
    let request = RunRequestBuilder::script("printf waiting; exec sleep 30").build();

    let cancel = tokio::time::sleep(Duration::from_millis(300));
    let result = with_timeout(engine.run_until(request, sink.clone(), cancel))
        .await
        .unwrap();

    assert_eq!(result.code, 1);
    assert_eq!(sink.stdout(), "waiting");
    assert_eq!(sink.final_code(), Some(1));
}
