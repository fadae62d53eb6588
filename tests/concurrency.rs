// tests/concurrency.rs

#![cfg(unix)]

mod common;
use crate::common::{RecordingSink, RunRequestBuilder, init_tracing, shell_engine, with_timeout};

use std::error::Error;
use std::sync::Arc;

type TestResult = Result<(), Box<dyn Error>>;

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn parallel_runs_do_not_share_output() -> TestResult {
    init_tracing();

    let engine = shell_engine();
    let first_sink = Arc::new(RecordingSink::new());
    let second_sink = Arc::new(RecordingSink::new());

    let first = {
        let engine = engine.clone();
        let sink = first_sink.clone();
        tokio::spawn(async move {
            let request = RunRequestBuilder::script(
                "for i in 1 2 3 4 5; do printf aaaa; sleep 0.05; done; exit 3",
            )
            .build();
            engine.run(request, sink).await
        })
    };
    let second = {
        let engine = engine.clone();
        let sink = second_sink.clone();
        tokio::spawn(async move {
            let request = RunRequestBuilder::script(
                "for i in 1 2 3 4 5; do printf bbbb >&2; sleep 0.05; done; exit 5",
            )
            .build();
            engine.run(request, sink).await
        })
    };

    let (first, second) = with_timeout(async { tokio::join!(first, second) }).await;
    assert_eq!(first??.code, 3);
    assert_eq!(second??.code, 5);

    assert_eq!(first_sink.stdout(), "a".repeat(20));
    assert_eq!(first_sink.stderr(), "");
    assert_eq!(first_sink.final_code(), Some(3));

    assert_eq!(second_sink.stdout(), "");
    assert_eq!(second_sink.stderr(), "b".repeat(20));
    assert_eq!(second_sink.final_code(), Some(5));
    Ok(())
}
