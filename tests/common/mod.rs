#![allow(dead_code)]

pub use tfengine_test_utils::{
    EngineConfigBuilder, RecordingSink, RejectingSink, RunRequestBuilder, SharedBuffer,
    init_tracing, with_timeout,
};

use tfengine::engine::Engine;

/// Engine whose command is `sh`, so each request is `-c <script>`.
pub fn shell_engine() -> Engine {
    Engine::new(EngineConfigBuilder::shell().build())
}
