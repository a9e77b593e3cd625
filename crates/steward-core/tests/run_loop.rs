//! End-to-end run loop tests with mock providers.

use async_trait::async_trait;
use pretty_assertions::assert_eq;
use serde_json::json;
use std::path::Path;
use std::sync::Arc;
use steward_config::{RoutingConfig, StewardConfig};
use steward_core::{
    Assistant, ConversationState, HandlerError, HandlerReply, LanguageModel, Message, ModelError,
    Route, TaskHandler,
};
use steward_memory::{JsonlMemoryStore, MemoryKind, MemoryManager, MemoryManagerOptions};
use steward_test_utils::{FailingEmbedder, FixedModel, KeywordEmbedder, ScriptedModel, SlowModel};
use tempfile::tempdir;

struct ProbeHandler;

#[async_trait]
impl TaskHandler for ProbeHandler {
    fn name(&self) -> &str {
        "probe"
    }

    fn capability(&self) -> &str {
        "answering test probes"
    }

    async fn execute(&self, state: &ConversationState) -> Result<HandlerReply, HandlerError> {
        Ok(HandlerReply::new(
            format!("handled: {}", state.user_query),
            json!({ "query": state.user_query }),
        ))
    }
}

/// Routes to its label until the prompt shows a dispatch happened, then
/// terminates. Safe under concurrent runs, unlike a scripted queue.
struct OnceThenDone(&'static str);

#[async_trait]
impl LanguageModel for OnceThenDone {
    async fn classify(&self, prompt: &str, _labels: &[String]) -> Result<String, ModelError> {
        if prompt.contains("Handlers already run") {
            Ok("done".to_string())
        } else {
            Ok(self.0.to_string())
        }
    }

    async fn complete(
        &self,
        _system_prompt: &str,
        _messages: &[Message],
    ) -> Result<String, ModelError> {
        Ok("ack".to_string())
    }
}

fn memory_at(dir: &Path) -> Arc<MemoryManager> {
    let store = Arc::new(JsonlMemoryStore::new(dir, 2).expect("memory store"));
    Arc::new(MemoryManager::new(
        store,
        Arc::new(KeywordEmbedder::new(2)),
        MemoryManagerOptions::default(),
    ))
}

fn assistant_with(model: Arc<dyn LanguageModel>, memory: Arc<MemoryManager>) -> Assistant {
    Assistant::builder(StewardConfig::default())
        .model(model)
        .memory(memory)
        .handler(Arc::new(ProbeHandler))
        .build()
        .expect("build assistant")
}

/// A classified request should reach its handler and the run should end
/// with that handler's reply.
#[tokio::test]
async fn routed_request_reaches_the_handler() {
    let temp = tempdir().expect("tempdir");
    let model = Arc::new(ScriptedModel::new(&["probe"]));
    let assistant = assistant_with(model, memory_at(temp.path()));

    let result = assistant.run("plan my day", None).await;

    assert_eq!(result.final_message, "handled: plan my day");
    assert_eq!(result.state.handler_history, vec!["probe".to_string()]);
    assert_eq!(result.state.handler_results["probe"]["status"], json!("ok"));
    assert_eq!(result.state.next_handler, Route::Terminate);
    assert!(result.state.errors.is_empty());
}

/// A model that never produces a routable label must exhaust the retry
/// budget and terminate with an empty dispatch history.
#[tokio::test]
async fn unparseable_routing_exhausts_retries_and_terminates() {
    let temp = tempdir().expect("tempdir");
    let model = Arc::new(FixedModel::new("gibberish"));
    let assistant = assistant_with(model, memory_at(temp.path()));

    let result = assistant.run("plan my day", None).await;

    assert!(result.state.handler_history.is_empty());
    assert_eq!(result.state.retry_count, 4);
    assert_eq!(result.state.errors.len(), 5);
    assert_eq!(
        result.state.errors.last().expect("terminal error"),
        "terminated after exceeding 3 retries"
    );
    assert_eq!(result.state.next_handler, Route::Terminate);
    assert!(result.final_message.contains("try again"));
}

/// Once a handler has completed, asking for it again within the run is
/// refused instead of ping-ponging.
#[tokio::test]
async fn completed_handler_is_not_dispatched_twice() {
    let temp = tempdir().expect("tempdir");
    let model = Arc::new(ScriptedModel::new(&["probe", "probe"]));
    let assistant = assistant_with(model, memory_at(temp.path()));

    let result = assistant.run("plan my day", None).await;

    assert_eq!(result.state.handler_history, vec!["probe".to_string()]);
    assert_eq!(result.state.errors.len(), 1);
    assert!(result.state.errors[0].contains("refusing repeat dispatch"));
    assert_eq!(result.final_message, "handled: plan my day");
}

/// Every run should leave one episodic record describing the exchange.
#[tokio::test]
async fn finished_run_is_recorded_as_an_episodic_memory() {
    let temp = tempdir().expect("tempdir");
    let memory = memory_at(temp.path());
    let assistant = assistant_with(Arc::new(ScriptedModel::new(&["probe"])), memory.clone());

    assistant.run("plan my day", None).await;

    let episodes = memory
        .list(Some(MemoryKind::Episodic))
        .await
        .expect("list episodic");
    assert_eq!(episodes.len(), 1);
    assert!(episodes[0].content.contains("user: plan my day"));
    assert!(episodes[0].content.contains("assistant: handled: plan my day"));
}

/// Retrieval failures degrade to an empty context and an error entry;
/// the request itself still gets handled.
#[tokio::test]
async fn memory_retrieval_failure_is_reported_not_fatal() {
    let temp = tempdir().expect("tempdir");
    let store = Arc::new(JsonlMemoryStore::new(temp.path(), 2).expect("memory store"));
    let memory = Arc::new(MemoryManager::new(
        store,
        Arc::new(FailingEmbedder::new()),
        MemoryManagerOptions::default(),
    ));
    let assistant = assistant_with(Arc::new(ScriptedModel::new(&["probe"])), memory);

    let result = assistant.run("plan my day", None).await;

    assert_eq!(result.final_message, "handled: plan my day");
    assert!(result.state.retrieved_memories.is_empty());
    assert!(
        result
            .state
            .errors
            .iter()
            .any(|error| error.starts_with("memory retrieval failed")),
        "errors were: {:?}",
        result.state.errors
    );
}

/// The wall-clock budget forces termination even while the model stalls.
#[tokio::test]
async fn run_timeout_forces_termination() {
    let temp = tempdir().expect("tempdir");
    let config = StewardConfig::builder()
        .routing(RoutingConfig {
            call_timeout_ms: 30,
            run_timeout_ms: Some(50),
            ..RoutingConfig::default()
        })
        .build();
    let assistant = Assistant::builder(config)
        .model(Arc::new(SlowModel::new(std::time::Duration::from_millis(200))))
        .memory(memory_at(temp.path()))
        .handler(Arc::new(ProbeHandler))
        .build()
        .expect("build assistant");

    let result = assistant.run("plan my day", None).await;

    assert!(
        result
            .state
            .errors
            .iter()
            .any(|error| error.contains("run timed out")),
        "errors were: {:?}",
        result.state.errors
    );
    assert_eq!(result.state.next_handler, Route::Terminate);
    assert!(result.state.handler_history.is_empty());
}

/// Concurrent runs on one assistant must not leak state into each other.
#[tokio::test]
async fn concurrent_runs_do_not_share_state() {
    let temp = tempdir().expect("tempdir");
    let assistant = Arc::new(assistant_with(
        Arc::new(OnceThenDone("probe")),
        memory_at(temp.path()),
    ));

    let (left, right) = tokio::join!(
        assistant.run("first request", None),
        assistant.run("second request", None)
    );

    assert_ne!(left.session_id, right.session_id);
    assert_eq!(left.final_message, "handled: first request");
    assert_eq!(right.final_message, "handled: second request");
    assert_eq!(left.state.handler_history, vec!["probe".to_string()]);
    assert_eq!(right.state.handler_history, vec!["probe".to_string()]);
}

/// The blocking entry point drives the same loop without an ambient
/// runtime.
#[test]
fn blocking_entry_point_completes_a_run() {
    let temp = tempdir().expect("tempdir");
    let model = Arc::new(ScriptedModel::new(&["probe"]));
    let assistant = assistant_with(model, memory_at(temp.path()));

    let result = assistant
        .run_blocking("plan my day", None)
        .expect("blocking run");

    assert_eq!(result.final_message, "handled: plan my day");
    assert_eq!(result.state.handler_history, vec!["probe".to_string()]);
}
