//! Routing decisions over shared conversation state.

use crate::handler::HandlerRegistry;
use crate::provider::LanguageModel;
use crate::state::{ConversationState, Route};
use log::{debug, warn};
use std::sync::Arc;
use std::time::Duration;
use steward_config::RoutingConfig;

/// Classification label that ends the run.
pub const TERMINATE_LABEL: &str = "done";

/// Outcome of one routing decision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    /// Dispatch the named handler next.
    Dispatch(String),
    /// A recoverable failure was recorded; decide again.
    Retry,
    /// The run is complete.
    Terminate,
}

/// Chooses the next handler for a request, or ends the run.
///
/// The supervisor is the only component that writes routing fields. It
/// never appends to the handler history; that stays a record of actual
/// dispatches.
pub struct Supervisor {
    model: Arc<dyn LanguageModel>,
    capabilities: Vec<(String, String)>,
    labels: Vec<String>,
    max_retries: u32,
    max_handler_passes: u32,
    call_timeout: Duration,
}

impl Supervisor {
    pub fn new(
        model: Arc<dyn LanguageModel>,
        handlers: &HandlerRegistry,
        routing: &RoutingConfig,
    ) -> Self {
        let capabilities = handlers.capabilities();
        let mut labels = handlers.names();
        labels.push(TERMINATE_LABEL.to_string());
        Self {
            model,
            capabilities,
            labels,
            max_retries: routing.max_retries,
            max_handler_passes: routing.max_handler_passes,
            call_timeout: Duration::from_millis(routing.call_timeout_ms),
        }
    }

    /// Decide where control goes next.
    ///
    /// The retry cap is checked before anything else, including before the
    /// classifier is consulted, so a run that keeps failing cannot loop
    /// forever. Classification failures, timeouts, unroutable labels, and
    /// blocked repeat dispatches all count against the same budget.
    pub async fn decide(&self, state: &mut ConversationState) -> Decision {
        if state.retry_count > self.max_retries {
            warn!(
                "retry cap exceeded (session_id={}, retries={}, max={})",
                state.session_id, state.retry_count, self.max_retries
            );
            state.errors.push(format!("terminated after exceeding {} retries", self.max_retries));
            state.next_handler = Route::Terminate;
            return Decision::Terminate;
        }

        let prompt = self.routing_prompt(state);
        let raw = match tokio::time::timeout(
            self.call_timeout,
            self.model.classify(&prompt, &self.labels),
        )
        .await
        {
            Ok(Ok(label)) => label,
            Ok(Err(err)) => {
                warn!(
                    "classification failed (session_id={}, error={})",
                    state.session_id, err
                );
                state.errors.push(format!("classification failed: {err}"));
                state.retry_count += 1;
                return Decision::Retry;
            }
            Err(_) => {
                warn!(
                    "classification timed out (session_id={}, timeout_ms={})",
                    state.session_id,
                    self.call_timeout.as_millis()
                );
                state.errors.push("classification timed out".to_string());
                state.retry_count += 1;
                return Decision::Retry;
            }
        };

        let label = raw.trim().to_lowercase();
        if label == TERMINATE_LABEL {
            debug!("routing complete (session_id={})", state.session_id);
            state.next_handler = Route::Terminate;
            return Decision::Terminate;
        }

        if !self.labels.iter().any(|known| known == &label) {
            warn!(
                "unroutable classification (session_id={}, label={:?})",
                state.session_id, raw
            );
            state.errors.push(format!("unroutable classification: {raw:?}"));
            state.retry_count += 1;
            return Decision::Retry;
        }

        let passes = state
            .handler_history
            .iter()
            .filter(|seen| seen.as_str() == label)
            .count() as u32;
        if state.handler_results.contains_key(&label) && passes >= self.max_handler_passes {
            warn!(
                "blocked repeat dispatch (session_id={}, handler={}, passes={})",
                state.session_id, label, passes
            );
            state.errors.push(format!("refusing repeat dispatch to completed handler {label}"));
            state.retry_count += 1;
            return Decision::Retry;
        }

        debug!(
            "dispatching handler (session_id={}, handler={})",
            state.session_id, label
        );
        state.next_handler = Route::Handler(label.clone());
        Decision::Dispatch(label)
    }

    /// Prompt presented to the routing classifier.
    fn routing_prompt(&self, state: &ConversationState) -> String {
        let mut prompt =
            String::from("You route requests for a personal assistant.\nCapabilities:\n");
        for (name, capability) in &self.capabilities {
            prompt.push_str(&format!("- {name}: {capability}\n"));
        }
        prompt.push_str(&format!(
            "Reply with exactly one capability name, or \"{TERMINATE_LABEL}\" once the request is fully handled.\n"
        ));
        if !state.retrieved_memories.is_empty() {
            prompt.push_str("\nRelevant context:\n");
            for memory in &state.retrieved_memories {
                prompt.push_str(&format!(
                    "- {}: {}\n",
                    memory.record.kind, memory.record.content
                ));
            }
        }
        if !state.handler_history.is_empty() {
            prompt.push_str(&format!(
                "\nHandlers already run: {}\n",
                state.handler_history.join(", ")
            ));
        }
        prompt.push_str(&format!("\nRequest: {}\n", state.user_query));
        prompt
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::{HandlerError, HandlerReply, TaskHandler};
    use crate::provider::ModelError;
    use crate::types::Message;
    use async_trait::async_trait;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use uuid::Uuid;

    struct ScriptedModel {
        reply: &'static str,
        calls: AtomicUsize,
    }

    impl ScriptedModel {
        fn new(reply: &'static str) -> Self {
            Self {
                reply,
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl LanguageModel for ScriptedModel {
        async fn classify(&self, _prompt: &str, _labels: &[String]) -> Result<String, ModelError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.reply.to_string())
        }

        async fn complete(
            &self,
            _system_prompt: &str,
            _messages: &[Message],
        ) -> Result<String, ModelError> {
            Ok(String::new())
        }
    }

    struct OfflineModel;

    #[async_trait]
    impl LanguageModel for OfflineModel {
        async fn classify(&self, _prompt: &str, _labels: &[String]) -> Result<String, ModelError> {
            Err(ModelError::Provider("connection refused".to_string()))
        }

        async fn complete(
            &self,
            _system_prompt: &str,
            _messages: &[Message],
        ) -> Result<String, ModelError> {
            Err(ModelError::Provider("connection refused".to_string()))
        }
    }

    struct StalledModel;

    #[async_trait]
    impl LanguageModel for StalledModel {
        async fn classify(&self, _prompt: &str, _labels: &[String]) -> Result<String, ModelError> {
            tokio::time::sleep(Duration::from_millis(200)).await;
            Ok("email".to_string())
        }

        async fn complete(
            &self,
            _system_prompt: &str,
            _messages: &[Message],
        ) -> Result<String, ModelError> {
            Ok(String::new())
        }
    }

    struct StubHandler(&'static str);

    #[async_trait]
    impl TaskHandler for StubHandler {
        fn name(&self) -> &str {
            self.0
        }

        fn capability(&self) -> &str {
            "stub"
        }

        async fn execute(&self, _state: &ConversationState) -> Result<HandlerReply, HandlerError> {
            Ok(HandlerReply::new("ok", json!(null)))
        }
    }

    fn registry() -> HandlerRegistry {
        let mut registry = HandlerRegistry::new();
        registry.register(Arc::new(StubHandler("email"))).unwrap();
        registry.register(Arc::new(StubHandler("calendar"))).unwrap();
        registry
    }

    fn supervisor(model: Arc<dyn LanguageModel>, routing: &RoutingConfig) -> Supervisor {
        Supervisor::new(model, &registry(), routing)
    }

    fn state() -> ConversationState {
        let mut state = ConversationState::new(Uuid::new_v4());
        state.begin_run("plan my week");
        state
    }

    #[tokio::test]
    async fn retry_cap_terminates_without_consulting_the_model() {
        let model = Arc::new(ScriptedModel::new("email"));
        let routing = RoutingConfig::default();
        let supervisor = supervisor(model.clone(), &routing);

        let mut state = state();
        state.retry_count = routing.max_retries + 1;
        let decision = supervisor.decide(&mut state).await;

        assert_eq!(decision, Decision::Terminate);
        assert_eq!(state.next_handler, Route::Terminate);
        assert_eq!(model.calls.load(Ordering::SeqCst), 0);
        assert_eq!(
            state.errors,
            vec!["terminated after exceeding 3 retries".to_string()]
        );
    }

    #[tokio::test]
    async fn done_label_terminates_leniently() {
        let routing = RoutingConfig::default();
        let supervisor = supervisor(Arc::new(ScriptedModel::new("  DONE ")), &routing);

        let mut state = state();
        let decision = supervisor.decide(&mut state).await;

        assert_eq!(decision, Decision::Terminate);
        assert_eq!(state.next_handler, Route::Terminate);
        assert!(state.errors.is_empty());
    }

    #[tokio::test]
    async fn known_label_dispatches() {
        let routing = RoutingConfig::default();
        let supervisor = supervisor(Arc::new(ScriptedModel::new("email")), &routing);

        let mut state = state();
        let decision = supervisor.decide(&mut state).await;

        assert_eq!(decision, Decision::Dispatch("email".to_string()));
        assert_eq!(state.next_handler, Route::Handler("email".to_string()));
        assert!(state.handler_history.is_empty());
        assert_eq!(state.retry_count, 0);
    }

    #[tokio::test]
    async fn unroutable_label_counts_as_retry() {
        let routing = RoutingConfig::default();
        let supervisor = supervisor(Arc::new(ScriptedModel::new("pizza")), &routing);

        let mut state = state();
        let decision = supervisor.decide(&mut state).await;

        assert_eq!(decision, Decision::Retry);
        assert_eq!(state.retry_count, 1);
        assert_eq!(
            state.errors,
            vec!["unroutable classification: \"pizza\"".to_string()]
        );
        assert_eq!(state.next_handler, Route::Supervisor);
    }

    #[tokio::test]
    async fn classification_failure_counts_as_retry() {
        let routing = RoutingConfig::default();
        let supervisor = supervisor(Arc::new(OfflineModel), &routing);

        let mut state = state();
        let decision = supervisor.decide(&mut state).await;

        assert_eq!(decision, Decision::Retry);
        assert_eq!(state.retry_count, 1);
        assert_eq!(
            state.errors,
            vec!["classification failed: model provider error: connection refused".to_string()]
        );
    }

    #[tokio::test]
    async fn classification_timeout_counts_as_retry() {
        let routing = RoutingConfig {
            call_timeout_ms: 20,
            ..RoutingConfig::default()
        };
        let supervisor = supervisor(Arc::new(StalledModel), &routing);

        let mut state = state();
        let decision = supervisor.decide(&mut state).await;

        assert_eq!(decision, Decision::Retry);
        assert_eq!(state.retry_count, 1);
        assert_eq!(state.errors, vec!["classification timed out".to_string()]);
    }

    #[tokio::test]
    async fn completed_handler_is_not_redispatched() {
        let routing = RoutingConfig::default();
        let supervisor = supervisor(Arc::new(ScriptedModel::new("email")), &routing);

        let mut state = state();
        state.handler_history.push("email".to_string());
        state
            .handler_results
            .insert("email".to_string(), json!({"status": "ok"}));

        let decision = supervisor.decide(&mut state).await;
        assert_eq!(decision, Decision::Retry);
        assert_eq!(state.retry_count, 1);
        assert_eq!(
            state.errors,
            vec!["refusing repeat dispatch to completed handler email".to_string()]
        );
    }

    #[tokio::test]
    async fn extra_pass_allowance_permits_redispatch() {
        let routing = RoutingConfig {
            max_handler_passes: 2,
            ..RoutingConfig::default()
        };
        let supervisor = supervisor(Arc::new(ScriptedModel::new("email")), &routing);

        let mut state = state();
        state.handler_history.push("email".to_string());
        state
            .handler_results
            .insert("email".to_string(), json!({"status": "ok"}));

        let decision = supervisor.decide(&mut state).await;
        assert_eq!(decision, Decision::Dispatch("email".to_string()));
    }

    #[tokio::test]
    async fn garbage_routing_terminates_within_the_retry_bound() {
        let routing = RoutingConfig::default();
        let supervisor = supervisor(Arc::new(ScriptedModel::new("garbage")), &routing);

        let mut state = state();
        let mut decisions = 0;
        loop {
            decisions += 1;
            if supervisor.decide(&mut state).await == Decision::Terminate {
                break;
            }
            assert!(decisions < 50, "supervisor failed to terminate");
        }

        assert!(decisions as u32 <= routing.max_retries + registry().len() as u32);
        assert_eq!(state.next_handler, Route::Terminate);
        assert!(state.handler_history.is_empty());
    }
}
