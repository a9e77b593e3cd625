//! Assistant facade driving the supervisor and handler loop.

use crate::checkpoint::{CheckpointStore, JsonCheckpointStore};
use crate::error::CoreError;
use crate::handler::{HandlerRegistry, TaskHandler};
use crate::provider::LanguageModel;
use crate::state::{ConversationState, Route};
use crate::supervisor::{Decision, Supervisor};
use crate::types::{Message, SessionId};
use log::{debug, error, info, warn};
use serde_json::json;
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};
use steward_config::StewardConfig;
use steward_memory::{MemoryManager, Turn};
use uuid::Uuid;

/// Returned when no handler produced an assistant message.
const DEGRADED_REPLY: &str =
    "Something went wrong while handling your request; please try again.";

/// Outcome of one `Assistant::run` invocation.
#[derive(Debug)]
pub struct RunResult {
    /// Session that produced the response.
    pub session_id: SessionId,
    /// Final assistant response text.
    pub final_message: String,
    /// Conversation state at termination, including history and errors.
    pub state: ConversationState,
}

/// Routes requests through registered handlers and records the outcome
/// in memory.
///
/// Built once via [`Assistant::builder`] and shared behind an `Arc` if
/// multiple tasks need it; runs only touch their own state.
pub struct Assistant {
    supervisor: Supervisor,
    handlers: HandlerRegistry,
    memory: Arc<MemoryManager>,
    checkpoints: Option<Arc<dyn CheckpointStore>>,
    call_timeout: Duration,
    run_timeout: Option<Duration>,
}

// Manual impl: the supervisor, registry, and stores hold trait objects
// without `Debug` bounds, so the derive is unavailable.
impl fmt::Debug for Assistant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Assistant")
            .field("handlers", &self.handlers.names())
            .field("sessions", &self.checkpoints.is_some())
            .field("call_timeout", &self.call_timeout)
            .field("run_timeout", &self.run_timeout)
            .finish_non_exhaustive()
    }
}

impl Assistant {
    pub fn builder(config: StewardConfig) -> AssistantBuilder {
        AssistantBuilder::new(config)
    }

    /// Route one request to completion.
    ///
    /// This never fails outward: routing and handler problems are
    /// recorded on the returned state's error log, and the caller always
    /// gets a final message. Passing a known session id resumes that
    /// conversation's transcript.
    pub async fn run(
        &self,
        user_query: impl Into<String>,
        session_id: Option<SessionId>,
    ) -> RunResult {
        let user_query = user_query.into();
        let mut state = self.resolve_state(session_id, &user_query);
        let run_start = state.messages.len().saturating_sub(1);
        info!(
            "starting run (session_id={}, query_len={})",
            state.session_id,
            user_query.len()
        );

        match self
            .memory
            .search(&user_query, None, self.memory.recall_limit(), true)
            .await
        {
            Ok(memories) => {
                debug!(
                    "retrieved memories (session_id={}, count={})",
                    state.session_id,
                    memories.len()
                );
                state.retrieved_memories = memories;
            }
            Err(err) => {
                warn!(
                    "memory retrieval failed (session_id={}, error={})",
                    state.session_id, err
                );
                state.errors.push(format!("memory retrieval failed: {err}"));
            }
        }

        self.drive(&mut state).await;
        self.record_interaction(&mut state, run_start).await;
        self.save_checkpoint(&mut state);

        let final_message = state
            .last_assistant_message()
            .unwrap_or(DEGRADED_REPLY)
            .to_string();
        info!(
            "run complete (session_id={}, handlers={}, errors={})",
            state.session_id,
            state.handler_history.len(),
            state.errors.len()
        );
        RunResult {
            session_id: state.session_id,
            final_message,
            state,
        }
    }

    /// Blocking wrapper over [`Assistant::run`] for synchronous callers.
    pub fn run_blocking(
        &self,
        user_query: impl Into<String>,
        session_id: Option<SessionId>,
    ) -> Result<RunResult, CoreError> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;
        Ok(runtime.block_on(self.run(user_query, session_id)))
    }

    /// Checkpoint store in use, when sessions are enabled.
    pub fn checkpoints(&self) -> Option<Arc<dyn CheckpointStore>> {
        self.checkpoints.clone()
    }

    /// Memory manager backing this assistant.
    pub fn memory(&self) -> Arc<MemoryManager> {
        self.memory.clone()
    }

    fn resolve_state(&self, session_id: Option<SessionId>, user_query: &str) -> ConversationState {
        let mut load_error = None;
        let mut state = match session_id {
            Some(id) => {
                let restored = match self.checkpoints.as_ref() {
                    Some(store) => match store.load(id) {
                        Ok(found) => found,
                        Err(err) => {
                            warn!("checkpoint load failed (session_id={id}, error={err})");
                            load_error = Some(format!("checkpoint load failed: {err}"));
                            None
                        }
                    },
                    None => None,
                };
                restored.unwrap_or_else(|| ConversationState::new(id))
            }
            None => ConversationState::new(Uuid::new_v4()),
        };
        state.begin_run(user_query);
        if let Some(message) = load_error {
            state.errors.push(message);
        }
        state.messages.push(Message::user(user_query));
        state
    }

    /// Alternate supervisor decisions and handler execution until the
    /// supervisor terminates the run or the wall-clock budget runs out.
    async fn drive(&self, state: &mut ConversationState) {
        let started = Instant::now();
        loop {
            if let Some(run_timeout) = self.run_timeout
                && started.elapsed() >= run_timeout
            {
                error!(
                    "run timed out (session_id={}, elapsed_ms={})",
                    state.session_id,
                    started.elapsed().as_millis()
                );
                state.errors.push(format!("run timed out after {}ms", run_timeout.as_millis()));
                state.next_handler = Route::Terminate;
                break;
            }
            match self.supervisor.decide(state).await {
                Decision::Terminate => break,
                Decision::Retry => continue,
                Decision::Dispatch(name) => match self.handlers.get(&name) {
                    Some(handler) => handler.process(state, self.call_timeout).await,
                    // Dispatched labels come from the registry, so this
                    // only fires if a caller mutated routing fields by hand.
                    None => {
                        state.errors.push(format!("routed to unregistered handler: {name}"));
                        state.retry_count += 1;
                        state.next_handler = Route::Supervisor;
                    }
                },
            }
        }
    }

    /// Persist the finished run as one episodic memory.
    async fn record_interaction(&self, state: &mut ConversationState, run_start: usize) {
        let turns: Vec<Turn> = state.messages[run_start..]
            .iter()
            .map(|message| Turn::new(message.role.as_str(), message.content.clone()))
            .collect();
        if turns.is_empty() {
            return;
        }
        let metadata = json!({
            "session_id": state.session_id,
            "handlers": state.handler_history,
        });
        if let Err(err) = self.memory.record_interaction(&turns, metadata).await {
            warn!(
                "episodic memory write failed (session_id={}, error={})",
                state.session_id, err
            );
            state.errors.push(format!("memory update failed: {err}"));
        }
    }

    fn save_checkpoint(&self, state: &mut ConversationState) {
        let Some(store) = self.checkpoints.as_ref() else {
            return;
        };
        if let Err(err) = store.save(state) {
            warn!(
                "checkpoint save failed (session_id={}, error={})",
                state.session_id, err
            );
            state.errors.push(format!("checkpoint save failed: {err}"));
        }
    }
}

/// Assembles an [`Assistant`] from a config plus injected capabilities.
pub struct AssistantBuilder {
    config: StewardConfig,
    model: Option<Arc<dyn LanguageModel>>,
    memory: Option<Arc<MemoryManager>>,
    checkpoints: Option<Arc<dyn CheckpointStore>>,
    handlers: Vec<Arc<dyn TaskHandler>>,
}

impl AssistantBuilder {
    pub fn new(config: StewardConfig) -> Self {
        Self {
            config,
            model: None,
            memory: None,
            checkpoints: None,
            handlers: Vec::new(),
        }
    }

    pub fn model(mut self, model: Arc<dyn LanguageModel>) -> Self {
        self.model = Some(model);
        self
    }

    pub fn memory(mut self, memory: Arc<MemoryManager>) -> Self {
        self.memory = Some(memory);
        self
    }

    pub fn checkpoints(mut self, store: Arc<dyn CheckpointStore>) -> Self {
        self.checkpoints = Some(store);
        self
    }

    pub fn handler(mut self, handler: Arc<dyn TaskHandler>) -> Self {
        self.handlers.push(handler);
        self
    }

    /// Validate configuration and wiring, producing a ready assistant.
    pub fn build(self) -> Result<Assistant, CoreError> {
        self.config.validate()?;
        let model = self
            .model
            .ok_or_else(|| CoreError::Config("a language model is required".to_string()))?;
        let memory = self
            .memory
            .ok_or_else(|| CoreError::Config("a memory manager is required".to_string()))?;
        if self.handlers.is_empty() {
            return Err(CoreError::Config(
                "at least one handler must be registered".to_string(),
            ));
        }
        let mut registry = HandlerRegistry::new();
        for handler in self.handlers {
            registry.register(handler)?;
        }

        // An injected store wins; otherwise the sessions config section
        // decides whether runs are checkpointed at all.
        let checkpoints = match self.checkpoints {
            Some(store) => Some(store),
            None if self.config.sessions.enabled => {
                let root = self
                    .config
                    .sessions
                    .path
                    .as_deref()
                    .unwrap_or(".steward/sessions");
                Some(Arc::new(JsonCheckpointStore::new(root)?) as Arc<dyn CheckpointStore>)
            }
            None => None,
        };

        let routing = &self.config.routing;
        let supervisor = Supervisor::new(model, &registry, routing);
        let call_timeout = Duration::from_millis(routing.call_timeout_ms);
        let run_timeout = routing.run_timeout_ms.map(Duration::from_millis);
        info!(
            "assistant ready (handlers={}, sessions={})",
            registry.len(),
            checkpoints.is_some()
        );
        Ok(Assistant {
            supervisor,
            handlers: registry,
            memory,
            checkpoints,
            call_timeout,
            run_timeout,
        })
    }
}
