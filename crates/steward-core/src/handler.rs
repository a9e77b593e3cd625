//! Task handler contract and registry.

use crate::error::CoreError;
use crate::provider::{ModelError, ToolError};
use crate::state::{ConversationState, Route};
use crate::supervisor::TERMINATE_LABEL;
use crate::types::Message;
use async_trait::async_trait;
use log::{debug, info, warn};
use serde_json::{Value, json};
use std::sync::Arc;
use std::time::Duration;
use steward_memory::MemoryError;
use thiserror::Error;

/// Errors a handler may fail with.
///
/// None of these escape the dispatch boundary; `TaskHandler::process`
/// converts them into state entries.
#[derive(Debug, Error)]
pub enum HandlerError {
    #[error("{0}")]
    Model(#[from] ModelError),

    #[error("{0}")]
    Tool(#[from] ToolError),

    #[error("memory access failed: {0}")]
    Memory(#[from] MemoryError),

    #[error("{0}")]
    Task(String),
}

/// Successful handler output, before state bookkeeping.
#[derive(Debug, Clone, PartialEq)]
pub struct HandlerReply {
    /// Assistant-facing response text, appended to the transcript.
    pub message: String,
    /// Structured result recorded under the handler's name.
    pub payload: Value,
}

impl HandlerReply {
    pub fn new(message: impl Into<String>, payload: Value) -> Self {
        Self {
            message: message.into(),
            payload,
        }
    }
}

/// One specialized task processor behind the router.
#[async_trait]
pub trait TaskHandler: Send + Sync {
    /// Stable routing name. Doubles as the classification label, so it
    /// must be lowercase.
    fn name(&self) -> &str;

    /// One-line capability summary shown to the routing classifier.
    fn capability(&self) -> &str;

    /// Perform the task against read-only state.
    async fn execute(&self, state: &ConversationState) -> Result<HandlerReply, HandlerError>;

    /// Drive the handler under a timeout and apply the state contract.
    ///
    /// Whatever happens inside `execute`, afterwards the result map holds
    /// an entry under this handler's name, the history has grown by one,
    /// and control is back with the supervisor. Failures are recorded
    /// rather than raised; a timeout additionally counts against the
    /// run's retry budget.
    async fn process(&self, state: &mut ConversationState, call_timeout: Duration) {
        let name = self.name().to_string();
        debug!(
            "handler starting (handler={}, session_id={})",
            name, state.session_id
        );
        match tokio::time::timeout(call_timeout, self.execute(&*state)).await {
            Ok(Ok(reply)) => {
                state
                    .handler_results
                    .insert(name.clone(), json!({ "status": "ok", "payload": reply.payload }));
                state.messages.push(Message::assistant(reply.message));
                info!("handler completed (handler={})", name);
            }
            Ok(Err(err)) => {
                warn!("handler failed (handler={}, error={})", name, err);
                state.errors.push(format!("{name} handler failed: {err}"));
                state
                    .handler_results
                    .insert(name.clone(), json!({ "status": "error", "error": err.to_string() }));
            }
            Err(_) => {
                warn!(
                    "handler timed out (handler={}, timeout_ms={})",
                    name,
                    call_timeout.as_millis()
                );
                state.errors.push(format!("{name} handler timed out"));
                state
                    .handler_results
                    .insert(name.clone(), json!({ "status": "error", "error": "timed out" }));
                state.retry_count += 1;
            }
        }
        state.handler_history.push(name);
        state.next_handler = Route::Supervisor;
    }
}

/// Handlers keyed by routing name, in registration order.
#[derive(Clone, Default)]
pub struct HandlerRegistry {
    handlers: Vec<Arc<dyn TaskHandler>>,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler. Names must be unique, lowercase, and not the
    /// reserved termination label.
    pub fn register(&mut self, handler: Arc<dyn TaskHandler>) -> Result<(), CoreError> {
        let name = handler.name().to_string();
        if name.is_empty()
            || !name
                .chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_' || c == '-')
        {
            return Err(CoreError::Config(format!(
                "handler name must be a lowercase label, got {name:?}"
            )));
        }
        if name == TERMINATE_LABEL {
            return Err(CoreError::Config(format!(
                "handler name {TERMINATE_LABEL:?} is reserved"
            )));
        }
        if self.get(&name).is_some() {
            return Err(CoreError::Config(format!("duplicate handler name: {name}")));
        }
        info!("registered handler (handler={name})");
        self.handlers.push(handler);
        Ok(())
    }

    /// Look up a handler by routing name.
    pub fn get(&self, name: &str) -> Option<Arc<dyn TaskHandler>> {
        self.handlers
            .iter()
            .find(|handler| handler.name() == name)
            .cloned()
    }

    /// Routing names in registration order.
    pub fn names(&self) -> Vec<String> {
        self.handlers
            .iter()
            .map(|handler| handler.name().to_string())
            .collect()
    }

    /// Registered (name, capability) pairs in registration order.
    pub fn capabilities(&self) -> Vec<(String, String)> {
        self.handlers
            .iter()
            .map(|handler| (handler.name().to_string(), handler.capability().to_string()))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}
