//! Shared conversation state threaded through the routing loop.

use crate::types::{Message, Role, SessionId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use steward_memory::DecayedMemory;

/// Where control goes next, written only by the supervisor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Route {
    /// Control belongs to the supervisor.
    Supervisor,
    /// Dispatch to the named handler next.
    Handler(String),
    /// The run is finished.
    Terminate,
}

/// Mutable state owned by one run.
///
/// Exactly one component mutates this at a time: the supervisor between
/// decisions, the dispatched handler while it runs. Handlers append to
/// the transcript and the result map; they never touch routing fields
/// beyond returning control to the supervisor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationState {
    /// Session this state belongs to.
    pub session_id: SessionId,
    /// Originating request for the current run.
    pub user_query: String,
    /// Ordered transcript, append-only within a run.
    pub messages: Vec<Message>,
    /// Memories retrieved once at the start of the run.
    pub retrieved_memories: Vec<DecayedMemory>,
    /// Next routing target.
    pub next_handler: Route,
    /// Handlers invoked this run, in dispatch order.
    pub handler_history: Vec<String>,
    /// One result payload per completed handler invocation.
    pub handler_results: HashMap<String, Value>,
    /// Failure descriptions accumulated this run.
    pub errors: Vec<String>,
    /// Recoverable failures seen so far this run.
    pub retry_count: u32,
    /// When the session was created.
    pub created_at: DateTime<Utc>,
}

impl ConversationState {
    /// Fresh state for a session with an empty transcript.
    pub fn new(session_id: SessionId) -> Self {
        Self {
            session_id,
            user_query: String::new(),
            messages: Vec::new(),
            retrieved_memories: Vec::new(),
            next_handler: Route::Supervisor,
            handler_history: Vec::new(),
            handler_results: HashMap::new(),
            errors: Vec::new(),
            retry_count: 0,
            created_at: Utc::now(),
        }
    }

    /// Reset run-scoped fields for a new query, keeping the transcript.
    pub fn begin_run(&mut self, user_query: impl Into<String>) {
        self.user_query = user_query.into();
        self.retrieved_memories.clear();
        self.next_handler = Route::Supervisor;
        self.handler_history.clear();
        self.handler_results.clear();
        self.errors.clear();
        self.retry_count = 0;
    }

    /// Content of the most recent assistant message, if any.
    pub fn last_assistant_message(&self) -> Option<&str> {
        self.messages
            .iter()
            .rev()
            .find(|message| message.role == Role::Assistant)
            .map(|message| message.content.as_str())
    }
}
