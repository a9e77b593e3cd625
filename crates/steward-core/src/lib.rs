//! Core routing and run-loop machinery for steward.
//!
//! This crate owns the conversation state, the supervisor that routes
//! requests, the task handler contract, and the assistant facade that
//! drives one request through retrieval, routing, handler execution,
//! memory writeback, and checkpointing.

pub mod checkpoint;
pub mod error;
pub mod executor;
pub mod handler;
pub mod handlers;
pub mod memory_link;
pub mod provider;
pub mod state;
pub mod supervisor;
pub mod types;

pub use checkpoint::{CheckpointError, CheckpointStore, CheckpointSummary, JsonCheckpointStore};
pub use error::CoreError;
pub use executor::{Assistant, AssistantBuilder, RunResult};
pub use handler::{HandlerError, HandlerRegistry, HandlerReply, TaskHandler};
pub use handlers::{CalendarHandler, EmailHandler, IdeaHandler, ToolAgentHandler};
pub use memory_link::{manager_from_config, manager_options_from_config};
pub use provider::{LanguageModel, ModelError, ToolError, ToolInvoker, ToolSpec};
pub use state::{ConversationState, Route};
pub use supervisor::{Decision, Supervisor, TERMINATE_LABEL};
pub use types::{Message, Role, SessionId};
