//! Batteries-included entry point for steward.
//!
//! Re-exports the config, core, and memory crates under one roof and
//! bundles a logging bootstrap, so most consumers need only this one
//! dependency.

/// Re-export for convenience.
pub use steward_config as config;
pub use steward_core as core;
/// Re-export for convenience.
pub use steward_memory as memory;

pub use steward_config::StewardConfig;
pub use steward_core::{
    Assistant, AssistantBuilder, CalendarHandler, ConversationState, CoreError, EmailHandler,
    IdeaHandler, JsonCheckpointStore, LanguageModel, Message, ModelError, Role, RunResult,
    TaskHandler, ToolAgentHandler, ToolInvoker,
};
pub use steward_memory::{Embedder, JsonlMemoryStore, MemoryError, MemoryKind, MemoryManager};

#[inline]
/// Wire up env_logger when the "logging" feature is enabled.
///
/// Compiles to nothing without the feature, so binaries can call it
/// unconditionally at startup.
pub fn init_logging() {
    #[cfg(feature = "logging")]
    {
        let _ = env_logger::try_init();
    }
}
