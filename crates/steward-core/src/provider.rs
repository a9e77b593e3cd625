//! External capability interfaces consumed by the assistant core.
//!
//! The core never talks to a model, embedding, or tool backend directly;
//! callers inject implementations of these traits at construction time.

use crate::types::Message;
use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

/// Errors surfaced by language model providers.
#[derive(Debug, Error)]
pub enum ModelError {
    /// Provider or transport failure.
    #[error("model provider error: {0}")]
    Provider(String),
}

/// Language model capability used for routing and replies.
#[async_trait]
pub trait LanguageModel: Send + Sync {
    /// Pick one of the allowed labels for a prompt.
    ///
    /// Implementations should answer with a bare label; callers treat the
    /// response leniently (trimmed, case-insensitive) and handle anything
    /// unrecognized themselves.
    async fn classify(&self, prompt: &str, labels: &[String]) -> Result<String, ModelError>;

    /// Produce a reply given a system prompt and the transcript so far.
    async fn complete(&self, system_prompt: &str, messages: &[Message])
    -> Result<String, ModelError>;
}

/// An external tool advertised to the assistant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolSpec {
    pub name: String,
    pub description: String,
}

impl ToolSpec {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
        }
    }
}

/// Errors surfaced by tool invokers.
#[derive(Debug, Error)]
pub enum ToolError {
    #[error("unknown tool: {0}")]
    Unknown(String),

    #[error("tool execution failed: {0}")]
    ExecutionFailed(String),
}

/// Black-box access to external tools.
#[async_trait]
pub trait ToolInvoker: Send + Sync {
    /// Tools currently available, in advertisement order.
    fn tools(&self) -> Vec<ToolSpec>;

    /// Invoke a named tool with JSON arguments.
    async fn invoke(&self, name: &str, arguments: Value) -> Result<Value, ToolError>;
}
