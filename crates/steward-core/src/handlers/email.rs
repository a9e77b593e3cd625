//! Email drafting handler.

use crate::handler::{HandlerError, HandlerReply, TaskHandler};
use crate::provider::LanguageModel;
use crate::state::ConversationState;
use async_trait::async_trait;
use log::warn;
use serde_json::json;
use std::sync::Arc;
use steward_memory::{MemoryKind, MemoryManager};

const PREFERENCES_QUERY: &str = "email style and tone preferences";
const PREFERENCES_LIMIT: usize = 3;

/// Drafts and replies to email, honouring stored style preferences.
pub struct EmailHandler {
    model: Arc<dyn LanguageModel>,
    memory: Arc<MemoryManager>,
}

impl EmailHandler {
    pub fn new(model: Arc<dyn LanguageModel>, memory: Arc<MemoryManager>) -> Self {
        Self { model, memory }
    }
}

#[async_trait]
impl TaskHandler for EmailHandler {
    fn name(&self) -> &str {
        "email"
    }

    fn capability(&self) -> &str {
        "drafting, replying to, and summarizing email"
    }

    async fn execute(&self, state: &ConversationState) -> Result<HandlerReply, HandlerError> {
        let preferences = match self
            .memory
            .search(
                PREFERENCES_QUERY,
                Some(MemoryKind::Semantic),
                PREFERENCES_LIMIT,
                true,
            )
            .await
        {
            Ok(found) => found,
            Err(err) => {
                warn!("email preference lookup failed (error={err})");
                Vec::new()
            }
        };

        let mut system = String::from(
            "You are an email assistant. Draft clear, well-structured email text for the user's request.\n",
        );
        if !preferences.is_empty() {
            system.push_str("Known preferences:\n");
            for memory in &preferences {
                system.push_str(&format!("- {}\n", memory.record.content));
            }
        }

        let reply = self.model.complete(&system, &state.messages).await?;
        Ok(HandlerReply::new(
            reply.clone(),
            json!({ "reply": reply, "preferences_used": preferences.len() }),
        ))
    }
}
