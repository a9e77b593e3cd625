//! Calendar and scheduling handler.

use crate::handler::{HandlerError, HandlerReply, TaskHandler};
use crate::provider::LanguageModel;
use crate::state::ConversationState;
use async_trait::async_trait;
use log::warn;
use serde_json::json;
use std::sync::Arc;
use steward_memory::MemoryManager;

const CONTEXT_QUERY: &str = "calendar scheduling and availability preferences";

/// Handles scheduling requests with a budgeted context assembled from
/// stored memories.
pub struct CalendarHandler {
    model: Arc<dyn LanguageModel>,
    memory: Arc<MemoryManager>,
}

impl CalendarHandler {
    pub fn new(model: Arc<dyn LanguageModel>, memory: Arc<MemoryManager>) -> Self {
        Self { model, memory }
    }
}

#[async_trait]
impl TaskHandler for CalendarHandler {
    fn name(&self) -> &str {
        "calendar"
    }

    fn capability(&self) -> &str {
        "scheduling meetings and checking availability"
    }

    async fn execute(&self, state: &ConversationState) -> Result<HandlerReply, HandlerError> {
        let context = match self
            .memory
            .build_context(CONTEXT_QUERY, self.memory.context_budget())
            .await
        {
            Ok(context) => context,
            Err(err) => {
                warn!("calendar context assembly failed (error={err})");
                String::new()
            }
        };

        let mut system = String::from(
            "You are a scheduling assistant. Propose concrete times and confirm calendar changes.\n",
        );
        if !context.is_empty() {
            system.push_str("Stored context:\n");
            system.push_str(&context);
            system.push('\n');
        }

        let reply = self.model.complete(&system, &state.messages).await?;
        Ok(HandlerReply::new(
            reply.clone(),
            json!({ "reply": reply, "context_used": !context.is_empty() }),
        ))
    }
}
