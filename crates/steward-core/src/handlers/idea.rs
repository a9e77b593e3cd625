//! Idea capture and brainstorming handler.

use crate::handler::{HandlerError, HandlerReply, TaskHandler};
use crate::provider::LanguageModel;
use crate::state::ConversationState;
use async_trait::async_trait;
use log::{info, warn};
use serde_json::json;
use std::sync::Arc;
use steward_memory::{MemoryKind, MemoryManager};

/// Phrases that signal the user wants the idea stored.
const CAPTURE_HINTS: &[&str] = &["capture", "save", "note", "remember"];
const RELATED_LIMIT: usize = 5;

/// Brainstorms with the user and stores ideas on request.
pub struct IdeaHandler {
    model: Arc<dyn LanguageModel>,
    memory: Arc<MemoryManager>,
}

impl IdeaHandler {
    pub fn new(model: Arc<dyn LanguageModel>, memory: Arc<MemoryManager>) -> Self {
        Self { model, memory }
    }
}

#[async_trait]
impl TaskHandler for IdeaHandler {
    fn name(&self) -> &str {
        "idea"
    }

    fn capability(&self) -> &str {
        "brainstorming and capturing ideas or notes"
    }

    async fn execute(&self, state: &ConversationState) -> Result<HandlerReply, HandlerError> {
        let related = match self
            .memory
            .search(
                &state.user_query,
                Some(MemoryKind::Semantic),
                RELATED_LIMIT,
                true,
            )
            .await
        {
            Ok(found) => found,
            Err(err) => {
                warn!("related note lookup failed (error={err})");
                Vec::new()
            }
        };

        let lowered = state.user_query.to_lowercase();
        let wants_capture = CAPTURE_HINTS.iter().any(|hint| lowered.contains(hint));
        // Unlike the lookups above, a failed capture fails the handler.
        let captured = if wants_capture {
            let id = self
                .memory
                .record_fact(
                    &state.user_query,
                    "idea",
                    json!({ "captured_from": "conversation" }),
                )
                .await?;
            info!("captured idea (id={id})");
            Some(id)
        } else {
            None
        };

        let mut system = String::from(
            "You are a brainstorming partner. Build on the user's idea with concrete next steps.\n",
        );
        if captured.is_some() {
            system.push_str("The idea has been saved to the user's notes; acknowledge that.\n");
        }
        if !related.is_empty() {
            system.push_str("Related notes:\n");
            for memory in &related {
                system.push_str(&format!("- {}\n", memory.record.content));
            }
        }

        let reply = self.model.complete(&system, &state.messages).await?;
        Ok(HandlerReply::new(
            reply.clone(),
            json!({
                "reply": reply,
                "captured_id": captured.map(|id| id.to_string()),
                "related_notes": related.len(),
            }),
        ))
    }
}

#[cfg(test)]
mod tests {
    // Tests link the externally built crate (via the self
    // dev-dependency) so steward-test-utils mocks implement the same
    // trait instances as the handler under test.
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use std::path::Path;
    use std::sync::Arc;
    use steward_core::{ConversationState, HandlerError, IdeaHandler, Message, TaskHandler};
    use steward_memory::{
        Embedder, JsonlMemoryStore, MemoryKind, MemoryManager, MemoryManagerOptions,
    };
    use steward_test_utils::{FailingEmbedder, FixedModel, KeywordEmbedder};
    use tempfile::tempdir;
    use uuid::Uuid;

    fn manager_with(embedder: impl Embedder + 'static, dir: &Path) -> Arc<MemoryManager> {
        let store = Arc::new(JsonlMemoryStore::new(dir, embedder.dimensions()).unwrap());
        Arc::new(MemoryManager::new(
            store,
            Arc::new(embedder),
            MemoryManagerOptions::default(),
        ))
    }

    fn state(query: &str) -> ConversationState {
        let mut state = ConversationState::new(Uuid::new_v4());
        state.begin_run(query);
        state.messages.push(Message::user(query));
        state
    }

    #[tokio::test]
    async fn capture_phrase_stores_a_semantic_record() {
        let dir = tempdir().unwrap();
        let memory = manager_with(KeywordEmbedder::new(2), dir.path());
        let model = FixedModel::new("unused").with_completion("Saved. A few angles to explore:");
        let handler = IdeaHandler::new(Arc::new(model), memory.clone());

        let reply = handler
            .execute(&state("Remember this idea: balcony solar panels"))
            .await
            .unwrap();

        assert_ne!(reply.payload["captured_id"], json!(null));
        let notes = memory.list(Some(MemoryKind::Semantic)).await.unwrap();
        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0].content, "Remember this idea: balcony solar panels");
    }

    #[tokio::test]
    async fn plain_brainstorming_stores_nothing() {
        let dir = tempdir().unwrap();
        let memory = manager_with(KeywordEmbedder::new(2), dir.path());
        let model = FixedModel::new("unused").with_completion("What about a pilot?");
        let handler = IdeaHandler::new(Arc::new(model), memory.clone());

        let reply = handler
            .execute(&state("what could we do with balcony solar?"))
            .await
            .unwrap();

        assert_eq!(reply.payload["captured_id"], json!(null));
        assert!(memory.list(None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn capture_failure_is_a_handler_failure() {
        let dir = tempdir().unwrap();
        let memory = manager_with(FailingEmbedder::new(), dir.path());
        let model = FixedModel::new("unused");
        let handler = IdeaHandler::new(Arc::new(model), memory);

        let err = handler
            .execute(&state("please save this idea"))
            .await
            .unwrap_err();

        assert!(matches!(err, HandlerError::Memory(_)));
    }
}
