//! External tool dispatch handler.

use crate::handler::{HandlerError, HandlerReply, TaskHandler};
use crate::provider::{LanguageModel, ToolInvoker, ToolSpec};
use crate::state::ConversationState;
use async_trait::async_trait;
use log::{debug, warn};
use serde_json::json;
use std::sync::Arc;
use steward_memory::{DecayedMemory, MemoryKind, MemoryManager};

/// Selection label for answering without a tool.
const NO_TOOL_LABEL: &str = "none";
const RECIPES_LIMIT: usize = 3;

/// Picks an external tool for the request, runs it, and folds the output
/// into the reply. Falls back to a plain completion when no tool fits.
pub struct ToolAgentHandler {
    model: Arc<dyn LanguageModel>,
    memory: Arc<MemoryManager>,
    invoker: Arc<dyn ToolInvoker>,
}

impl ToolAgentHandler {
    pub fn new(
        model: Arc<dyn LanguageModel>,
        memory: Arc<MemoryManager>,
        invoker: Arc<dyn ToolInvoker>,
    ) -> Self {
        Self {
            model,
            memory,
            invoker,
        }
    }

    fn selection_prompt(
        &self,
        specs: &[ToolSpec],
        recipes: &[DecayedMemory],
        query: &str,
    ) -> String {
        let mut prompt = String::from("Pick the tool best suited to the request.\nTools:\n");
        for spec in specs {
            prompt.push_str(&format!("- {}: {}\n", spec.name, spec.description));
        }
        prompt.push_str(&format!(
            "Reply with one tool name, or \"{NO_TOOL_LABEL}\" if no tool fits.\n"
        ));
        if !recipes.is_empty() {
            prompt.push_str("\nKnown procedures:\n");
            for memory in recipes {
                prompt.push_str(&format!("- {}\n", memory.record.content));
            }
        }
        prompt.push_str(&format!("\nRequest: {query}\n"));
        prompt
    }
}

#[async_trait]
impl TaskHandler for ToolAgentHandler {
    fn name(&self) -> &str {
        "tools"
    }

    fn capability(&self) -> &str {
        "running external tools for lookups and actions"
    }

    async fn execute(&self, state: &ConversationState) -> Result<HandlerReply, HandlerError> {
        let specs = self.invoker.tools();
        let recipes = match self
            .memory
            .search(
                &state.user_query,
                Some(MemoryKind::Procedural),
                RECIPES_LIMIT,
                true,
            )
            .await
        {
            Ok(found) => found,
            Err(err) => {
                warn!("procedure lookup failed (error={err})");
                Vec::new()
            }
        };

        if specs.is_empty() {
            let reply = self
                .model
                .complete(
                    "You are a capable assistant. No external tools are available; answer directly.\n",
                    &state.messages,
                )
                .await?;
            return Ok(HandlerReply::new(
                reply.clone(),
                json!({ "reply": reply, "tool": null }),
            ));
        }

        let mut labels: Vec<String> = specs.iter().map(|spec| spec.name.to_lowercase()).collect();
        labels.push(NO_TOOL_LABEL.to_string());
        let prompt = self.selection_prompt(&specs, &recipes, &state.user_query);
        let picked = self.model.classify(&prompt, &labels).await?;
        let picked = picked.trim().to_lowercase();

        let Some(spec) = specs.iter().find(|spec| spec.name.to_lowercase() == picked) else {
            debug!("no tool selected (label={picked:?})");
            let reply = self
                .model
                .complete(
                    "You are a capable assistant. Answer the request directly.\n",
                    &state.messages,
                )
                .await?;
            return Ok(HandlerReply::new(
                reply.clone(),
                json!({ "reply": reply, "tool": null }),
            ));
        };

        let output = self
            .invoker
            .invoke(&spec.name, json!({ "query": state.user_query }))
            .await?;
        let system = format!(
            "You are a capable assistant. The {} tool returned:\n{}\nAnswer the request using this result.\n",
            spec.name, output
        );
        let reply = self.model.complete(&system, &state.messages).await?;
        Ok(HandlerReply::new(
            reply.clone(),
            json!({ "reply": reply, "tool": spec.name, "output": output }),
        ))
    }
}
