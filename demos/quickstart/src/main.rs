//! Offline quickstart: routes two requests through the built-in handlers
//! with toy model and embedder implementations, then shows what the
//! memory layer recalls afterwards.

use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;
use steward::{
    Assistant, CalendarHandler, EmailHandler, Embedder, IdeaHandler, LanguageModel, MemoryError,
    Message, ModelError, Role, StewardConfig, init_logging,
};
use steward::config::{MemoryConfig, SessionsConfig};
use steward::core::manager_from_config;
use steward::memory::JsonlMemoryStore;

/// Deterministic toy embedder so the demo runs fully offline.
struct HashingEmbedder;

impl HashingEmbedder {
    const DIMENSIONS: usize = 16;
}

#[async_trait]
impl Embedder for HashingEmbedder {
    fn dimensions(&self) -> usize {
        Self::DIMENSIONS
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>, MemoryError> {
        let mut vector = vec![0.0f32; Self::DIMENSIONS];
        for (index, byte) in text.to_lowercase().bytes().enumerate() {
            vector[(index + byte as usize) % Self::DIMENSIONS] += 1.0;
        }
        Ok(vector)
    }
}

/// Routes by keyword match against the request line and answers with
/// canned text, so no provider account is needed to try the loop.
struct KeywordModel;

#[async_trait]
impl LanguageModel for KeywordModel {
    async fn classify(&self, prompt: &str, labels: &[String]) -> Result<String, ModelError> {
        if prompt.contains("Handlers already run") {
            return Ok("done".to_string());
        }
        let request = prompt
            .lines()
            .rev()
            .find_map(|line| line.strip_prefix("Request: "))
            .unwrap_or("")
            .to_lowercase();
        for label in labels {
            if label != "done" && request.contains(label.as_str()) {
                return Ok(label.clone());
            }
        }
        Ok("done".to_string())
    }

    async fn complete(
        &self,
        system_prompt: &str,
        messages: &[Message],
    ) -> Result<String, ModelError> {
        let latest = messages
            .iter()
            .rev()
            .find(|message| message.role == Role::User)
            .map(|message| message.content.as_str())
            .unwrap_or("");
        if system_prompt.contains("saved to the user's notes") {
            Ok(format!("Noted and saved: {latest}"))
        } else if system_prompt.starts_with("You are an email assistant") {
            Ok(format!(
                "Subject: Rooftop garden\n\nHi,\n\nQuick pitch based on your note: {latest}"
            ))
        } else {
            Ok(format!("Here's a thought on that: {latest}"))
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    init_logging();

    let root = std::env::temp_dir().join("steward-quickstart");
    let config = StewardConfig::builder()
        .memory(MemoryConfig {
            path: Some(root.join("memory").to_string_lossy().into_owned()),
            ..MemoryConfig::default()
        })
        .sessions(SessionsConfig {
            enabled: true,
            path: Some(root.join("sessions").to_string_lossy().into_owned()),
        })
        .build();

    let store_dir = config
        .memory
        .path
        .clone()
        .unwrap_or_else(|| ".steward/memory".to_string());
    let store = Arc::new(JsonlMemoryStore::new(
        store_dir,
        HashingEmbedder::DIMENSIONS,
    )?);
    let memory = Arc::new(manager_from_config(
        store,
        Arc::new(HashingEmbedder),
        &config.memory,
    )?);
    let model: Arc<dyn LanguageModel> = Arc::new(KeywordModel);

    let assistant = Assistant::builder(config)
        .model(model.clone())
        .memory(memory.clone())
        .handler(Arc::new(IdeaHandler::new(model.clone(), memory.clone())))
        .handler(Arc::new(EmailHandler::new(model.clone(), memory.clone())))
        .handler(Arc::new(CalendarHandler::new(model.clone(), memory.clone())))
        .build()?;

    let first = assistant
        .run("Save this idea: pitch a rooftop garden to the landlord", None)
        .await;
    println!("[{}] {}", first.state.handler_history.join(","), first.final_message);

    let second = assistant
        .run(
            "Draft an email pitching the rooftop garden",
            Some(first.session_id),
        )
        .await;
    println!("[{}] {}", second.state.handler_history.join(","), second.final_message);

    let recalled = memory.search("rooftop garden", None, 3, true).await?;
    println!("\nRecalled {} related memories:", recalled.len());
    for memory in recalled {
        let first_line = memory.record.content.lines().next().unwrap_or("");
        println!(
            "- [{:.2}] {}: {}",
            memory.final_score, memory.record.kind, first_line
        );
    }

    Ok(())
}
