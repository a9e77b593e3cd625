use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;
use steward_core::{LanguageModel, Message, ModelError};

#[derive(Debug, Clone)]
pub struct FixedModel {
    label: String,
    completion: String,
}

impl FixedModel {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            completion: "mock completion".to_string(),
        }
    }

    pub fn with_completion(mut self, completion: impl Into<String>) -> Self {
        self.completion = completion.into();
        self
    }
}

#[async_trait]
impl LanguageModel for FixedModel {
    async fn classify(&self, _prompt: &str, _labels: &[String]) -> Result<String, ModelError> {
        Ok(self.label.clone())
    }

    async fn complete(
        &self,
        _system_prompt: &str,
        _messages: &[Message],
    ) -> Result<String, ModelError> {
        Ok(self.completion.clone())
    }
}

pub struct ScriptedModel {
    labels: Mutex<VecDeque<String>>,
    completion: String,
}

impl ScriptedModel {
    /// Classifications are served in order; once exhausted, "done".
    pub fn new(labels: &[&str]) -> Self {
        Self {
            labels: Mutex::new(labels.iter().map(|label| label.to_string()).collect()),
            completion: "mock completion".to_string(),
        }
    }

    pub fn with_completion(mut self, completion: impl Into<String>) -> Self {
        self.completion = completion.into();
        self
    }
}

#[async_trait]
impl LanguageModel for ScriptedModel {
    async fn classify(&self, _prompt: &str, _labels: &[String]) -> Result<String, ModelError> {
        Ok(self
            .labels
            .lock()
            .pop_front()
            .unwrap_or_else(|| "done".to_string()))
    }

    async fn complete(
        &self,
        _system_prompt: &str,
        _messages: &[Message],
    ) -> Result<String, ModelError> {
        Ok(self.completion.clone())
    }
}

#[derive(Clone)]
pub struct RecordingModel {
    label: String,
    completion: String,
    pub system_prompts: Arc<Mutex<Vec<String>>>,
}

impl RecordingModel {
    pub fn new(label: impl Into<String>, completion: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            completion: completion.into(),
            system_prompts: Arc::new(Mutex::new(Vec::new())),
        }
    }
}

#[async_trait]
impl LanguageModel for RecordingModel {
    async fn classify(&self, _prompt: &str, _labels: &[String]) -> Result<String, ModelError> {
        Ok(self.label.clone())
    }

    async fn complete(
        &self,
        system_prompt: &str,
        _messages: &[Message],
    ) -> Result<String, ModelError> {
        self.system_prompts.lock().push(system_prompt.to_string());
        Ok(self.completion.clone())
    }
}

#[derive(Debug, Clone)]
pub struct FailingModel {
    message: String,
}

impl FailingModel {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[async_trait]
impl LanguageModel for FailingModel {
    async fn classify(&self, _prompt: &str, _labels: &[String]) -> Result<String, ModelError> {
        Err(ModelError::Provider(self.message.clone()))
    }

    async fn complete(
        &self,
        _system_prompt: &str,
        _messages: &[Message],
    ) -> Result<String, ModelError> {
        Err(ModelError::Provider(self.message.clone()))
    }
}

#[derive(Debug, Clone)]
pub struct SlowModel {
    delay: Duration,
    label: String,
}

impl SlowModel {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            label: "done".to_string(),
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }
}

#[async_trait]
impl LanguageModel for SlowModel {
    async fn classify(&self, _prompt: &str, _labels: &[String]) -> Result<String, ModelError> {
        tokio::time::sleep(self.delay).await;
        Ok(self.label.clone())
    }

    async fn complete(
        &self,
        _system_prompt: &str,
        _messages: &[Message],
    ) -> Result<String, ModelError> {
        tokio::time::sleep(self.delay).await;
        Ok("late reply".to_string())
    }
}
