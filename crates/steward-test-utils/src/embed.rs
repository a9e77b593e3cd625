use async_trait::async_trait;
use steward_memory::{Embedder, MemoryError};

/// Embeds by keyword lookup: the first configured keyword contained in
/// the text wins. Unmatched text gets a unit vector on the first axis.
#[derive(Debug, Clone)]
pub struct KeywordEmbedder {
    dimensions: usize,
    entries: Vec<(String, Vec<f32>)>,
}

impl KeywordEmbedder {
    pub fn new(dimensions: usize) -> Self {
        Self {
            dimensions,
            entries: Vec::new(),
        }
    }

    pub fn with(mut self, keyword: impl Into<String>, vector: Vec<f32>) -> Self {
        self.entries.push((keyword.into().to_lowercase(), vector));
        self
    }
}

#[async_trait]
impl Embedder for KeywordEmbedder {
    fn dimensions(&self) -> usize {
        self.dimensions
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>, MemoryError> {
        let lowered = text.to_lowercase();
        for (keyword, vector) in &self.entries {
            if lowered.contains(keyword) {
                return Ok(vector.clone());
            }
        }
        let mut fallback = vec![0.0; self.dimensions];
        if let Some(first) = fallback.first_mut() {
            *first = 1.0;
        }
        Ok(fallback)
    }
}

#[derive(Debug, Clone, Default)]
pub struct FailingEmbedder;

impl FailingEmbedder {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Embedder for FailingEmbedder {
    fn dimensions(&self) -> usize {
        2
    }

    async fn embed(&self, _text: &str) -> Result<Vec<f32>, MemoryError> {
        Err(MemoryError::Embedding("embedder offline".to_string()))
    }
}
