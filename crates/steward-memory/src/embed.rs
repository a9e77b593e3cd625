//! Embedding provider abstraction.

use crate::error::MemoryError;
use async_trait::async_trait;

/// Embedding computation used for both inserts and queries.
///
/// Implementations must produce vectors of a fixed dimensionality and
/// report provider failures as `MemoryError::Embedding`.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Dimensionality of produced vectors.
    fn dimensions(&self) -> usize;

    /// Compute the embedding for a piece of text.
    async fn embed(&self, text: &str) -> Result<Vec<f32>, MemoryError>;
}
