//! Error types for memory operations.

/// Errors returned by memory stores, embedders, and the manager.
#[derive(Debug, thiserror::Error)]
pub enum MemoryError {
    /// IO error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    /// Serialization error.
    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),
    /// Embedding provider failure.
    #[error("embedding failed: {0}")]
    Embedding(String),
    /// A vector did not match the store's fixed dimensionality.
    #[error("embedding dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },
    /// Invalid manager or policy options.
    #[error("invalid memory options: {0}")]
    InvalidOptions(String),
    /// A record kind string could not be parsed.
    #[error("unknown memory kind: {0}")]
    UnknownKind(String),
}
