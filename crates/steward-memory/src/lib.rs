//! Decaying memory store and recall support for steward.

pub mod decay;
pub mod embed;
pub mod error;
pub mod manager;
pub mod model;
pub mod store;

/// Age-based relevance decay policy.
pub use decay::DecayPolicy;
/// Embedding provider interface.
pub use embed::Embedder;
/// Memory error type.
pub use error::MemoryError;
/// Memory manager and context budgeting.
pub use manager::{HeuristicTokenCounter, MemoryManager, MemoryManagerOptions, TokenCounter};
/// Memory record model.
pub use model::{DecayedMemory, MemoryKind, MemoryRecord, Turn};
/// Store interface and default JSONL implementation.
pub use store::{JsonlMemoryStore, MemoryStore, cosine_similarity};
