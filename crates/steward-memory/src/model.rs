//! Memory record model and derived scoring views.

use crate::error::MemoryError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Classification assigned to a record at creation, never changed after.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum MemoryKind {
    /// Record of a specific conversational interaction.
    Episodic,
    /// Standalone fact or preference.
    Semantic,
    /// Multi-step task recipe.
    Procedural,
}

impl MemoryKind {
    /// Stable lowercase name used in storage and prompts.
    pub fn as_str(&self) -> &'static str {
        match self {
            MemoryKind::Episodic => "episodic",
            MemoryKind::Semantic => "semantic",
            MemoryKind::Procedural => "procedural",
        }
    }
}

impl fmt::Display for MemoryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MemoryKind {
    type Err = MemoryError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_lowercase().as_str() {
            "episodic" => Ok(MemoryKind::Episodic),
            "semantic" => Ok(MemoryKind::Semantic),
            "procedural" => Ok(MemoryKind::Procedural),
            other => Err(MemoryError::UnknownKind(other.to_string())),
        }
    }
}

/// Persisted memory record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MemoryRecord {
    /// Record identifier.
    pub id: Uuid,
    /// Classification, fixed at creation.
    pub kind: MemoryKind,
    /// Record content.
    pub content: String,
    /// Caller-supplied metadata kept alongside the content.
    pub metadata: serde_json::Value,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Content embedding with the store's fixed dimensionality.
    pub embedding: Vec<f32>,
}

/// One ranked record from a recall pass.
///
/// Derived per query and never persisted on its own, though it is
/// serializable so conversation snapshots can carry retrieval results.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DecayedMemory {
    /// The underlying stored record.
    pub record: MemoryRecord,
    /// Similarity to the query before any age discount.
    pub raw_score: f32,
    /// Age discount produced by the decay policy.
    pub decay_factor: f32,
    /// `raw_score * decay_factor`; recall orders on this.
    pub final_score: f32,
}

/// One role-tagged turn of an interaction to be recorded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Turn {
    /// Speaker role, e.g. "user" or "assistant".
    pub role: String,
    /// Turn text.
    pub content: String,
}

impl Turn {
    /// Build a turn from a role and its content.
    pub fn new(role: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: role.into(),
            content: content.into(),
        }
    }
}
