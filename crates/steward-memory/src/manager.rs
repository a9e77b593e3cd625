//! Record classification, decayed recall, and context assembly.

use crate::decay::DecayPolicy;
use crate::embed::Embedder;
use crate::error::MemoryError;
use crate::model::{DecayedMemory, MemoryKind, MemoryRecord, Turn};
use crate::store::MemoryStore;
use chrono::Utc;
use log::{debug, info};
use serde_json::{Value, json};
use std::cmp::Ordering;
use std::path::Path;
use std::sync::Arc;
use uuid::Uuid;

/// Store-level candidates fetched per requested result, leaving headroom
/// for post-decay reordering.
const SEARCH_OVERSAMPLE: usize = 2;

/// Token estimation interface for context budgeting.
pub trait TokenCounter: Send + Sync {
    /// Estimated token count for a piece of text.
    fn count(&self, text: &str) -> usize;
}

/// Heuristic counter assuming roughly four characters per token.
#[derive(Debug, Clone, Copy, Default)]
pub struct HeuristicTokenCounter;

impl TokenCounter for HeuristicTokenCounter {
    fn count(&self, text: &str) -> usize {
        text.chars().count().div_ceil(4)
    }
}

/// Tuning knobs for a `MemoryManager`.
#[derive(Debug, Clone)]
pub struct MemoryManagerOptions {
    /// Age discount applied during recall.
    pub decay: DecayPolicy,
    /// Minimum final score a result must reach.
    pub min_score: f32,
    /// Default number of results per query.
    pub recall_limit: usize,
    /// Default token budget for assembled context.
    pub context_token_budget: usize,
}

impl Default for MemoryManagerOptions {
    fn default() -> Self {
        Self {
            decay: DecayPolicy::default(),
            min_score: 0.3,
            recall_limit: 5,
            context_token_budget: 2000,
        }
    }
}

/// Classifies, stores, and recalls memory records.
///
/// All writes go through here so every record gets an id, a kind, a
/// timestamp, and an embedding at creation. Recall scores candidates
/// with the decay policy and orders them by final relevance.
pub struct MemoryManager {
    store: Arc<dyn MemoryStore>,
    embedder: Arc<dyn Embedder>,
    options: MemoryManagerOptions,
    token_counter: Arc<dyn TokenCounter>,
}

impl MemoryManager {
    /// Create a manager over a store and embedder with the given options.
    pub fn new(
        store: Arc<dyn MemoryStore>,
        embedder: Arc<dyn Embedder>,
        options: MemoryManagerOptions,
    ) -> Self {
        Self {
            store,
            embedder,
            options,
            token_counter: Arc::new(HeuristicTokenCounter),
        }
    }

    /// Replace the token counter used for context budgeting.
    pub fn with_token_counter(mut self, counter: Arc<dyn TokenCounter>) -> Self {
        self.token_counter = counter;
        self
    }

    /// Default per-query result count.
    pub fn recall_limit(&self) -> usize {
        self.options.recall_limit
    }

    /// Default token budget for assembled context.
    pub fn context_budget(&self) -> usize {
        self.options.context_token_budget
    }

    /// Record a conversational interaction as an episodic memory.
    ///
    /// Turns are flattened into a role-prefixed transcript for embedding.
    pub async fn record_interaction(
        &self,
        turns: &[Turn],
        metadata: Value,
    ) -> Result<Uuid, MemoryError> {
        let content = turns
            .iter()
            .map(|turn| format!("{}: {}", turn.role, turn.content))
            .collect::<Vec<_>>()
            .join("\n");
        self.insert_record(MemoryKind::Episodic, content, metadata)
            .await
    }

    /// Record a standalone fact or preference as a semantic memory.
    pub async fn record_fact(
        &self,
        fact: &str,
        category: &str,
        metadata: Value,
    ) -> Result<Uuid, MemoryError> {
        let metadata = with_entries(metadata, vec![("category", json!(category))]);
        self.insert_record(MemoryKind::Semantic, fact.to_string(), metadata)
            .await
    }

    /// Record a multi-step recipe as a procedural memory.
    ///
    /// Steps are joined into numbered content for embedding and kept
    /// structurally in metadata so the recipe can be reconstructed.
    pub async fn record_procedure(
        &self,
        task: &str,
        steps: &[String],
        metadata: Value,
    ) -> Result<Uuid, MemoryError> {
        let numbered = steps
            .iter()
            .enumerate()
            .map(|(index, step)| format!("{}. {}", index + 1, step))
            .collect::<Vec<_>>()
            .join("\n");
        let content = format!("Task: {task}\nSteps:\n{numbered}");
        let metadata = with_entries(
            metadata,
            vec![("task", json!(task)), ("steps", json!(steps))],
        );
        self.insert_record(MemoryKind::Procedural, content, metadata)
            .await
    }

    /// Remove a record permanently; returns whether it existed.
    pub async fn forget(&self, id: Uuid) -> Result<bool, MemoryError> {
        let removed = self.store.remove(id).await?;
        if removed {
            info!("forgot memory record (id={id})");
        }
        Ok(removed)
    }

    /// Enumerate stored records, optionally restricted to one kind.
    pub async fn list(&self, kind: Option<MemoryKind>) -> Result<Vec<MemoryRecord>, MemoryError> {
        let mut records = self.store.all().await?;
        if let Some(kind) = kind {
            records.retain(|record| record.kind == kind);
        }
        Ok(records)
    }

    /// Recall the most relevant records for a query.
    ///
    /// The store is asked for more candidates than `limit` so decay can
    /// reorder them; results below the minimum score are dropped, the
    /// rest sorted by final score with newer records breaking ties.
    pub async fn search(
        &self,
        query: &str,
        kind: Option<MemoryKind>,
        limit: usize,
        apply_decay: bool,
    ) -> Result<Vec<DecayedMemory>, MemoryError> {
        if limit == 0 {
            return Ok(Vec::new());
        }
        let embedding = self.embedder.embed(query).await?;
        let top_k = limit.saturating_mul(SEARCH_OVERSAMPLE);
        let candidates = self.store.search(&embedding, top_k, kind).await?;

        let now = Utc::now();
        let mut scored: Vec<DecayedMemory> = candidates
            .into_iter()
            .map(|(record, raw_score)| {
                let decay_factor = if apply_decay {
                    self.options
                        .decay
                        .factor(DecayPolicy::age_days(record.created_at, now))
                } else {
                    1.0
                };
                DecayedMemory {
                    raw_score,
                    decay_factor,
                    final_score: raw_score * decay_factor,
                    record,
                }
            })
            .filter(|memory| memory.final_score >= self.options.min_score)
            .collect();

        scored.sort_by(|a, b| {
            b.final_score
                .partial_cmp(&a.final_score)
                .unwrap_or(Ordering::Equal)
                .then_with(|| b.record.created_at.cmp(&a.record.created_at))
        });
        scored.truncate(limit);
        debug!(
            "memory search (limit={}, decay={}, returned={})",
            limit,
            apply_decay,
            scored.len()
        );
        Ok(scored)
    }

    /// Assemble a context string for a query under a token budget.
    ///
    /// Entries are appended most relevant first; an entry that would push
    /// the estimate past the budget is excluded wholesale and assembly
    /// stops there.
    pub async fn build_context(
        &self,
        query: &str,
        max_tokens: usize,
    ) -> Result<String, MemoryError> {
        let memories = self
            .search(query, None, self.options.recall_limit, true)
            .await?;
        let mut context = String::new();
        for memory in &memories {
            let entry = format!("{}: {}", memory.record.kind, memory.record.content);
            let candidate = if context.is_empty() {
                entry
            } else {
                format!("{context}\n{entry}")
            };
            if self.token_counter.count(&candidate) > max_tokens {
                break;
            }
            context = candidate;
        }
        Ok(context)
    }

    /// Dump every stored record to a JSON file; returns the count.
    pub async fn export(&self, path: impl AsRef<Path>) -> Result<usize, MemoryError> {
        let records = self.store.all().await?;
        let payload = serde_json::to_string_pretty(&records)?;
        std::fs::write(path.as_ref(), payload)?;
        info!(
            "exported memory records (count={}, path={})",
            records.len(),
            path.as_ref().display()
        );
        Ok(records.len())
    }

    /// Restore records from a JSON dump, preserving ids, kinds,
    /// timestamps, and embeddings; returns the count.
    pub async fn import(&self, path: impl AsRef<Path>) -> Result<usize, MemoryError> {
        let contents = std::fs::read_to_string(path.as_ref())?;
        let records: Vec<MemoryRecord> = serde_json::from_str(&contents)?;
        let mut imported = 0usize;
        for record in records {
            self.store.insert(record).await?;
            imported += 1;
        }
        info!(
            "imported memory records (count={}, path={})",
            imported,
            path.as_ref().display()
        );
        Ok(imported)
    }

    async fn insert_record(
        &self,
        kind: MemoryKind,
        content: String,
        metadata: Value,
    ) -> Result<Uuid, MemoryError> {
        let embedding = self.embedder.embed(&content).await?;
        let record = MemoryRecord {
            id: Uuid::new_v4(),
            kind,
            content,
            metadata,
            created_at: Utc::now(),
            embedding,
        };
        let id = self.store.insert(record).await?;
        info!("recorded memory (kind={kind}, id={id})");
        Ok(id)
    }
}

/// Merge extra entries into caller metadata, keeping it an object.
fn with_entries(metadata: Value, entries: Vec<(&str, Value)>) -> Value {
    let mut map = match metadata {
        Value::Object(map) => map,
        Value::Null => serde_json::Map::new(),
        other => {
            let mut map = serde_json::Map::new();
            map.insert("extra".to_string(), other);
            map
        }
    };
    for (key, value) in entries {
        map.insert(key.to_string(), value);
    }
    Value::Object(map)
}
