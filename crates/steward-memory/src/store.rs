//! Durable record store implementations.

use crate::error::MemoryError;
use crate::model::{MemoryKind, MemoryRecord};
use async_trait::async_trait;
use log::{debug, info};
use std::cmp::Ordering;
use std::fs::OpenOptions;
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// Record file name under the store root.
const RECORDS_FILE: &str = "records.jsonl";

/// Vector store abstraction used by the memory manager.
#[async_trait]
pub trait MemoryStore: Send + Sync {
    /// Persist one record, returning its id.
    async fn insert(&self, record: MemoryRecord) -> Result<Uuid, MemoryError>;

    /// Rank stored records against a query embedding, best first.
    ///
    /// Scores are similarity in [0, 1]; `kind` restricts candidates when
    /// set. At most `top_k` pairs are returned.
    async fn search(
        &self,
        embedding: &[f32],
        top_k: usize,
        kind: Option<MemoryKind>,
    ) -> Result<Vec<(MemoryRecord, f32)>, MemoryError>;

    /// Enumerate every stored record in insertion order.
    async fn all(&self) -> Result<Vec<MemoryRecord>, MemoryError>;

    /// Remove a record by id; returns whether it existed.
    async fn remove(&self, id: Uuid) -> Result<bool, MemoryError>;
}

/// File-backed store appending one serialized record per line.
///
/// Inserts are single-line appends, so concurrent runs sharing one store
/// need no coordination beyond the append itself. Removal rewrites the
/// file atomically through a temp file.
#[derive(Debug, Clone)]
pub struct JsonlMemoryStore {
    root: PathBuf,
    dimensions: usize,
}

impl JsonlMemoryStore {
    /// Create a store under the given root with a fixed embedding width.
    pub fn new(root: impl AsRef<Path>, dimensions: usize) -> Result<Self, MemoryError> {
        if dimensions == 0 {
            return Err(MemoryError::InvalidOptions(
                "embedding dimensionality must be at least 1".to_string(),
            ));
        }
        let root = root.as_ref().to_path_buf();
        std::fs::create_dir_all(&root)?;
        info!(
            "initialized jsonl memory store (root={}, dimensions={})",
            root.display(),
            dimensions
        );
        Ok(Self { root, dimensions })
    }

    /// Fixed embedding width accepted by this store.
    pub fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn records_path(&self) -> PathBuf {
        self.root.join(RECORDS_FILE)
    }

    fn temp_path(&self) -> PathBuf {
        self.root.join(format!("{RECORDS_FILE}.tmp"))
    }

    /// Load all records from the backing file.
    fn load_records(&self) -> Result<Vec<MemoryRecord>, MemoryError> {
        let path = self.records_path();
        if !path.exists() {
            return Ok(Vec::new());
        }
        let file = OpenOptions::new().read(true).open(path)?;
        let reader = BufReader::new(file);
        let mut records = Vec::new();
        for line in reader.lines() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            let record: MemoryRecord = serde_json::from_str(&line)?;
            records.push(record);
        }
        Ok(records)
    }

    /// Rewrite the record file atomically.
    fn write_records(&self, records: &[MemoryRecord]) -> Result<(), MemoryError> {
        let path = self.records_path();
        let temp_path = self.temp_path();
        {
            let mut file = OpenOptions::new()
                .create(true)
                .truncate(true)
                .write(true)
                .open(&temp_path)?;
            for record in records {
                let line = serde_json::to_string(record)?;
                writeln!(file, "{line}")?;
            }
        }
        if path.exists() {
            std::fs::remove_file(&path)?;
        }
        std::fs::rename(temp_path, path)?;
        Ok(())
    }

    fn check_dimensions(&self, embedding: &[f32]) -> Result<(), MemoryError> {
        if embedding.len() != self.dimensions {
            return Err(MemoryError::DimensionMismatch {
                expected: self.dimensions,
                actual: embedding.len(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl MemoryStore for JsonlMemoryStore {
    /// Store a record by appending one line to the record file.
    async fn insert(&self, record: MemoryRecord) -> Result<Uuid, MemoryError> {
        self.check_dimensions(&record.embedding)?;
        let path = self.records_path();
        let mut file = OpenOptions::new().create(true).append(true).open(path)?;
        let line = serde_json::to_string(&record)?;
        writeln!(file, "{line}")?;
        debug!(
            "stored memory record (id={}, kind={}, content_len={})",
            record.id,
            record.kind,
            record.content.len()
        );
        Ok(record.id)
    }

    /// Rank records by cosine similarity against the query embedding.
    async fn search(
        &self,
        embedding: &[f32],
        top_k: usize,
        kind: Option<MemoryKind>,
    ) -> Result<Vec<(MemoryRecord, f32)>, MemoryError> {
        self.check_dimensions(embedding)?;
        if top_k == 0 {
            return Ok(Vec::new());
        }
        let records = self.load_records()?;
        let mut scored: Vec<(MemoryRecord, f32)> = records
            .into_iter()
            .filter(|record| kind.is_none_or(|wanted| record.kind == wanted))
            .map(|record| {
                let score = cosine_similarity(embedding, &record.embedding).clamp(0.0, 1.0);
                (record, score)
            })
            .collect();
        scored.sort_by(|a, b| {
            b.1.partial_cmp(&a.1)
                .unwrap_or(Ordering::Equal)
                .then_with(|| b.0.created_at.cmp(&a.0.created_at))
        });
        scored.truncate(top_k);
        debug!(
            "searched memory store (candidates={}, top_k={})",
            scored.len(),
            top_k
        );
        Ok(scored)
    }

    async fn all(&self) -> Result<Vec<MemoryRecord>, MemoryError> {
        self.load_records()
    }

    /// Remove a record and rewrite the file without it.
    async fn remove(&self, id: Uuid) -> Result<bool, MemoryError> {
        let mut records = self.load_records()?;
        let before = records.len();
        records.retain(|record| record.id != id);
        if records.len() == before {
            return Ok(false);
        }
        self.write_records(&records)?;
        debug!("removed memory record (id={id})");
        Ok(true)
    }
}

/// Cosine similarity between two vectors; zero when either has no norm.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }
    let mut dot = 0.0f32;
    let mut norm_a = 0.0f32;
    let mut norm_b = 0.0f32;
    for (x, y) in a.iter().zip(b.iter()) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a.sqrt() * norm_b.sqrt())
}
