//! Conversation checkpoints persisted as one JSON snapshot per session.

use crate::state::ConversationState;
use crate::types::SessionId;
use chrono::{DateTime, Utc};
use log::{debug, info};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use thiserror::Error;
use uuid::Uuid;

/// Errors returned by checkpoint stores.
#[derive(Debug, Error)]
pub enum CheckpointError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

/// One persisted session, as reported by `CheckpointStore::list`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckpointSummary {
    pub session_id: SessionId,
    pub message_count: usize,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Persistence for conversation state between runs.
///
/// Stores are synchronous; saves happen once per run, after routing has
/// terminated, so there is nothing to overlap with.
pub trait CheckpointStore: Send + Sync {
    /// Persist the state snapshot for its session, replacing any prior one.
    fn save(&self, state: &ConversationState) -> Result<(), CheckpointError>;

    /// Load the snapshot for a session, if one exists.
    fn load(&self, session_id: SessionId) -> Result<Option<ConversationState>, CheckpointError>;

    /// Summaries of all persisted sessions, most recently updated first.
    fn list(&self) -> Result<Vec<CheckpointSummary>, CheckpointError>;

    /// Delete a session snapshot. Returns false when none existed.
    fn delete(&self, session_id: SessionId) -> Result<bool, CheckpointError>;
}

/// File-backed checkpoint store writing `<session_id>.json` snapshots.
pub struct JsonCheckpointStore {
    root: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonCheckpointStore {
    pub fn new(root: impl AsRef<Path>) -> Result<Self, CheckpointError> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(&root)?;
        info!("checkpoint store ready (root={})", root.display());
        Ok(Self {
            root,
            write_lock: Mutex::new(()),
        })
    }

    fn snapshot_path(&self, session_id: SessionId) -> PathBuf {
        self.root.join(format!("{session_id}.json"))
    }

    fn summarize(state: &ConversationState) -> CheckpointSummary {
        let updated_at = state
            .messages
            .last()
            .map(|message| message.created_at)
            .unwrap_or(state.created_at);
        CheckpointSummary {
            session_id: state.session_id,
            message_count: state.messages.len(),
            created_at: state.created_at,
            updated_at,
        }
    }
}

impl CheckpointStore for JsonCheckpointStore {
    fn save(&self, state: &ConversationState) -> Result<(), CheckpointError> {
        let _guard = self.write_lock.lock();
        let path = self.snapshot_path(state.session_id);
        let temp = path.with_extension("json.tmp");
        {
            let mut file = OpenOptions::new()
                .create(true)
                .write(true)
                .truncate(true)
                .open(&temp)?;
            let payload = serde_json::to_string_pretty(state)?;
            file.write_all(payload.as_bytes())?;
        }
        if path.exists() {
            fs::remove_file(&path)?;
        }
        fs::rename(&temp, &path)?;
        debug!(
            "saved checkpoint (session_id={}, messages={})",
            state.session_id,
            state.messages.len()
        );
        Ok(())
    }

    fn load(&self, session_id: SessionId) -> Result<Option<ConversationState>, CheckpointError> {
        let path = self.snapshot_path(session_id);
        if !path.exists() {
            return Ok(None);
        }
        let payload = fs::read_to_string(&path)?;
        let state = serde_json::from_str(&payload)?;
        debug!("loaded checkpoint (session_id={session_id})");
        Ok(Some(state))
    }

    fn list(&self) -> Result<Vec<CheckpointSummary>, CheckpointError> {
        let mut summaries = Vec::new();
        for entry in fs::read_dir(&self.root)? {
            let entry = entry?;
            let path = entry.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some("json") {
                continue;
            }
            let Some(stem) = path.file_stem().and_then(|stem| stem.to_str()) else {
                continue;
            };
            let Ok(session_id) = Uuid::parse_str(stem) else {
                continue;
            };
            if let Some(state) = self.load(session_id)? {
                summaries.push(Self::summarize(&state));
            }
        }
        summaries.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(summaries)
    }

    fn delete(&self, session_id: SessionId) -> Result<bool, CheckpointError> {
        let _guard = self.write_lock.lock();
        let path = self.snapshot_path(session_id);
        if !path.exists() {
            return Ok(false);
        }
        fs::remove_file(&path)?;
        info!("deleted checkpoint (session_id={session_id})");
        Ok(true)
    }
}
