//! Configuration schema for steward.

use crate::ConfigError;
use serde::{Deserialize, Serialize};

/// Root config for the steward assistant core.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct StewardConfig {
    #[serde(default, rename = "$schema")]
    pub schema: Option<String>,
    #[serde(default)]
    pub memory: MemoryConfig,
    #[serde(default)]
    pub routing: RoutingConfig,
    #[serde(default)]
    pub sessions: SessionsConfig,
}

impl StewardConfig {
    /// Begin building a config in code, starting from the defaults.
    pub fn builder() -> StewardConfigBuilder {
        StewardConfigBuilder::new()
    }

    /// Check field ranges that serde defaults cannot enforce.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.memory.validate()?;
        self.routing.validate()?;
        Ok(())
    }
}

/// Builder for assembling a `StewardConfig` in code.
#[derive(Debug, Default, Clone)]
pub struct StewardConfigBuilder {
    config: StewardConfig,
}

impl StewardConfigBuilder {
    /// New builder seeded with the defaults.
    pub fn new() -> Self {
        Self {
            config: StewardConfig::default(),
        }
    }

    /// Replace the memory configuration.
    pub fn memory(mut self, memory: MemoryConfig) -> Self {
        self.config.memory = memory;
        self
    }

    /// Replace the routing configuration.
    pub fn routing(mut self, routing: RoutingConfig) -> Self {
        self.config.routing = routing;
        self
    }

    /// Replace the session persistence configuration.
    pub fn sessions(mut self, sessions: SessionsConfig) -> Self {
        self.config.sessions = sessions;
        self
    }

    /// Finalize and return the built `StewardConfig`.
    pub fn build(self) -> StewardConfig {
        self.config
    }
}

/// Memory store and recall configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryConfig {
    /// Directory holding the durable record file, when the bundled
    /// JSONL store is used.
    #[serde(default)]
    pub path: Option<String>,
    /// Age at which a record's decay factor reaches the floor, in days.
    #[serde(default = "default_decay_window_days")]
    pub decay_window_days: f32,
    /// Lower bound on the decay factor; old records never score below
    /// `raw * floor`.
    #[serde(default = "default_decay_floor")]
    pub decay_floor: f32,
    /// Minimum final score a candidate must reach to be returned.
    #[serde(default = "default_min_score")]
    pub min_score: f32,
    /// Default number of memories returned per query.
    #[serde(default = "default_recall_limit")]
    pub recall_limit: usize,
    /// Token budget for assembled context strings.
    #[serde(default = "default_context_token_budget")]
    pub context_token_budget: usize,
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            path: None,
            decay_window_days: default_decay_window_days(),
            decay_floor: default_decay_floor(),
            min_score: default_min_score(),
            recall_limit: default_recall_limit(),
            context_token_budget: default_context_token_budget(),
        }
    }
}

impl MemoryConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        if !self.decay_window_days.is_finite() || self.decay_window_days <= 0.0 {
            return Err(ConfigError::field(
                "memory.decay_window_days",
                "must be a positive number of days",
            ));
        }
        if !self.decay_floor.is_finite() || !(0.0..=1.0).contains(&self.decay_floor) {
            return Err(ConfigError::field(
                "memory.decay_floor",
                "must lie within [0, 1]",
            ));
        }
        if !self.min_score.is_finite() || !(0.0..=1.0).contains(&self.min_score) {
            return Err(ConfigError::field(
                "memory.min_score",
                "must lie within [0, 1]",
            ));
        }
        if self.recall_limit == 0 {
            return Err(ConfigError::field("memory.recall_limit", "must be at least 1"));
        }
        if self.context_token_budget == 0 {
            return Err(ConfigError::field(
                "memory.context_token_budget",
                "must be at least 1",
            ));
        }
        Ok(())
    }
}

fn default_decay_window_days() -> f32 {
    90.0
}

fn default_decay_floor() -> f32 {
    0.1
}

fn default_min_score() -> f32 {
    0.3
}

/// Default number of memories recalled per query.
fn default_recall_limit() -> usize {
    5
}

/// Default token budget for context assembly.
fn default_context_token_budget() -> usize {
    2000
}

/// Supervisor loop and timeout configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoutingConfig {
    /// Recoverable failures tolerated before the run is forced to end.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    /// Times a completed handler may be dispatched again within one run.
    #[serde(default = "default_max_handler_passes")]
    pub max_handler_passes: u32,
    /// Upper bound on a single classification or handler call.
    #[serde(default = "default_call_timeout_ms")]
    pub call_timeout_ms: u64,
    /// Wall-clock bound on a whole run; `None` disables it.
    #[serde(default = "default_run_timeout_ms")]
    pub run_timeout_ms: Option<u64>,
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            max_handler_passes: default_max_handler_passes(),
            call_timeout_ms: default_call_timeout_ms(),
            run_timeout_ms: default_run_timeout_ms(),
        }
    }
}

impl RoutingConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        if self.max_handler_passes == 0 {
            return Err(ConfigError::field(
                "routing.max_handler_passes",
                "must be at least 1",
            ));
        }
        if self.call_timeout_ms == 0 {
            return Err(ConfigError::field(
                "routing.call_timeout_ms",
                "must be at least 1ms",
            ));
        }
        if self.run_timeout_ms == Some(0) {
            return Err(ConfigError::field(
                "routing.run_timeout_ms",
                "must be at least 1ms when set",
            ));
        }
        Ok(())
    }
}

fn default_max_retries() -> u32 {
    3
}

fn default_max_handler_passes() -> u32 {
    1
}

fn default_call_timeout_ms() -> u64 {
    30_000
}

fn default_run_timeout_ms() -> Option<u64> {
    Some(120_000)
}

/// Session persistence settings.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct SessionsConfig {
    /// Checkpoint finished runs so a later run can resume the session.
    ///
    /// Ignored when the host injects its own checkpoint store.
    #[serde(default)]
    pub enabled: bool,
    /// Directory for session snapshots; `.steward/sessions` when unset.
    #[serde(default)]
    pub path: Option<String>,
}
