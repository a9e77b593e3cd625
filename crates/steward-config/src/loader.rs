//! Config file loading.
//!
//! Steward reads a single JSON5 document; every section is optional and
//! falls back to its serde defaults. Loaded configs are validated before
//! being handed to callers.

use crate::{ConfigError, StewardConfig};
use log::{debug, info};
use std::fs;
use std::path::Path;

impl StewardConfig {
    /// Load and validate a config from a file path.
    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        info!("loading config from path: {}", path.as_ref().display());
        let contents = fs::read_to_string(path)?;
        Self::load_from_str(&contents)
    }

    /// Load and validate a config from JSON5 contents.
    pub fn load_from_str(contents: &str) -> Result<Self, ConfigError> {
        debug!("loading config from raw contents (len={})", contents.len());
        let config: StewardConfig = json5::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use crate::StewardConfig;
    use pretty_assertions::assert_eq;
    use std::fs;

    #[test]
    fn loads_config_with_comments_and_partial_sections() {
        let contents = r#"{
            // recall tuning for a small store
            memory: {
                decay_window_days: 30,
                recall_limit: 3,
            },
            routing: { max_retries: 2 },
        }"#;

        let config = StewardConfig::load_from_str(contents).unwrap();
        assert_eq!(config.memory.decay_window_days, 30.0);
        assert_eq!(config.memory.recall_limit, 3);
        assert_eq!(config.memory.decay_floor, 0.1);
        assert_eq!(config.routing.max_retries, 2);
        assert_eq!(config.routing.call_timeout_ms, 30_000);
    }

    #[test]
    fn loads_config_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("steward.json5");
        fs::write(
            &path,
            r#"{ sessions: { enabled: true, path: "checkpoints" } }"#,
        )
        .unwrap();

        let config = StewardConfig::load_from_path(&path).unwrap();
        assert!(config.sessions.enabled);
        assert_eq!(config.sessions.path.as_deref(), Some("checkpoints"));
    }

    #[test]
    fn invalid_values_fail_at_load_time() {
        let err = StewardConfig::load_from_str("{ memory: { decay_floor: -0.2 } }").unwrap_err();
        assert!(err.to_string().contains("memory.decay_floor"));
    }

    #[test]
    fn missing_file_reports_read_failure() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("absent.json5");
        let err = StewardConfig::load_from_path(&missing).unwrap_err();
        assert!(err.to_string().contains("failed to read config"));
    }

    #[test]
    fn malformed_document_reports_parse_failure() {
        let err = StewardConfig::load_from_str("{ memory: ").unwrap_err();
        assert!(err.to_string().contains("failed to parse config"));
    }
}
