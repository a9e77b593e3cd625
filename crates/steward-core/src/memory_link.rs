//! Wiring between configuration and the memory subsystem.

use crate::error::CoreError;
use std::sync::Arc;
use steward_config::MemoryConfig;
use steward_memory::{DecayPolicy, Embedder, MemoryManager, MemoryManagerOptions, MemoryStore};

/// Map the memory config section onto manager options.
pub fn manager_options_from_config(
    config: &MemoryConfig,
) -> Result<MemoryManagerOptions, CoreError> {
    let decay = DecayPolicy::new(config.decay_window_days, config.decay_floor)
        .map_err(|err| CoreError::Config(err.to_string()))?;
    Ok(MemoryManagerOptions {
        decay,
        min_score: config.min_score,
        recall_limit: config.recall_limit,
        context_token_budget: config.context_token_budget,
    })
}

/// Build a memory manager over the given store and embedder.
pub fn manager_from_config(
    store: Arc<dyn MemoryStore>,
    embedder: Arc<dyn Embedder>,
    config: &MemoryConfig,
) -> Result<MemoryManager, CoreError> {
    Ok(MemoryManager::new(
        store,
        embedder,
        manager_options_from_config(config)?,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn options_mirror_the_config_section() {
        let config = MemoryConfig {
            decay_window_days: 30.0,
            decay_floor: 0.2,
            min_score: 0.5,
            recall_limit: 7,
            context_token_budget: 512,
            ..MemoryConfig::default()
        };

        let options = manager_options_from_config(&config).unwrap();
        assert_eq!(options.decay.window_days(), 30.0);
        assert_eq!(options.decay.floor(), 0.2);
        assert_eq!(options.min_score, 0.5);
        assert_eq!(options.recall_limit, 7);
        assert_eq!(options.context_token_budget, 512);
    }

    #[test]
    fn invalid_decay_settings_become_config_errors() {
        let config = MemoryConfig {
            decay_window_days: 0.0,
            ..MemoryConfig::default()
        };

        let err = manager_options_from_config(&config).unwrap_err();
        assert!(matches!(err, CoreError::Config(_)));
    }
}
