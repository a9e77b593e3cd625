use thiserror::Error;

/// Errors surfaced by assistant construction and synchronous entry points.
///
/// The run loop itself never returns these; routing and handler failures
/// are recorded on the conversation state instead.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Configuration was rejected while assembling the assistant.
    #[error("configuration error: {0}")]
    Config(String),

    /// The memory subsystem failed outside the run loop.
    #[error("memory error: {0}")]
    Memory(String),

    /// The checkpoint store failed outside the run loop.
    #[error("checkpoint error: {0}")]
    Checkpoint(String),

    /// IO error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<steward_config::ConfigError> for CoreError {
    fn from(err: steward_config::ConfigError) -> Self {
        CoreError::Config(err.to_string())
    }
}

impl From<steward_memory::MemoryError> for CoreError {
    fn from(err: steward_memory::MemoryError) -> Self {
        CoreError::Memory(err.to_string())
    }
}

impl From<crate::checkpoint::CheckpointError> for CoreError {
    fn from(err: crate::checkpoint::CheckpointError) -> Self {
        CoreError::Checkpoint(err.to_string())
    }
}
