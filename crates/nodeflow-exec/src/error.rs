use nodeflow_core::CoreError;
use nodeflow_loader::LoadError;
use std::time::Duration;
use thiserror::Error;

/// Error raised by an executable capability for a single node
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CapabilityError {
    /// The node's computation failed
    #[error("Execution failed: {0}")]
    ExecutionFailed(String),

    /// The capability received inputs it cannot use
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The capability has no implementation for the node
    #[error("Not executable: {0}")]
    NotExecutable(String),
}

/// Errors surfaced by the graph engine
#[derive(Error, Debug)]
pub enum EngineError {
    /// Another operation held the engine for longer than the configured wait
    #[error("Engine busy: lock not acquired within {0:?}")]
    Busy(Duration),

    /// Graph store error
    #[error("Graph error: {0}")]
    Core(#[from] CoreError),

    /// Description loading error
    #[error("Load error: {0}")]
    Load(#[from] LoadError),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl EngineError {
    /// Whether the error only means the engine was busy
    pub fn is_busy(&self) -> bool {
        matches!(self, EngineError::Busy(_))
    }
}

/// Result type for engine operations
pub type EngineResult<T> = Result<T, EngineError>;
