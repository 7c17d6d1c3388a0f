//! Error types for process management

use std::io;
use thiserror::Error;

/// Process management errors
#[derive(Debug, Error)]
pub enum ProcessError {
    /// Failed to spawn process
    #[error("Failed to spawn process: {0}")]
    SpawnFailed(#[from] io::Error),

    /// Timed out waiting for the process to confirm termination
    #[error("Process did not terminate within {millis}ms")]
    Timeout { millis: u64 },

    /// Failed to kill process
    #[error("Failed to kill process: {0}")]
    KillFailed(String),

    /// Invalid configuration
    #[error("Invalid process configuration: {0}")]
    InvalidConfig(String),

    /// Readiness pattern failed to compile
    #[error("Invalid readiness pattern: {0}")]
    InvalidPattern(#[from] regex::Error),
}

/// Result type for process operations
pub type Result<T> = std::result::Result<T, ProcessError>;
