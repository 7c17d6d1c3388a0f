//! Supervisor error types

use tether_process::ProcessError;
use thiserror::Error;

/// Supervisor errors.
///
/// Failures of the supervised process are not errors here; they surface as
/// [`ServiceState::Error`](crate::ServiceState::Error).
#[derive(Debug, Error)]
pub enum SupervisorError {
    /// The supervisor task has ended and accepts no more requests
    #[error("Supervisor is no longer running")]
    Closed,

    /// Configuration could not be built
    #[error("Invalid supervisor configuration: {0}")]
    Config(#[from] ProcessError),
}

/// Result type for supervisor operations
pub type Result<T> = std::result::Result<T, SupervisorError>;
