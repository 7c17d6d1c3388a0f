//! CLI error types

use tether_supervisor::SupervisorError;
use thiserror::Error;

/// CLI-specific errors
#[derive(Error, Debug)]
pub enum CliError {
    #[error("Invalid argument: {message}")]
    InvalidArgument { message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Supervisor error: {0}")]
    Supervisor(#[from] SupervisorError),
}

impl CliError {
    /// Get a user-friendly error message with suggestions
    pub fn user_message(&self) -> String {
        match self {
            CliError::InvalidArgument { message } => {
                format!("Invalid argument: {}\n\nType 'help' for available commands.", message)
            }
            CliError::Io(e) => format!("Console I/O failed: {}", e),
            CliError::Config(msg) => format!(
                "Configuration error: {}\n\nCheck your config file or TETHER_* environment variables.",
                msg
            ),
            CliError::Supervisor(e) => format!("Supervisor error: {}", e),
        }
    }
}

impl From<config::ConfigError> for CliError {
    fn from(e: config::ConfigError) -> Self {
        CliError::Config(e.to_string())
    }
}

/// CLI result type
pub type CliResult<T> = Result<T, CliError>;
