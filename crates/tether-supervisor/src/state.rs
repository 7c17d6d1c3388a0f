//! Published lifecycle states

use std::fmt;

use serde::{Deserialize, Serialize};
use tether_process::ExitInfo;
use thiserror::Error;

/// Why the supervised process ended up in [`ServiceState::Error`]
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ServiceFailure {
    /// The OS refused to create the process
    #[error("failed to spawn process: {message}")]
    Spawn { message: String },

    /// No readiness line within the startup deadline
    #[error("no startup line within {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    /// The process ended before it became ready
    #[error("process exited before it was ready ({exit})")]
    UnexpectedExit { exit: ExitInfo },
}

/// Lifecycle state of the supervised process.
///
/// Replaced as a whole on every transition; never mutated in place.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum ServiceState {
    /// Nothing has been observed yet (subscriber side only)
    NotStarted,
    /// Spawned, waiting for the readiness line
    Started,
    /// Ready to serve; carries the readiness line when one was awaited
    Running {
        #[serde(skip_serializing_if = "Option::is_none", default)]
        startup_line: Option<String>,
    },
    /// Was running, then terminated on its own
    Exited { exit: ExitInfo },
    /// Never became ready
    Error { failure: ServiceFailure },
    /// Stopped on request
    #[default]
    Stopped,
}

/// Variant of a [`ServiceState`] without its payload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ServiceStatus {
    NotStarted,
    Started,
    Running,
    Exited,
    Error,
    Stopped,
}

impl ServiceStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            ServiceStatus::NotStarted => "not_started",
            ServiceStatus::Started => "started",
            ServiceStatus::Running => "running",
            ServiceStatus::Exited => "exited",
            ServiceStatus::Error => "error",
            ServiceStatus::Stopped => "stopped",
        }
    }
}

impl fmt::Display for ServiceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl ServiceState {
    pub fn status(&self) -> ServiceStatus {
        match self {
            ServiceState::NotStarted => ServiceStatus::NotStarted,
            ServiceState::Started => ServiceStatus::Started,
            ServiceState::Running { .. } => ServiceStatus::Running,
            ServiceState::Exited { .. } => ServiceStatus::Exited,
            ServiceState::Error { .. } => ServiceStatus::Error,
            ServiceState::Stopped => ServiceStatus::Stopped,
        }
    }

    /// A process is owned in this state
    pub fn is_active(&self) -> bool {
        matches!(self, ServiceState::Started | ServiceState::Running { .. })
    }

    /// Readiness line, present only in `Running` after a match
    pub fn startup_line(&self) -> Option<&str> {
        match self {
            ServiceState::Running { startup_line } => startup_line.as_deref(),
            _ => None,
        }
    }

    pub fn failure(&self) -> Option<&ServiceFailure> {
        match self {
            ServiceState::Error { failure } => Some(failure),
            _ => None,
        }
    }
}

impl fmt::Display for ServiceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServiceState::Running {
                startup_line: Some(line),
            } => write!(f, "running ('{}')", line),
            ServiceState::Exited { exit } => write!(f, "exited ({})", exit),
            ServiceState::Error { failure } => write!(f, "error: {}", failure),
            other => f.write_str(other.status().as_str()),
        }
    }
}
