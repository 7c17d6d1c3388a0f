//! Events produced by a process handle

use std::fmt;
use std::process::ExitStatus;

use serde::{Deserialize, Serialize};

/// Identifies one spawn attempt.
///
/// Every event carries the generation of the handle that produced it so a
/// consumer can discard events from handles it has already torn down.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Generation(u64);

impl Generation {
    pub fn new(value: u64) -> Self {
        Self(value)
    }

    pub fn get(self) -> u64 {
        self.0
    }

    /// The generation following this one
    pub fn next(self) -> Self {
        Self(self.0.wrapping_add(1))
    }
}

impl fmt::Display for Generation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// How a process ended
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExitInfo {
    /// Exit code, if the process exited normally
    pub code: Option<i32>,
    /// Terminating signal (unix only)
    pub signal: Option<i32>,
}

impl ExitInfo {
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }
}

impl From<ExitStatus> for ExitInfo {
    fn from(status: ExitStatus) -> Self {
        #[cfg(unix)]
        let signal = {
            use std::os::unix::process::ExitStatusExt;
            status.signal()
        };
        #[cfg(not(unix))]
        let signal = None;

        Self {
            code: status.code(),
            signal,
        }
    }
}

impl fmt::Display for ExitInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.code, self.signal) {
            (Some(code), _) => write!(f, "code {}", code),
            (None, Some(signal)) => write!(f, "signal {}", signal),
            (None, None) => f.write_str("unknown status"),
        }
    }
}

/// What happened to a process
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProcessEventKind {
    /// Stdout produced the readiness line
    Ready { line: String },
    /// The process terminated on its own
    Exited(ExitInfo),
}

/// An event tagged with the generation of the handle that produced it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessEvent {
    pub generation: Generation,
    pub kind: ProcessEventKind,
}

impl ProcessEvent {
    pub fn ready(generation: Generation, line: impl Into<String>) -> Self {
        Self {
            generation,
            kind: ProcessEventKind::Ready { line: line.into() },
        }
    }

    pub fn exited(generation: Generation, info: ExitInfo) -> Self {
        Self {
            generation,
            kind: ProcessEventKind::Exited(info),
        }
    }
}
