//! Supervisor configuration

use std::time::Duration;

use tether_process::{ProcessConfig, ReadinessPattern};

use crate::error::Result;

/// Startup deadline used unless configured otherwise
pub const DEFAULT_STARTUP_TIMEOUT: Duration = Duration::from_millis(3000);

/// Options for one `start` cycle.
///
/// Captured when a start request is accepted; changing it requires a new
/// start with a different target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SupervisorConfig {
    /// Program to run; `--urls <address>` is appended per spawn
    pub program: ProcessConfig,
    /// Echo child output and report swallowed teardown failures
    pub verbose: bool,
    /// Stdout pattern announcing readiness
    pub startup_pattern: ReadinessPattern,
    /// Readiness deadline; `None` assumes running right after spawn
    pub timeout: Option<Duration>,
}

impl SupervisorConfig {
    /// Create configuration with defaults for the given program
    pub fn new(program: ProcessConfig) -> Self {
        Self {
            program,
            verbose: false,
            startup_pattern: ReadinessPattern::default(),
            timeout: Some(DEFAULT_STARTUP_TIMEOUT),
        }
    }

    /// Enable/disable diagnostic logging
    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Set readiness pattern
    pub fn startup_pattern(mut self, pattern: ReadinessPattern) -> Self {
        self.startup_pattern = pattern;
        self
    }

    /// Compile and set readiness pattern
    pub fn startup_pattern_str(self, pattern: &str) -> Result<Self> {
        Ok(self.startup_pattern(ReadinessPattern::new(pattern)?))
    }

    /// Set readiness deadline
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Skip readiness confirmation entirely
    pub fn no_timeout(mut self) -> Self {
        self.timeout = None;
        self
    }

    /// Readiness deadline in whole milliseconds, saturating at `u64::MAX`
    pub fn timeout_ms(&self) -> Option<u64> {
        self.timeout
            .map(|timeout| u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX))
    }
}
