//! Subscriber-side view of the service

use tether_process::ReadinessPattern;

use crate::state::{ServiceState, ServiceStatus};
use crate::target::Target;

/// What a UI layer derives from the notifications it receives.
///
/// Starts as [`ServiceState::NotStarted`] until the first notification.
#[derive(Debug, Clone)]
pub struct ServiceView {
    requested: Target,
    state: ServiceState,
    pattern: ReadinessPattern,
}

impl ServiceView {
    /// View that extracts addresses with `pattern`
    pub fn new(pattern: ReadinessPattern) -> Self {
        Self {
            requested: Target::None,
            state: ServiceState::NotStarted,
            pattern,
        }
    }

    /// Record the target most recently requested from the supervisor
    pub fn request(&mut self, target: Target) {
        self.requested = target;
    }

    /// Apply a notification
    pub fn apply(&mut self, state: &ServiceState) {
        self.state = state.clone();
    }

    pub fn requested(&self) -> &Target {
        &self.requested
    }

    pub fn state(&self) -> &ServiceState {
        &self.state
    }

    pub fn status(&self) -> ServiceStatus {
        self.state.status()
    }

    /// URL the service can be reached on.
    ///
    /// Only while running. Prefers the address captured from the readiness
    /// line, so automatic targets resolve to the port the OS picked, and
    /// falls back to the requested URL.
    pub fn effective_url(&self) -> Option<String> {
        if self.status() != ServiceStatus::Running {
            return None;
        }

        self.state
            .startup_line()
            .and_then(|line| self.pattern.extract_address(line))
            .or_else(|| self.requested.requested_url())
            .map(str::to_string)
    }
}

impl Default for ServiceView {
    fn default() -> Self {
        Self::new(ReadinessPattern::default())
    }
}
