//! Shared helpers for supervisor integration tests
//!
//! Fake backends are `sh -c` scripts. The supervisor appends
//! `--urls <address>`, so inside a script `$1` is `--urls` and `$2` is the
//! bind address.

#![allow(dead_code)]

use std::time::Duration;

use tether_process::ProcessConfig;
use tether_supervisor::{ServiceState, SupervisorConfig};
use tokio::sync::broadcast;

/// Bound on how long any single state may take to show up
pub const STATE_TIMEOUT: Duration = Duration::from_secs(5);

/// Supervisor config running `script` as the backend
pub fn fake_backend(script: &str) -> SupervisorConfig {
    SupervisorConfig::new(ProcessConfig::new("sh").args(["-c", script, "sh"]))
}

/// Backend that announces its requested address and stays up
pub fn listening_backend() -> SupervisorConfig {
    fake_backend("echo \"Now listening on: $2\"; exec sleep 30")
}

pub async fn next_state(rx: &mut broadcast::Receiver<ServiceState>) -> ServiceState {
    tokio::time::timeout(STATE_TIMEOUT, rx.recv())
        .await
        .expect("state notification within timeout")
        .expect("state stream open")
}

/// Assert nothing is published for `quiet`
pub async fn expect_no_state(rx: &mut broadcast::Receiver<ServiceState>, quiet: Duration) {
    if let Ok(state) = tokio::time::timeout(quiet, rx.recv()).await {
        panic!("unexpected notification: {:?}", state);
    }
}

/// Collect states until one that owns no process
pub async fn states_until_settled(rx: &mut broadcast::Receiver<ServiceState>) -> Vec<ServiceState> {
    let mut seen = Vec::new();
    loop {
        let state = next_state(rx).await;
        let settled = !state.is_active();
        seen.push(state);
        if settled {
            return seen;
        }
    }
}
