//! Process manager - spawning and PID tracking

use std::collections::HashSet;
use std::process::Stdio;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::process::Command;
use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::{
    config::ProcessConfig,
    error::{ProcessError, Result},
    event::{ExitInfo, Generation, ProcessEvent},
    handle::{LiveSet, ProcessHandle},
    monitor::{OutputMonitor, ReadinessPattern},
};

/// Everything needed for one spawn attempt
#[derive(Debug, Clone)]
pub struct SpawnRequest {
    /// Fixed binary identity of the supervised program
    pub config: ProcessConfig,
    /// Arguments appended after `config.args` for this spawn only
    pub extra_args: Vec<String>,
    /// Tag carried by every event of the resulting handle
    pub generation: Generation,
    /// Pattern the stdout monitor looks for
    pub pattern: ReadinessPattern,
    /// Echo child output and report swallowed kill failures
    pub verbose: bool,
}

impl SpawnRequest {
    pub fn new(config: ProcessConfig, generation: Generation) -> Self {
        Self {
            config,
            extra_args: vec![],
            generation,
            pattern: ReadinessPattern::default(),
            verbose: false,
        }
    }

    pub fn extra_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.extra_args = args.into_iter().map(Into::into).collect();
        self
    }

    pub fn pattern(mut self, pattern: ReadinessPattern) -> Self {
        self.pattern = pattern;
        self
    }

    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }
}

/// Spawns process handles and tracks which processes are still alive.
///
/// A PID stays registered until its termination has been observed, so
/// [`ProcessManager::live_count`] never under-reports.
#[derive(Debug, Clone, Default)]
pub struct ProcessManager {
    live: LiveSet,
}

impl ProcessManager {
    /// Create new process manager
    pub fn new() -> Self {
        Self {
            live: Arc::new(Mutex::new(HashSet::new())),
        }
    }

    /// Spawn a process and attach its event producers.
    ///
    /// Events are delivered to `sink` tagged with `request.generation`.
    /// Failure to create the process is returned here and never reported as
    /// a later exit event. Must be called from within a tokio runtime.
    pub fn spawn<E>(
        &self,
        request: SpawnRequest,
        sink: mpsc::UnboundedSender<E>,
    ) -> Result<ProcessHandle>
    where
        E: From<ProcessEvent> + Send + 'static,
    {
        let SpawnRequest {
            config,
            extra_args,
            generation,
            pattern,
            verbose,
        } = request;
        config.validate()?;

        debug!(
            command = %config.command,
            args = ?config.args,
            extra_args = ?extra_args,
            generation = %generation,
            "Spawning process"
        );

        let mut cmd = Command::new(&config.command);
        cmd.args(&config.args).args(&extra_args);

        if let Some(ref dir) = config.working_dir {
            cmd.current_dir(dir);
        }
        for (key, value) in &config.env {
            cmd.env(key, value);
        }

        cmd.stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        #[cfg(unix)]
        cmd.process_group(0);

        let child = cmd.spawn()?;
        let pid = child.id().ok_or_else(|| {
            ProcessError::SpawnFailed(std::io::Error::new(
                std::io::ErrorKind::Other,
                "Failed to get process ID",
            ))
        })?;

        self.live.lock().insert(pid);
        info!(pid = %pid, command = %config.command, generation = %generation, "Process spawned");

        Ok(ProcessHandle::attach(
            child,
            pid,
            generation,
            OutputMonitor::new(pattern),
            sink,
            self.live.clone(),
            verbose,
        ))
    }

    /// Kill a process and wait until it is confirmed gone
    pub async fn shutdown(&self, handle: ProcessHandle) -> Result<Option<ExitInfo>> {
        handle.kill_and_await().await
    }

    /// Number of spawned processes whose termination has not been observed
    pub fn live_count(&self) -> usize {
        self.live.lock().len()
    }

    /// PIDs of spawned processes whose termination has not been observed
    pub fn live_pids(&self) -> Vec<u32> {
        let mut pids: Vec<u32> = self.live.lock().iter().copied().collect();
        pids.sort_unstable();
        pids
    }
}
