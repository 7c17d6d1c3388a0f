//! Process handle: one live child plus the tasks forwarding its events

use std::collections::HashSet;
use std::process::ExitStatus;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Child;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::{
    error::{ProcessError, Result},
    event::{ExitInfo, Generation, ProcessEvent},
    monitor::{OutputMonitor, OutputStream},
};

/// How long to wait for the OS to confirm a killed process is gone
const KILL_CONFIRM_TIMEOUT: Duration = Duration::from_secs(5);

pub(crate) type LiveSet = Arc<Mutex<HashSet<u32>>>;

/// Owns a spawned child and its three event producers (stdout, stderr, exit).
///
/// The child itself lives inside the exit watcher task; the handle keeps the
/// means to stop it. [`ProcessHandle::kill_and_await`] consumes the handle, so
/// it runs at most once, and returns only after the process is confirmed gone
/// and every producer has been detached. Dropping the handle without calling
/// it still kills the process, but does not wait.
#[derive(Debug)]
pub struct ProcessHandle {
    pid: u32,
    generation: Generation,
    detach: CancellationToken,
    kill_tx: Option<oneshot::Sender<()>>,
    watcher: Option<JoinHandle<Result<Option<ExitStatus>>>>,
    readers: Vec<JoinHandle<()>>,
    verbose: bool,
}

impl ProcessHandle {
    /// Take ownership of a freshly spawned child and start its producers
    pub(crate) fn attach<E>(
        mut child: Child,
        pid: u32,
        generation: Generation,
        monitor: OutputMonitor,
        sink: mpsc::UnboundedSender<E>,
        live: LiveSet,
        verbose: bool,
    ) -> Self
    where
        E: From<ProcessEvent> + Send + 'static,
    {
        let detach = CancellationToken::new();
        let mut readers = Vec::with_capacity(2);

        if let Some(stdout) = child.stdout.take() {
            readers.push(tokio::spawn(forward_lines(
                stdout,
                OutputStream::Stdout,
                pid,
                generation,
                monitor.clone(),
                sink.clone(),
                detach.clone(),
                verbose,
            )));
        }
        if let Some(stderr) = child.stderr.take() {
            readers.push(tokio::spawn(forward_lines(
                stderr,
                OutputStream::Stderr,
                pid,
                generation,
                monitor,
                sink.clone(),
                detach.clone(),
                verbose,
            )));
        }

        let (kill_tx, kill_rx) = oneshot::channel();
        let watcher = tokio::spawn(watch_exit(
            child,
            pid,
            generation,
            kill_rx,
            sink,
            detach.clone(),
            live,
            verbose,
        ));

        Self {
            pid,
            generation,
            detach,
            kill_tx: Some(kill_tx),
            watcher: Some(watcher),
            readers,
            verbose,
        }
    }

    /// Get process ID
    pub fn pid(&self) -> u32 {
        self.pid
    }

    /// Generation this handle was spawned with
    pub fn generation(&self) -> Generation {
        self.generation
    }

    /// Detach all producers, kill the process and wait for confirmation.
    ///
    /// Returns how the process ended, or `None` when the status could not be
    /// collected. If the process had already exited on its own this only
    /// detaches and reaps.
    pub async fn kill_and_await(mut self) -> Result<Option<ExitInfo>> {
        debug!(pid = %self.pid, generation = %self.generation, "Killing process");
        self.detach.cancel();

        if let Some(kill_tx) = self.kill_tx.take() {
            // Fails only when the watcher already saw the exit.
            let _ = kill_tx.send(());
        }

        let outcome = match self.watcher.take() {
            Some(watcher) => match watcher.await {
                Ok(outcome) => outcome,
                Err(e) => Err(ProcessError::KillFailed(e.to_string())),
            },
            None => Ok(None),
        };

        for reader in self.readers.drain(..) {
            reader.abort();
            let _ = reader.await;
        }

        match &outcome {
            Ok(status) => debug!(pid = %self.pid, status = ?status, "Process killed"),
            Err(e) if self.verbose => warn!(pid = %self.pid, error = %e, "Process kill incomplete"),
            Err(_) => {}
        }

        outcome.map(|status| status.map(ExitInfo::from))
    }
}

impl Drop for ProcessHandle {
    fn drop(&mut self) {
        self.detach.cancel();
        // Dropping kill_tx wakes the watcher, which kills and reaps the child.
        self.kill_tx.take();
        for reader in &self.readers {
            reader.abort();
        }
    }
}

/// Read a stream line by line, echo it when verbose and report readiness
#[allow(clippy::too_many_arguments)]
async fn forward_lines<R, E>(
    stream: R,
    kind: OutputStream,
    pid: u32,
    generation: Generation,
    mut monitor: OutputMonitor,
    sink: mpsc::UnboundedSender<E>,
    detach: CancellationToken,
    verbose: bool,
) where
    R: AsyncRead + Unpin,
    E: From<ProcessEvent>,
{
    let mut reader = BufReader::new(stream);
    let mut buf = Vec::new();

    loop {
        buf.clear();
        let read = tokio::select! {
            biased;
            _ = detach.cancelled() => break,
            read = reader.read_until(b'\n', &mut buf) => read,
        };

        match read {
            Ok(0) => break,
            Ok(_) => {
                let text = String::from_utf8_lossy(&buf);
                let line = text.trim_end_matches(['\r', '\n']);
                if verbose {
                    debug!(pid = %pid, stream = %kind, "{}", line.trim());
                }

                if let Some(line) = monitor.observe(kind, line) {
                    if verbose {
                        debug!(pid = %pid, line = %line, "Found startup line");
                    }
                    if detach.is_cancelled() {
                        break;
                    }
                    let _ = sink.send(E::from(ProcessEvent::ready(generation, line)));
                }
            }
            Err(e) => {
                if verbose {
                    warn!(pid = %pid, stream = %kind, error = %e, "Failed to read process output");
                }
                break;
            }
        }
    }
}

/// Own the child until it exits or a kill is requested
#[allow(clippy::too_many_arguments)]
async fn watch_exit<E>(
    mut child: Child,
    pid: u32,
    generation: Generation,
    mut kill_rx: oneshot::Receiver<()>,
    sink: mpsc::UnboundedSender<E>,
    detach: CancellationToken,
    live: LiveSet,
    verbose: bool,
) -> Result<Option<ExitStatus>>
where
    E: From<ProcessEvent>,
{
    let outcome = tokio::select! {
        status = child.wait() => {
            let info = match &status {
                Ok(status) => ExitInfo::from(*status),
                Err(e) => {
                    warn!(pid = %pid, error = %e, "Error waiting for process");
                    ExitInfo::default()
                }
            };
            if verbose {
                debug!(
                    pid = %pid,
                    code = ?info.code,
                    signal = ?info.signal,
                    "Process finished with code {:?} and signal {:?}",
                    info.code,
                    info.signal
                );
            }
            if !detach.is_cancelled() {
                let _ = sink.send(E::from(ProcessEvent::exited(generation, info)));
            }
            Ok(status.ok())
        }
        _ = &mut kill_rx => terminate(&mut child, pid, verbose).await,
    };

    live.lock().remove(&pid);
    outcome
}

async fn terminate(child: &mut Child, pid: u32, verbose: bool) -> Result<Option<ExitStatus>> {
    #[cfg(unix)]
    {
        use nix::sys::signal::{killpg, Signal};
        use nix::unistd::Pid;

        // The child leads its own process group, so this also takes down
        // anything it spawned.
        if let Err(e) = killpg(Pid::from_raw(pid as i32), Signal::SIGKILL) {
            if verbose {
                warn!(pid = %pid, error = %e, "Failed to kill process group, killing process only");
            }
            if let Err(e) = child.start_kill() {
                if verbose {
                    warn!(pid = %pid, error = %e, "Failed to kill process");
                }
            }
        }
    }

    #[cfg(not(unix))]
    {
        if let Err(e) = child.start_kill() {
            if verbose {
                warn!(pid = %pid, error = %e, "Failed to kill process");
            }
        }
    }

    match tokio::time::timeout(KILL_CONFIRM_TIMEOUT, child.wait()).await {
        Ok(Ok(status)) => Ok(Some(status)),
        Ok(Err(e)) => Err(ProcessError::KillFailed(e.to_string())),
        Err(_) => Err(ProcessError::Timeout {
            millis: KILL_CONFIRM_TIMEOUT.as_millis() as u64,
        }),
    }
}
