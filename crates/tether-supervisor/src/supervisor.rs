//! Public supervisor handle

use std::sync::Arc;

use tether_process::ProcessManager;
use tokio::sync::{broadcast, mpsc, oneshot, watch};

use crate::actor::{Command, SupervisorActor};
use crate::config::SupervisorConfig;
use crate::error::{Result, SupervisorError};
use crate::publisher::Publisher;
use crate::state::ServiceState;
use crate::subscriber::{Subscribe, SubscriberSet};
use crate::target::Target;

const DEFAULT_STREAM_CAPACITY: usize = 64;

/// Builds a [`Supervisor`] with optional subscribers
pub struct SupervisorBuilder {
    subscribers: Vec<Arc<dyn Subscribe>>,
    stream_capacity: usize,
    manager: ProcessManager,
}

impl SupervisorBuilder {
    fn new() -> Self {
        Self {
            subscribers: Vec::new(),
            stream_capacity: DEFAULT_STREAM_CAPACITY,
            manager: ProcessManager::new(),
        }
    }

    /// Register a subscriber notified on every transition
    pub fn with_subscriber(mut self, subscriber: Arc<dyn Subscribe>) -> Self {
        self.subscribers.push(subscriber);
        self
    }

    pub fn with_subscribers(mut self, subscribers: Vec<Arc<dyn Subscribe>>) -> Self {
        self.subscribers.extend(subscribers);
        self
    }

    /// Buffer size of the [`Supervisor::subscribe`] stream
    pub fn stream_capacity(mut self, capacity: usize) -> Self {
        self.stream_capacity = capacity.max(1);
        self
    }

    /// Spawn processes through this manager instead of a private one
    pub fn with_process_manager(mut self, manager: ProcessManager) -> Self {
        self.manager = manager;
        self
    }

    /// Start the supervisor task. Must be called from within a tokio runtime.
    pub fn build(self) -> Supervisor {
        let (commands_tx, commands_rx) = mpsc::unbounded_channel();
        let (latest_tx, latest_rx) = watch::channel(ServiceState::Stopped);
        let (stream_tx, _) = broadcast::channel(self.stream_capacity);

        let publisher = Publisher::new(
            latest_tx,
            stream_tx.clone(),
            SubscriberSet::new(self.subscribers),
        );
        let actor = SupervisorActor::new(commands_rx, self.manager.clone(), publisher);
        tokio::spawn(actor.run());

        Supervisor {
            commands: commands_tx,
            latest: latest_rx,
            stream: stream_tx,
            manager: self.manager,
        }
    }
}

/// Supervises at most one backend process at a time.
///
/// Cheap to clone; all clones drive the same state machine. When the last
/// clone is dropped the owned process is killed and the task ends.
#[derive(Debug, Clone)]
pub struct Supervisor {
    commands: mpsc::UnboundedSender<Command>,
    latest: watch::Receiver<ServiceState>,
    stream: broadcast::Sender<ServiceState>,
    manager: ProcessManager,
}

impl Supervisor {
    /// Supervisor without subscribers
    pub fn new() -> Self {
        Self::builder().build()
    }

    pub fn builder() -> SupervisorBuilder {
        SupervisorBuilder::new()
    }

    /// Request a target.
    ///
    /// Returns once the request is queued; the outcome is observed through
    /// notifications. Requesting the target already being driven does
    /// nothing, a different target stops the current process first, and
    /// [`Target::None`] behaves like [`Supervisor::stop`].
    pub fn start(&self, target: impl Into<Target>, config: SupervisorConfig) -> Result<()> {
        self.commands
            .send(Command::Start {
                target: target.into(),
                config,
            })
            .map_err(|_| SupervisorError::Closed)
    }

    /// Stop the current process.
    ///
    /// Resolves after the process is confirmed terminated and detached. The
    /// state is `Stopped` afterwards; nothing is published if it already was.
    pub async fn stop(&self) -> Result<()> {
        let (done, wait) = oneshot::channel();
        self.commands
            .send(Command::Stop { done })
            .map_err(|_| SupervisorError::Closed)?;
        wait.await.map_err(|_| SupervisorError::Closed)
    }

    /// Stop the current process, flush subscribers and end the supervisor
    pub async fn shutdown(self) -> Result<()> {
        let (done, wait) = oneshot::channel();
        self.commands
            .send(Command::Shutdown { done })
            .map_err(|_| SupervisorError::Closed)?;
        wait.await.map_err(|_| SupervisorError::Closed)
    }

    /// Last published state; `Stopped` before anything was started
    pub fn state(&self) -> ServiceState {
        self.latest.borrow().clone()
    }

    /// Every state published from now on, in order
    pub fn subscribe(&self) -> broadcast::Receiver<ServiceState> {
        self.stream.subscribe()
    }

    /// Receiver tracking the latest state
    pub fn watch(&self) -> watch::Receiver<ServiceState> {
        self.latest.clone()
    }

    /// Spawned processes whose termination has not been observed yet
    pub fn live_processes(&self) -> usize {
        self.manager.live_count()
    }
}

impl Default for Supervisor {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for SupervisorBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SupervisorBuilder")
            .field("subscribers", &self.subscribers.len())
            .field("stream_capacity", &self.stream_capacity)
            .finish()
    }
}
