//! # Supervisor state machine
//!
//! A single task owns the process handle and the current state. Requests
//! from [`Supervisor`](crate::Supervisor), process events and timer expiry
//! all arrive as messages and are applied one at a time:
//!
//! ```text
//! start/stop ──► [commands] ──┐
//!                             ├──► SupervisorActor ──► publish(state)
//! stdout/exit/timer ─► [events] ┘        │
//!                                        └──► ProcessHandle (0 or 1)
//! ```
//!
//! ## Rules
//! - Every process and timer event carries the generation of the spawn it
//!   belongs to. Events whose generation is not the owned handle's are
//!   dropped before any transition logic runs.
//! - `Running` is only entered from `Started`; `Exited` only from `Running`.
//!   Exit while `Started` is an `Error`.
//! - A handle is always killed and detached before it is released, and
//!   before the next one is spawned.

use tether_process::{
    Generation, ProcessEvent, ProcessEventKind, ProcessHandle, ProcessManager, SpawnRequest,
};
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, trace, warn};

use crate::config::SupervisorConfig;
use crate::publisher::Publisher;
use crate::state::{ServiceFailure, ServiceState};
use crate::target::Target;
use crate::timer::{StartupTimer, TimerElapsed};

/// Requests issued through the public handle
#[derive(Debug)]
pub(crate) enum Command {
    Start {
        target: Target,
        config: SupervisorConfig,
    },
    Stop {
        done: oneshot::Sender<()>,
    },
    Shutdown {
        done: oneshot::Sender<()>,
    },
}

/// Asynchronous notifications from the owned handle and its timer
#[derive(Debug)]
pub(crate) enum Event {
    Process(ProcessEvent),
    TimerElapsed(Generation),
}

impl Event {
    fn generation(&self) -> Generation {
        match self {
            Event::Process(event) => event.generation,
            Event::TimerElapsed(generation) => *generation,
        }
    }
}

impl From<ProcessEvent> for Event {
    fn from(event: ProcessEvent) -> Self {
        Event::Process(event)
    }
}

impl From<TimerElapsed> for Event {
    fn from(elapsed: TimerElapsed) -> Self {
        Event::TimerElapsed(elapsed.generation)
    }
}

/// The process currently owned, with everything tied to its lifetime
struct Active {
    target: Target,
    handle: ProcessHandle,
    timer: Option<StartupTimer>,
    config: SupervisorConfig,
}

pub(crate) struct SupervisorActor {
    commands: mpsc::UnboundedReceiver<Command>,
    events: mpsc::UnboundedReceiver<Event>,
    events_tx: mpsc::UnboundedSender<Event>,
    manager: ProcessManager,
    generation: Generation,
    active: Option<Active>,
    publisher: Publisher,
}

impl SupervisorActor {
    pub(crate) fn new(
        commands: mpsc::UnboundedReceiver<Command>,
        manager: ProcessManager,
        publisher: Publisher,
    ) -> Self {
        let (events_tx, events) = mpsc::unbounded_channel();
        Self {
            commands,
            events,
            events_tx,
            manager,
            generation: Generation::default(),
            active: None,
            publisher,
        }
    }

    pub(crate) async fn run(mut self) {
        loop {
            tokio::select! {
                command = self.commands.recv() => match command {
                    Some(Command::Start { target, config }) => self.start(target, config).await,
                    Some(Command::Stop { done }) => {
                        self.stop().await;
                        let _ = done.send(());
                    }
                    Some(Command::Shutdown { done }) => {
                        self.stop().await;
                        self.publisher.shutdown().await;
                        let _ = done.send(());
                        return;
                    }
                    None => break,
                },
                Some(event) = self.events.recv() => self.on_event(event).await,
            }
        }

        debug!("All supervisor handles dropped, releasing process");
        self.release().await;
        self.publisher.shutdown().await;
    }

    fn state(&self) -> &ServiceState {
        self.publisher.current()
    }

    async fn start(&mut self, target: Target, config: SupervisorConfig) {
        if target.is_none() {
            self.stop().await;
            return;
        }

        if let Some(active) = &self.active {
            if active.target == target {
                debug!(target = %target, "Skip duplicate target");
                return;
            }
        }

        // Switching targets: tear down silently, the new Started follows.
        self.release().await;

        self.generation = self.generation.next();
        let generation = self.generation;
        let args = target.spawn_args().unwrap_or_default();
        let request = SpawnRequest::new(config.program.clone(), generation)
            .extra_args(args)
            .pattern(config.startup_pattern.clone())
            .verbose(config.verbose);

        let handle = match self.manager.spawn(request, self.events_tx.clone()) {
            Ok(handle) => handle,
            Err(e) => {
                warn!(
                    target = %target,
                    generation = %generation,
                    error = %e,
                    "Failed to start process, setting state to 'error'"
                );
                self.publisher.publish(ServiceState::Error {
                    failure: ServiceFailure::Spawn {
                        message: e.to_string(),
                    },
                });
                return;
            }
        };

        let timer = config
            .timeout
            .map(|after| StartupTimer::arm(generation, after, self.events_tx.clone()));
        let assume_running = timer.is_none();

        info!(
            pid = %handle.pid(),
            target = %target,
            generation = %generation,
            "Process started, setting state to 'started'"
        );
        self.active = Some(Active {
            target,
            handle,
            timer,
            config,
        });
        self.publisher.publish(ServiceState::Started);

        if assume_running {
            debug!(generation = %generation, "No startup timeout, assuming 'running'");
            self.publisher
                .publish(ServiceState::Running { startup_line: None });
        }
    }

    async fn stop(&mut self) {
        self.release().await;
        if *self.state() != ServiceState::Stopped {
            self.publisher.publish(ServiceState::Stopped);
        }
    }

    /// Kill and detach the owned process, if any.
    ///
    /// Teardown failures are logged when verbose and otherwise ignored.
    async fn release(&mut self) {
        let Some(active) = self.active.take() else {
            return;
        };
        if let Some(timer) = active.timer {
            timer.cancel();
        }

        let pid = active.handle.pid();
        let verbose = active.config.verbose;
        match active.handle.kill_and_await().await {
            Ok(status) => debug!(pid = %pid, status = ?status, "Process released"),
            Err(e) if verbose => warn!(pid = %pid, error = %e, "Process teardown failed"),
            Err(_) => {}
        }
    }

    async fn on_event(&mut self, event: Event) {
        let generation = event.generation();
        let owned = self.active.as_ref().is_some_and(|active| match &event {
            // A cancelled timer may still have an expiry in flight.
            Event::TimerElapsed(_) => active
                .timer
                .as_ref()
                .is_some_and(|timer| timer.generation() == generation),
            Event::Process(_) => active.handle.generation() == generation,
        });
        if !owned {
            trace!(generation = %generation, current = %self.generation, "Discarding stale event");
            return;
        }

        match event {
            Event::Process(ProcessEvent {
                kind: ProcessEventKind::Ready { line },
                ..
            }) => self.on_ready(line),
            Event::Process(ProcessEvent {
                kind: ProcessEventKind::Exited(exit),
                ..
            }) => self.on_exit(exit).await,
            Event::TimerElapsed(_) => self.on_timeout().await,
        }
    }

    fn on_ready(&mut self, line: String) {
        if *self.state() != ServiceState::Started {
            debug!(
                state = %self.state().status(),
                "Ignoring startup line, expected state 'started'"
            );
            return;
        }

        if let Some(timer) = self.active.as_mut().and_then(|active| active.timer.take()) {
            timer.cancel();
        }
        info!(line = %line, "Found startup line, changing state 'started' --> 'running'");
        self.publisher.publish(ServiceState::Running {
            startup_line: Some(line),
        });
    }

    async fn on_timeout(&mut self) {
        if *self.state() != ServiceState::Started {
            trace!(state = %self.state().status(), "Startup timer elapsed after leaving 'started'");
            return;
        }

        let timeout_ms = self
            .active
            .as_ref()
            .and_then(|active| active.config.timeout_ms())
            .unwrap_or_default();

        warn!(timeout_ms, "No startup line in time, setting state to 'error'");
        self.release().await;
        self.publisher.publish(ServiceState::Error {
            failure: ServiceFailure::Timeout { timeout_ms },
        });
    }

    async fn on_exit(&mut self, exit: tether_process::ExitInfo) {
        let next = match self.state() {
            ServiceState::Running { .. } => {
                info!(exit = %exit, "Process exited, changing state 'running' --> 'exited'");
                Some(ServiceState::Exited { exit })
            }
            ServiceState::Started => {
                warn!(exit = %exit, "Process exited before it was ready, setting state to 'error'");
                Some(ServiceState::Error {
                    failure: ServiceFailure::UnexpectedExit { exit },
                })
            }
            other => {
                debug!(state = %other.status(), exit = %exit, "Ignoring exit");
                None
            }
        };

        // Reap and detach; the process is already gone.
        self.release().await;
        if let Some(next) = next {
            self.publisher.publish(next);
        }
    }
}
