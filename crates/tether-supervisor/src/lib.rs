//! # tether-supervisor
//!
//! Lifecycle supervision for a locally spawned backend server: start it,
//! detect readiness from its output, enforce a startup deadline, notice
//! unexpected termination and stop it on demand or when switching targets.
//!
//! ## States
//! ```text
//!              start(target)
//!  Stopped/Exited/Error ───────► Started ──readiness line──► Running
//!           ▲      ▲               │  │                        │
//!           │      │  spawn failed │  │ exit / timeout         │ exit
//!           │      └───── Error ◄──┘◄─┘                        ▼
//!           │                                                Exited
//!           └──────────────── stop() from any state ◄──────────┘
//! ```
//!
//! ## Example
//! ```rust,no_run
//! use std::time::Duration;
//! use tether_process::ProcessConfig;
//! use tether_supervisor::{ServiceState, Supervisor, SupervisorConfig, Target};
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let supervisor = Supervisor::new();
//! let mut states = supervisor.subscribe();
//!
//! let config = SupervisorConfig::new(ProcessConfig::new("./BackendService"))
//!     .timeout(Duration::from_secs(3));
//! supervisor.start(Target::Automatic, config)?;
//!
//! while let Ok(state) = states.recv().await {
//!     println!("backend is {}", state);
//!     if !state.is_active() || matches!(state, ServiceState::Running { .. }) {
//!         break;
//!     }
//! }
//!
//! supervisor.stop().await?;
//! # Ok(())
//! # }
//! ```

mod actor;
mod publisher;

pub mod config;
pub mod error;
pub mod state;
pub mod subscriber;
pub mod supervisor;
pub mod target;
pub mod timer;
pub mod view;

pub use config::{SupervisorConfig, DEFAULT_STARTUP_TIMEOUT};
pub use error::{Result, SupervisorError};
pub use state::{ServiceFailure, ServiceState, ServiceStatus};
pub use subscriber::{Subscribe, SubscriberSet};
pub use supervisor::{Supervisor, SupervisorBuilder};
pub use target::{Target, AUTOMATIC_URL, URLS_ARG};
pub use timer::{StartupTimer, TimerElapsed};
pub use view::ServiceView;
