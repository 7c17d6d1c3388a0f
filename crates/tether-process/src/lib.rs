//! # tether-process
//!
//! **Purpose**: Child process handles for the tether supervisor
//!
//! Spawns the supervised program, watches its output for a readiness line,
//! reports its exit, and kills it with confirmed termination.
//!
//! ## Features
//!
//! - **Process Spawning**: Spawn failures are reported synchronously
//! - **Output Monitoring**: Line-anchored readiness detection on stdout
//! - **Tagged Events**: Every event carries the [`Generation`] of its handle
//! - **Confirmed Kill**: Kill the process group and wait for the exit
//! - **PID Tracking**: Track processes until their exit is observed
//!
//! ## Usage
//!
//! ```rust,no_run
//! use tether_process::{Generation, ProcessConfig, ProcessEvent, ProcessManager, SpawnRequest};
//! use tokio::sync::mpsc;
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let manager = ProcessManager::new();
//! let (tx, mut rx) = mpsc::unbounded_channel::<ProcessEvent>();
//!
//! let request = SpawnRequest::new(ProcessConfig::new("./backend"), Generation::default())
//!     .extra_args(["--urls", "http://127.0.0.1:0"]);
//! let handle = manager.spawn(request, tx)?;
//!
//! if let Some(event) = rx.recv().await {
//!     println!("{:?}", event.kind);
//! }
//!
//! manager.shutdown(handle).await?;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod event;
pub mod handle;
pub mod manager;
pub mod monitor;

pub use config::ProcessConfig;
pub use error::{ProcessError, Result};
pub use event::{ExitInfo, Generation, ProcessEvent, ProcessEventKind};
pub use handle::ProcessHandle;
pub use manager::{ProcessManager, SpawnRequest};
pub use monitor::{OutputMonitor, OutputStream, ReadinessPattern, DEFAULT_STARTUP_PATTERN};
