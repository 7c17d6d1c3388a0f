//! # tether-cli
//!
//! Console host for the tether supervisor. Loads settings, starts the
//! backend and accepts `start <url>`, `auto`, `stop`, `status` and `quit`
//! on stdin while printing every lifecycle transition.

pub mod app;
pub mod cli;
pub mod console;
pub mod error;
pub mod logging;
pub mod output;
pub mod settings;

pub use app::{run, RunOptions};
pub use cli::Cli;
pub use error::{CliError, CliResult};
pub use settings::{SettingsLoader, TetherSettings};
