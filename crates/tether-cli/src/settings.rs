//! Settings loading: config file, then `TETHER_*` environment, then flags

use std::path::PathBuf;
use std::time::Duration;

use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use tether_process::{ProcessConfig, ReadinessPattern, DEFAULT_STARTUP_PATTERN};
use tether_supervisor::SupervisorConfig;

use crate::error::{CliError, CliResult};

const ENV_PREFIX: &str = "TETHER";

/// Everything the console host needs to run a backend
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TetherSettings {
    /// Backend executable
    pub program: String,
    /// Arguments placed before `--urls <address>`
    pub args: Vec<String>,
    /// Working directory for the backend
    pub working_dir: Option<PathBuf>,
    /// Startup deadline in milliseconds; 0 disables readiness confirmation
    pub timeout_ms: u64,
    /// Readiness pattern matched against stdout lines
    pub startup_pattern: String,
    /// Echo backend output and supervisor diagnostics
    pub verbose: bool,
    /// URL requested on launch; empty lets the backend pick a port
    pub url: String,
}

impl Default for TetherSettings {
    fn default() -> Self {
        Self {
            program: "BackendService".to_string(),
            args: vec![],
            working_dir: None,
            timeout_ms: 3000,
            startup_pattern: DEFAULT_STARTUP_PATTERN.to_string(),
            verbose: false,
            url: String::new(),
        }
    }
}

impl TetherSettings {
    /// Check the settings and build the supervisor configuration
    pub fn supervisor_config(&self) -> CliResult<SupervisorConfig> {
        if self.program.trim().is_empty() {
            return Err(CliError::Config("program must not be empty".to_string()));
        }
        let pattern = ReadinessPattern::new(&self.startup_pattern)
            .map_err(|e| CliError::Config(e.to_string()))?;

        let mut program = ProcessConfig::new(&self.program).args(&self.args);
        if let Some(dir) = &self.working_dir {
            program = program.working_dir(dir);
        }

        let config = SupervisorConfig::new(program)
            .verbose(self.verbose)
            .startup_pattern(pattern);
        Ok(match self.timeout_ms {
            0 => config.no_timeout(),
            ms => config.timeout(Duration::from_millis(ms)),
        })
    }
}

/// Loads [`TetherSettings`] from a TOML file and the environment
pub struct SettingsLoader {
    config_path: PathBuf,
    env_prefix: String,
}

impl SettingsLoader {
    /// Loader for the default config path
    pub fn new() -> Self {
        Self {
            config_path: Self::default_config_path(),
            env_prefix: ENV_PREFIX.to_string(),
        }
    }

    /// Loader for a custom config path
    pub fn with_path(path: PathBuf) -> Self {
        Self {
            config_path: path,
            env_prefix: ENV_PREFIX.to_string(),
        }
    }

    /// Use a different environment prefix
    pub fn env_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.env_prefix = prefix.into();
        self
    }

    pub fn config_path(&self) -> &PathBuf {
        &self.config_path
    }

    fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("tether")
            .join("config.toml")
    }

    /// Load settings; a missing file is not an error
    pub fn load(&self) -> CliResult<TetherSettings> {
        let settings = Config::builder()
            .add_source(File::from(self.config_path.clone()).required(false))
            .add_source(
                Environment::with_prefix(&self.env_prefix)
                    .try_parsing(true)
                    .list_separator(" ")
                    .with_list_parse_key("args"),
            )
            .build()?
            .try_deserialize::<TetherSettings>()?;
        Ok(settings)
    }
}

impl Default for SettingsLoader {
    fn default() -> Self {
        Self::new()
    }
}
