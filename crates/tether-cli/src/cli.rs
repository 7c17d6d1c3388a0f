//! Command-line arguments

use std::path::PathBuf;

use clap::Parser;

use crate::settings::TetherSettings;

/// Run a local backend server and keep track of its lifecycle
#[derive(Debug, Parser)]
#[command(name = "tether", version, about)]
pub struct Cli {
    /// Config file (defaults to <config dir>/tether/config.toml)
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Backend executable
    #[arg(long)]
    pub program: Option<String>,

    /// Extra argument for the backend (repeatable)
    #[arg(long = "arg", value_name = "ARG", allow_hyphen_values = true)]
    pub args: Vec<String>,

    /// URL to start on; empty lets the backend pick a port
    #[arg(long)]
    pub url: Option<String>,

    /// Startup deadline in milliseconds; 0 skips the readiness check
    #[arg(long, value_name = "MS")]
    pub timeout_ms: Option<u64>,

    /// Regex matched against stdout to detect readiness
    #[arg(long, value_name = "REGEX")]
    pub startup_pattern: Option<String>,

    /// Echo backend output and debug logs
    #[arg(short, long)]
    pub verbose: bool,

    /// Do not start the backend on launch
    #[arg(long)]
    pub no_start: bool,

    /// Print states as JSON lines
    #[arg(long)]
    pub json: bool,
}

impl Cli {
    /// Overlay flags on loaded settings
    pub fn apply(&self, settings: &mut TetherSettings) {
        if let Some(program) = &self.program {
            settings.program = program.clone();
        }
        if !self.args.is_empty() {
            settings.args = self.args.clone();
        }
        if let Some(url) = &self.url {
            settings.url = url.clone();
        }
        if let Some(timeout_ms) = self.timeout_ms {
            settings.timeout_ms = timeout_ms;
        }
        if let Some(pattern) = &self.startup_pattern {
            settings.startup_pattern = pattern.clone();
        }
        if self.verbose {
            settings.verbose = true;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_override_settings() {
        let cli = Cli::parse_from([
            "tether",
            "--program",
            "./BackendService",
            "--arg",
            "--environment=Development",
            "--url",
            "http://localhost:5010",
            "--timeout-ms",
            "0",
            "-v",
        ]);

        let mut settings = TetherSettings::default();
        cli.apply(&mut settings);

        assert_eq!(settings.program, "./BackendService");
        assert_eq!(settings.args, vec!["--environment=Development"]);
        assert_eq!(settings.url, "http://localhost:5010");
        assert_eq!(settings.timeout_ms, 0);
        assert!(settings.verbose);
    }

    #[test]
    fn test_no_flags_keep_settings() {
        let cli = Cli::parse_from(["tether"]);
        let mut settings = TetherSettings::default();
        cli.apply(&mut settings);

        assert_eq!(settings, TetherSettings::default());
        assert!(!cli.no_start);
    }
}
