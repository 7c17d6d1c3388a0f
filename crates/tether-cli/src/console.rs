//! Interactive console: commands typed on stdin and state output on stdout

use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;
use colored::Colorize;
use parking_lot::Mutex;
use serde::Serialize;
use tether_supervisor::{ServiceState, ServiceStatus, ServiceView, Subscribe, Target};

use crate::error::CliError;

/// One line of console input
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsoleCommand {
    /// Start on a URL, or automatically for `auto`
    Start(Target),
    Stop,
    Status,
    Help,
    Quit,
}

impl FromStr for ConsoleCommand {
    type Err = CliError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let mut words = line.split_whitespace();
        let command = words.next().unwrap_or_default();
        let argument = words.next();

        match (command, argument) {
            ("start", Some(url)) => Ok(ConsoleCommand::Start(Target::url(url))),
            ("start", None) => Err(CliError::InvalidArgument {
                message: "start needs a URL, use 'auto' to let the backend pick a port"
                    .to_string(),
            }),
            ("auto", None) => Ok(ConsoleCommand::Start(Target::Automatic)),
            ("stop", None) => Ok(ConsoleCommand::Stop),
            ("status", None) => Ok(ConsoleCommand::Status),
            ("help" | "?", None) => Ok(ConsoleCommand::Help),
            ("quit" | "exit", None) => Ok(ConsoleCommand::Quit),
            (other, _) => Err(CliError::InvalidArgument {
                message: format!("unknown command '{}'", other),
            }),
        }
    }
}

pub const HELP: &str = "\
Commands:
  start <url>   start the backend on a URL (e.g. http://localhost:5000)
  auto          start the backend on a port it picks itself
  stop          stop the backend
  status        show the current state
  quit          stop the backend and exit";

#[derive(Serialize)]
struct JsonLine<'a> {
    #[serde(flatten)]
    state: &'a ServiceState,
    requested: String,
    effective_url: Option<String>,
}

/// Prints every transition and keeps the shared [`ServiceView`] current
pub struct ConsoleSubscriber {
    view: Arc<Mutex<ServiceView>>,
    json: bool,
}

impl ConsoleSubscriber {
    pub fn new(view: Arc<Mutex<ServiceView>>, json: bool) -> Self {
        Self { view, json }
    }

    /// Update the view and render the line to print
    pub fn render(&self, state: &ServiceState) -> String {
        let mut view = self.view.lock();
        view.apply(state);
        let line = if self.json {
            let line = JsonLine {
                state,
                requested: view.requested().to_string(),
                effective_url: view.effective_url(),
            };
            serde_json::to_string(&line).unwrap_or_else(|e| format!("{{\"error\":\"{}\"}}", e))
        } else {
            describe(&view)
        };

        // A failed or exited backend is not restarted; forget the request.
        if matches!(state.status(), ServiceStatus::Error | ServiceStatus::Exited) {
            view.request(Target::None);
        }
        line
    }
}

#[async_trait]
impl Subscribe for ConsoleSubscriber {
    async fn on_state(&self, state: &ServiceState) {
        println!("{}", self.render(state));
    }

    fn name(&self) -> &'static str {
        "console"
    }
}

/// Human-readable summary of a view
pub fn describe(view: &ServiceView) -> String {
    let status = view.status();
    let painted = match status {
        ServiceStatus::Running => status.as_str().green().bold(),
        ServiceStatus::Started => status.as_str().yellow().bold(),
        ServiceStatus::Error | ServiceStatus::Exited => status.as_str().red().bold(),
        ServiceStatus::NotStarted | ServiceStatus::Stopped => status.as_str().normal(),
    };

    let mut line = format!("Backend state is {}", painted);
    match view.state() {
        ServiceState::Running {
            startup_line: Some(startup_line),
        } => line.push_str(&format!(", startup line was '{}'", startup_line)),
        ServiceState::Error { failure } => line.push_str(&format!(" ({})", failure)),
        ServiceState::Exited { exit } => line.push_str(&format!(" ({})", exit)),
        _ => {}
    }
    if let Some(url) = view.effective_url() {
        line.push_str(&format!("\n  Running on {}", url));
    } else if !view.requested().is_none() {
        line.push_str(&format!("\n  URL is {}", view.requested()));
    }
    line
}
