//! Console host main loop

use std::sync::Arc;

use parking_lot::Mutex;
use tether_supervisor::{ServiceView, Supervisor, SupervisorConfig, Target};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::debug;

use crate::console::{describe, ConsoleCommand, ConsoleSubscriber, HELP};
use crate::error::CliResult;
use crate::output;
use crate::settings::TetherSettings;

/// How the console host should behave beyond the backend settings
#[derive(Debug, Clone, Copy, Default)]
pub struct RunOptions {
    /// Start the configured URL right away
    pub start_on_launch: bool,
    /// Print states as JSON lines
    pub json: bool,
}

/// Run the console until `quit`, end of input or Ctrl-C
pub async fn run(settings: TetherSettings, options: RunOptions) -> CliResult<()> {
    let config = settings.supervisor_config()?;
    let view = Arc::new(Mutex::new(ServiceView::new(config.startup_pattern.clone())));
    let console = Arc::new(ConsoleSubscriber::new(view.clone(), options.json));
    let supervisor = Supervisor::builder().with_subscriber(console).build();

    if options.start_on_launch {
        request(&supervisor, &view, Target::url(settings.url.clone()), &config)?;
    }
    if !options.json {
        output::print_info(HELP);
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        let line = tokio::select! {
            line = lines.next_line() => line?,
            _ = tokio::signal::ctrl_c() => {
                debug!("Interrupted");
                break;
            }
        };
        let Some(line) = line else {
            break;
        };
        if line.trim().is_empty() {
            continue;
        }

        match line.parse::<ConsoleCommand>() {
            Ok(ConsoleCommand::Start(target)) => request(&supervisor, &view, target, &config)?,
            Ok(ConsoleCommand::Stop) => {
                view.lock().request(Target::None);
                supervisor.stop().await?;
            }
            Ok(ConsoleCommand::Status) => output::print_info(&describe(&view.lock())),
            Ok(ConsoleCommand::Help) => output::print_info(HELP),
            Ok(ConsoleCommand::Quit) => break,
            Err(e) => output::print_error(&e.user_message()),
        }
    }

    supervisor.shutdown().await?;
    Ok(())
}

fn request(
    supervisor: &Supervisor,
    view: &Mutex<ServiceView>,
    target: Target,
    config: &SupervisorConfig,
) -> CliResult<()> {
    view.lock().request(target.clone());
    supervisor.start(target, config.clone())?;
    Ok(())
}
