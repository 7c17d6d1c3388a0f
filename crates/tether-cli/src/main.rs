// tether console entry point

use anyhow::Context;
use clap::Parser;
use tether_cli::{logging, Cli, RunOptions, SettingsLoader};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let loader = match &cli.config {
        Some(path) => SettingsLoader::with_path(path.clone()),
        None => SettingsLoader::new(),
    };
    let mut settings = loader
        .load()
        .with_context(|| format!("loading settings from {}", loader.config_path().display()))?;
    cli.apply(&mut settings);

    logging::init_logging(settings.verbose);
    tracing::debug!(?settings, "Settings loaded");

    let options = RunOptions {
        start_on_launch: !cli.no_start,
        json: cli.json,
    };
    if let Err(e) = tether_cli::run(settings, options).await {
        tether_cli::output::print_error(&e.user_message());
        std::process::exit(1);
    }
    Ok(())
}
