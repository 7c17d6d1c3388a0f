//! Tracing setup for the binary

use tracing_subscriber::EnvFilter;

/// Install the global subscriber. Logs go to stderr; stdout carries states.
///
/// `RUST_LOG` wins when set, otherwise `debug` with `verbose` and `warn`
/// without.
pub fn init_logging(verbose: bool) {
    let fallback = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(verbose)
        .with_writer(std::io::stderr)
        .init();
}
