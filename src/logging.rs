//! Logging setup for the CLI
//!
//! Logs go to stderr so stdout stays clean for results (and `--json`).
//! `RUST_LOG` overrides the default level.

use tracing_subscriber::EnvFilter;

/// Install the global subscriber. `verbose` lowers the default level to debug.
pub fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    // a second init (e.g. from tests) keeps the first subscriber
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
