//! Logging setup for the provider process.
//!
//! Output goes to stderr; stdout belongs to the orchestrator handshake.

use tracing_subscriber::EnvFilter;

/// Environment variable holding the log filter, e.g. `petstore_sdk=debug`.
pub const LOG_ENV: &str = "PETSTORE_LOG";

const DEFAULT_FILTER: &str = "info";

fn filter() -> EnvFilter {
    EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

/// Install the global subscriber.
///
/// # Panics
/// If a global subscriber is already installed.
pub fn init_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(filter())
        .with_writer(std::io::stderr)
        .init();
}

/// Like [`init_logging`], but reports an already-installed subscriber as an
/// error.
pub fn try_init_logging() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    tracing_subscriber::fmt()
        .with_env_filter(filter())
        .with_writer(std::io::stderr)
        .try_init()
}
