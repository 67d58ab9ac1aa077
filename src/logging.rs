//! Logging initialization
//!
//! `RUST_LOG` takes precedence when set; otherwise the configured level
//! applies. Safe to call more than once.

use tracing_subscriber::EnvFilter;

/// Initialize the tracing subscriber for the host process
pub fn init_logging(level: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.to_string()));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init();
}
