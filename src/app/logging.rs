//! Logging setup
//!
//! Diagnostics go to stderr through `tracing`. Errors and warnings are always
//! shown; informational lines need `-V` (or `RUST_LOG`).

use std::io;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use super::SessionConfig;

/// Install the global subscriber. Call once, before anything logs.
pub fn init_logging(config: &SessionConfig<'_>) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(config.log_filter()));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(io::stderr)
                .with_target(false)
                .without_time(),
        )
        .init();
}
