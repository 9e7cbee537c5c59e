// 8.0 logging.rs: subscriber setup for the simulator and batch hosts.
// RUST_LOG wins over the configured level.

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::config::LoggingConfig;

/// Installs the global subscriber. Returns false when one is already set.
pub fn init_logging(config: &LoggingConfig) -> bool {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));
    let registry = tracing_subscriber::registry().with(filter);

    if config.json {
        registry
            .with(fmt::layer().json().with_target(true).with_ansi(false))
            .try_init()
            .is_ok()
    } else {
        registry
            .with(fmt::layer().with_target(false))
            .try_init()
            .is_ok()
    }
}
