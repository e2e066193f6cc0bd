//! Tracing initialization

use std::sync::Once;

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

static INIT: Once = Once::new();

/// Environment variable holding the log filter
pub const LOG_ENV: &str = "PROMISIFY_LOG";

/// Initialize the promisify tracing/logging system.
///
/// Reads `PROMISIFY_LOG` for the filter, e.g.
/// `PROMISIFY_LOG=promisify_core=trace`. Falls back to `promisify_core=info`
/// if it is not set or is invalid.
///
/// Safe to call repeatedly. If the host application already installed a
/// global subscriber, that subscriber is kept.
pub fn init_tracing() {
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("promisify_core=info"));

        let _ = tracing_subscriber::registry()
            .with(fmt::layer().with_target(true).with_line_number(true))
            .with(filter)
            .try_init();
    });
}
