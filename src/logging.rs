//! Tracing initialization.

use std::sync::Once;

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Environment variable with per-target log levels, e.g. `fixit=debug`
pub const LOG_ENV_VAR: &str = "FIXIT_LOG";

static INIT: Once = Once::new();

/// Filter used when `FIXIT_LOG` is unset or invalid
pub fn default_filter(verbose: bool) -> &'static str {
    if verbose {
        "fixit=debug"
    } else {
        "fixit=warn"
    }
}

/// Install the stderr subscriber. Calling this more than once is a no-op.
pub fn init(verbose: bool) {
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_env(LOG_ENV_VAR)
            .unwrap_or_else(|_| EnvFilter::new(default_filter(verbose)));

        // A subscriber installed by an embedding program wins
        let _ = tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_target(false),
            )
            .with(filter)
            .try_init();
    });
}
