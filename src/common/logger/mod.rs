use tracing_subscriber::{EnvFilter, fmt, prelude::*};

pub mod formatter;

pub use formatter::*;

use crate::configs::LoggingConfig;

/// Level used when `terse` output is requested.
pub const TERSE_LEVEL: &str = "warn";

/// Directive string for the given settings; `terse` overrides the level.
pub fn filter_directives(config: Option<&LoggingConfig>, terse: bool) -> String {
    let log_level = if terse {
        TERSE_LEVEL
    } else {
        config.and_then(|l| l.level.as_deref()).unwrap_or("info")
    };

    let filters = config.and_then(|l| l.filters.as_deref()).unwrap_or("");

    if filters.is_empty() {
        log_level.to_string()
    } else {
        format!("{},{}", log_level, filters)
    }
}

/// Install the global subscriber. `RUST_LOG` takes precedence over the
/// configured directives.
pub fn init(config: Option<&LoggingConfig>, terse: bool) {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(filter_directives(config, terse)));

    let stderr_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .event_format(CustomFormatter::new(true))
        .with_ansi(true);

    // A subscriber may already be installed when embedded or under test.
    let _ = tracing_subscriber::registry()
        .with(env_filter)
        .with(stderr_layer)
        .try_init();
}
