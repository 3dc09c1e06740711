//! Logging configuration.
//!
//! Logs go to stderr so they never mix with anything a caller reads from
//! stdout. `RUST_LOG` takes precedence; otherwise set `DEBUG_LOGGING=1` to
//! enable debug output for toastline crates.

use tracing_subscriber::{
    EnvFilter,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

/// Install the global subscriber. Call once, before anything logs.
pub fn init() {
    let debug_logging = std::env::var("DEBUG_LOGGING").is_ok();

    let stderr_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_span_events(FmtSpan::NONE);

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(filter_directive(debug_logging)));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(filter)
        .init();

    tracing::debug!(debug_logging, "toastline logging initialized");
}

fn filter_directive(debug_logging: bool) -> &'static str {
    if debug_logging {
        // DEBUG_LOGGING=1: debug for toastline crates, warn for dependencies
        "warn,toastline=debug,toastline_overlay=debug"
    } else {
        "warn"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_directives_parse() {
        for debug in [false, true] {
            assert!(filter_directive(debug).parse::<EnvFilter>().is_ok());
        }
        assert!(filter_directive(true).contains("toastline_overlay=debug"));
    }

    #[test]
    fn test_fatal_errors_always_reach_stderr() {
        use tracing_subscriber::filter::LevelFilter;

        // Outside Windows the error record is the only fatal notice
        for debug in [false, true] {
            let filter = EnvFilter::new(filter_directive(debug));
            assert!(filter.max_level_hint() >= Some(LevelFilter::ERROR));
        }
    }
}
