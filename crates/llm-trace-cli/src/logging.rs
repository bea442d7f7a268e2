//! Logging setup for the CLI binary
//!
//! Logs go to stderr so command output on stdout stays machine-readable.

use tracing_subscriber::EnvFilter;

/// Map `-v` occurrences to a default log level
pub fn level_for_verbosity(verbose: u8) -> tracing::Level {
    match verbose {
        0 => tracing::Level::WARN,
        1 => tracing::Level::INFO,
        2 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    }
}

/// Initialize the global tracing subscriber
///
/// `RUST_LOG` directives are honored; `verbose` sets the default level.
pub fn init_logging(verbose: u8, json: bool) {
    let filter = EnvFilter::from_default_env().add_directive(level_for_verbosity(verbose).into());

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false);

    // A subscriber may already be installed (e.g. in tests).
    let _ = if json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_for_verbosity() {
        assert_eq!(level_for_verbosity(0), tracing::Level::WARN);
        assert_eq!(level_for_verbosity(1), tracing::Level::INFO);
        assert_eq!(level_for_verbosity(2), tracing::Level::DEBUG);
        assert_eq!(level_for_verbosity(9), tracing::Level::TRACE);
    }
}
