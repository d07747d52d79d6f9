//! Logging setup for the `ebay` command-line client.
//!
//! Logs go to stderr so that stdout carries only the call output.

use std::io;

use tracing_subscriber::{
    EnvFilter,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

/// Log format configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable format for terminals.
    Pretty,
    /// One JSON object per line.
    Json,
}

impl LogFormat {
    /// Determines log format from environment.
    ///
    /// Checks `LOG_FORMAT` environment variable:
    /// - `json` => JSON format
    /// - `pretty` or unset => Pretty format
    #[must_use]
    pub fn from_env() -> Self {
        Self::parse(&std::env::var("LOG_FORMAT").unwrap_or_default())
    }

    fn parse(value: &str) -> Self {
        match value.to_lowercase().as_str() {
            "json" => Self::Json,
            _ => Self::Pretty,
        }
    }
}

/// Maps the number of `-v` flags to a default filter directive.
///
/// The SDK target follows the verbosity; other crates stay at `warn` until
/// `-vvv`, which also surfaces the HTTP stack.
#[must_use]
pub fn default_directive(verbosity: u8) -> &'static str {
    match verbosity {
        0 => "warn",
        1 => "warn,ebaysdk=info,ebay=info",
        2 => "warn,ebaysdk=debug,ebay=debug",
        _ => "trace",
    }
}

/// Initializes structured logging.
///
/// `RUST_LOG` wins over the verbosity-derived default when it is set.
///
/// # Environment Variables
///
/// - `LOG_FORMAT`: `json` or `pretty` (default: `pretty`)
/// - `RUST_LOG`: Log level filter
pub fn init_observability(format: LogFormat, verbosity: u8) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(verbosity)));

    let subscriber = tracing_subscriber::registry().with(filter);

    match format {
        LogFormat::Pretty => {
            subscriber
                .with(
                    fmt::layer()
                        .with_target(true)
                        .with_thread_ids(false)
                        .with_thread_names(false)
                        .with_span_events(FmtSpan::CLOSE)
                        .with_writer(io::stderr),
                )
                .init();
        }
        LogFormat::Json => {
            subscriber
                .with(
                    fmt::layer()
                        .json()
                        .with_current_span(true)
                        .with_span_list(true)
                        .with_target(true)
                        .with_span_events(FmtSpan::CLOSE)
                        .with_writer(io::stderr),
                )
                .init();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_format_parse() {
        assert_eq!(LogFormat::parse(""), LogFormat::Pretty);
        assert_eq!(LogFormat::parse("json"), LogFormat::Json);
        assert_eq!(LogFormat::parse("JSON"), LogFormat::Json);
        assert_eq!(LogFormat::parse("pretty"), LogFormat::Pretty);
        assert_eq!(LogFormat::parse("unknown"), LogFormat::Pretty);
    }

    #[test]
    fn test_default_directive_by_verbosity() {
        assert_eq!(default_directive(0), "warn");
        assert!(default_directive(1).contains("ebaysdk=info"));
        assert!(default_directive(2).contains("ebaysdk=debug"));
        assert_eq!(default_directive(3), "trace");
        assert_eq!(default_directive(u8::MAX), "trace");
    }

    #[test]
    fn test_directives_parse() {
        for verbosity in 0..4 {
            assert!(EnvFilter::try_new(default_directive(verbosity)).is_ok());
        }
    }
}
