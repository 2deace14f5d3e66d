//! Structured logging setup.
//!
//! Logs go to stderr so that command output on stdout stays machine-readable.
//! `RUST_LOG` takes precedence over the level given on the command line.

use crate::constants::{LOG_FORMAT_JSON, LOG_FORMAT_TEXT};
use crate::errors::{AppError, AppResult};
use clap::ValueEnum;
use std::fmt;
use std::io;
use tracing_subscriber::fmt::time::ChronoLocal;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt as tracing_fmt, EnvFilter};

/// Output format of the log stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    /// Human-readable lines.
    Text,
    /// One JSON object per event.
    Json,
}

impl fmt::Display for LogFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogFormat::Text => f.write_str(LOG_FORMAT_TEXT),
            LogFormat::Json => f.write_str(LOG_FORMAT_JSON),
        }
    }
}

fn build_filter(level: &str) -> AppResult<EnvFilter> {
    match EnvFilter::try_from_default_env() {
        Ok(filter) => Ok(filter),
        Err(_) => EnvFilter::try_new(level)
            .map_err(|e| AppError::Config(format!("Invalid log level '{}': {}", level, e))),
    }
}

/// Installs the global tracing subscriber.
///
/// # Errors
///
/// Returns `AppError::Config` if `level` is not a valid filter directive or a
/// global subscriber is already installed.
pub fn init_tracing(format: LogFormat, level: &str) -> AppResult<()> {
    let filter = build_filter(level)?;
    let registry = tracing_subscriber::registry().with(filter);

    let result = match format {
        LogFormat::Json => registry
            .with(
                tracing_fmt::layer()
                    .json()
                    .with_timer(ChronoLocal::rfc_3339())
                    .with_current_span(true)
                    .with_span_list(false)
                    .with_writer(io::stderr),
            )
            .try_init(),
        LogFormat::Text => registry
            .with(
                tracing_fmt::layer()
                    .with_timer(ChronoLocal::rfc_3339())
                    .with_target(false)
                    .with_writer(io::stderr),
            )
            .try_init(),
    };

    result.map_err(|e| AppError::Config(format!("Failed to initialize logging: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_format_display_matches_cli_values() {
        assert_eq!(LogFormat::Text.to_string(), LOG_FORMAT_TEXT);
        assert_eq!(LogFormat::Json.to_string(), LOG_FORMAT_JSON);
        assert_eq!(LogFormat::from_str(LOG_FORMAT_JSON, true).unwrap(), LogFormat::Json);
    }

    #[test]
    fn test_build_filter_accepts_levels() {
        assert!(build_filter("debug").is_ok());
        assert!(build_filter("jotter=trace,tower_http=info").is_ok());
    }
}
