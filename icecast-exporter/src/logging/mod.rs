//! Logging setup.
//!
//! `RUST_LOG` takes precedence over the configured level when it is set.

use clap::ValueEnum;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use crate::{Error, Result};

/// Output format of log lines.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    /// Human readable lines.
    #[default]
    #[value(alias = "logfmt")]
    Text,
    /// One JSON object per line.
    Json,
}

/// Filter directive used when `RUST_LOG` is unset.
pub fn default_filter(level: &str) -> String {
    format!("icecast_exporter={level},icecast_status={level},tower_http=warn")
}

/// Build the filter for `level`, honoring `RUST_LOG` when set.
pub fn build_filter(level: &str) -> Result<EnvFilter> {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return Ok(filter);
    }

    EnvFilter::try_new(default_filter(level))
        .map_err(|e| Error::config(format!("invalid log level {level:?}: {e}")))
}

/// Install the global tracing subscriber.
pub fn init_logging(level: &str, format: LogFormat) -> Result<()> {
    let registry = tracing_subscriber::registry().with(build_filter(level)?);

    let installed = match format {
        LogFormat::Text => registry.with(fmt::layer().with_target(true)).try_init(),
        LogFormat::Json => registry
            .with(fmt::layer().json().with_current_span(false))
            .try_init(),
    };

    installed.map_err(|e| Error::Other(format!("Failed to install tracing subscriber: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_filter() {
        assert_eq!(
            default_filter("debug"),
            "icecast_exporter=debug,icecast_status=debug,tower_http=warn"
        );
    }

    #[test]
    fn test_log_format_names() {
        assert_eq!(LogFormat::from_str("json", true), Ok(LogFormat::Json));
        assert_eq!(LogFormat::from_str("text", true), Ok(LogFormat::Text));
        assert_eq!(LogFormat::from_str("logfmt", true), Ok(LogFormat::Text));
        assert!(LogFormat::from_str("xml", true).is_err());
    }

    #[test]
    fn test_build_filter_rejects_unknown_level() {
        // Only meaningful when RUST_LOG does not override the level.
        if std::env::var_os("RUST_LOG").is_none() {
            assert!(build_filter("loud").is_err());
            assert!(build_filter("warn").is_ok());
        }
    }
}
