//! Logging setup.
//!
//! Installs a `tracing_subscriber` registry with an `EnvFilter`, local
//! timezone timestamps and either a human-readable or a JSON formatter.

use chrono::Local;
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::Writer, time::FormatTime},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

use crate::config::{LogConfig, LogFormat};
use crate::{Error, Result};

/// Default log filter directive.
pub const DEFAULT_LOG_FILTER: &str = "fabrik_backup=info,blob_store=info";

/// Timer that formats timestamps in the server's local timezone.
#[derive(Debug, Clone, Copy)]
struct LocalTimer;

impl FormatTime for LocalTimer {
    fn format_time(&self, w: &mut Writer<'_>) -> std::fmt::Result {
        let now = Local::now();
        write!(w, "{}", now.format("%Y-%m-%dT%H:%M:%S%.3f%:z"))
    }
}

/// Resolve the filter: `RUST_LOG`, then the configured directive, then the default.
pub fn build_filter(config: &LogConfig) -> Result<EnvFilter> {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return Ok(filter);
    }

    let directive = config.filter.as_deref().unwrap_or(DEFAULT_LOG_FILTER);
    EnvFilter::try_new(directive)
        .map_err(|e| Error::config(format!("Invalid filter directive {}: {}", directive, e)))
}

/// Install the global subscriber. Logs go to stderr so stdout stays machine-readable.
pub fn init_logging(config: &LogConfig) -> Result<()> {
    let filter = build_filter(config)?;

    let fmt_layer = match config.format {
        LogFormat::Text => fmt::layer()
            .with_timer(LocalTimer)
            .with_writer(std::io::stderr)
            .boxed(),
        LogFormat::Json => fmt::layer()
            .json()
            .with_timer(LocalTimer)
            .with_writer(std::io::stderr)
            .boxed(),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .try_init()
        .map_err(|e| Error::Other(format!("Failed to install tracing subscriber: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_invalid_directive() {
        // Only meaningful when RUST_LOG does not override the configured directive.
        if std::env::var_os("RUST_LOG").is_some() {
            return;
        }

        let config = LogConfig {
            filter: Some("fabrik_backup=verbose".to_string()),
            format: LogFormat::Text,
        };
        assert!(matches!(build_filter(&config), Err(Error::Configuration(_))));

        let config = LogConfig {
            filter: None,
            format: LogFormat::Json,
        };
        assert!(build_filter(&config).is_ok());
    }
}
