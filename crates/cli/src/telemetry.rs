// Logging setup for the CLI
//
// Design Decision: Log to stderr so stdout carries only formatted output.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

/// Logging configuration
#[derive(Debug, Clone, Default)]
pub struct TelemetryConfig {
    /// Log filter (e.g., "info", "debug", "neatify_dispatcher=debug")
    pub log_filter: Option<String>,
}

impl TelemetryConfig {
    /// Create configuration from environment variables
    ///
    /// - `RUST_LOG` or `LOG_LEVEL`: Log filter
    pub fn from_env() -> Self {
        Self {
            log_filter: std::env::var("RUST_LOG")
                .ok()
                .or_else(|| std::env::var("LOG_LEVEL").ok()),
        }
    }

    /// Filter used when neither `RUST_LOG` nor `LOG_LEVEL` is set
    ///
    /// `warn`, or `error` with `--quiet`. A filter that fails to parse
    /// falls back to `info`.
    pub fn default_filter(quiet: bool) -> &'static str {
        if quiet {
            "error"
        } else {
            "warn"
        }
    }

    /// Fall back to `default` when no filter is set
    pub fn with_default_filter(mut self, default: &str) -> Self {
        self.log_filter.get_or_insert_with(|| default.to_string());
        self
    }

    fn filter(&self) -> EnvFilter {
        self.log_filter
            .as_ref()
            .and_then(|f| EnvFilter::try_new(f).ok())
            .unwrap_or_else(|| EnvFilter::new("info"))
    }
}

/// Install the global subscriber
pub fn init_telemetry(config: TelemetryConfig) {
    let console_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_writer(std::io::stderr)
        .with_filter(config.filter());

    tracing_subscriber::registry().with(console_layer).init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_filter_only_fills_gaps() {
        let config = TelemetryConfig::default().with_default_filter("warn");
        assert_eq!(config.log_filter.as_deref(), Some("warn"));

        let config = TelemetryConfig {
            log_filter: Some("debug".to_string()),
        }
        .with_default_filter("warn");
        assert_eq!(config.log_filter.as_deref(), Some("debug"));
    }

    #[test]
    fn test_default_filter_follows_quiet_flag() {
        assert_eq!(TelemetryConfig::default_filter(false), "warn");
        assert_eq!(TelemetryConfig::default_filter(true), "error");

        let config =
            TelemetryConfig::default().with_default_filter(TelemetryConfig::default_filter(true));
        assert_eq!(config.log_filter.as_deref(), Some("error"));
    }
}
