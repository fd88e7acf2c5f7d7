//! Tracing subscriber setup for the eventlog binary.

use tracing::Level;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

/// Configuration for the telemetry subsystem.
#[derive(Clone, Debug)]
pub struct TelemetryConfig {
    /// Default log level. Overridden by RUST_LOG env var.
    pub log_level: Level,
    /// Per-module level overrides (e.g. "eventlog_store" => DEBUG).
    pub module_levels: Vec<(String, Level)>,
    /// Emit one JSON object per line instead of human-readable output.
    pub json: bool,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_level: Level::INFO,
            module_levels: Vec::new(),
            json: false,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum TelemetryError {
    #[error("global subscriber already set: {0}")]
    AlreadyInitialized(String),
}

/// Render the filter directive string for a config, e.g.
/// `info,eventlog_store=debug`.
pub fn filter_directives(config: &TelemetryConfig) -> String {
    let mut filter_str = config.log_level.to_string().to_lowercase();
    for (module, level) in &config.module_levels {
        filter_str.push_str(&format!(",{}={}", module, level.to_string().to_lowercase()));
    }
    filter_str
}

/// Initialize the global tracing subscriber. Call once at startup.
///
/// `RUST_LOG`, when set, replaces the configured levels entirely.
pub fn init_telemetry(config: &TelemetryConfig) -> Result<(), TelemetryError> {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(filter_directives(config)));

    let fmt_layer = if config.json {
        tracing_subscriber::fmt::layer()
            .json()
            .with_target(true)
            .with_span_list(true)
            .with_filter(env_filter)
            .boxed()
    } else {
        tracing_subscriber::fmt::layer()
            .with_target(true)
            .with_filter(env_filter)
            .boxed()
    };

    tracing_subscriber::registry()
        .with(fmt_layer)
        .try_init()
        .map_err(|e| TelemetryError::AlreadyInitialized(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_filter_is_info() {
        assert_eq!(filter_directives(&TelemetryConfig::default()), "info");
    }

    #[test]
    fn module_levels_are_appended() {
        let config = TelemetryConfig {
            log_level: Level::WARN,
            module_levels: vec![
                ("eventlog_store".into(), Level::DEBUG),
                ("tower_http".into(), Level::TRACE),
            ],
            json: true,
        };
        assert_eq!(
            filter_directives(&config),
            "warn,eventlog_store=debug,tower_http=trace"
        );
    }

    #[test]
    fn directives_parse_as_env_filter() {
        let config = TelemetryConfig {
            module_levels: vec![("eventlog_server".into(), Level::DEBUG)],
            ..Default::default()
        };
        assert!(EnvFilter::try_new(filter_directives(&config)).is_ok());
    }

    #[test]
    fn second_init_fails_instead_of_panicking() {
        let config = TelemetryConfig::default();
        let _ = init_telemetry(&config);
        assert!(matches!(
            init_telemetry(&config),
            Err(TelemetryError::AlreadyInitialized(_))
        ));
    }
}
