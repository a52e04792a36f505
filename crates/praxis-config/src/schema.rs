//! Configuration schema types.
//!
//! Every section rejects unknown fields and fills missing ones with
//! defaults, so a file only needs to name what it changes.

use serde::{Deserialize, Serialize};

/// Pipeline behaviour switches.
///
/// # Example
///
/// ```
/// use praxis_config::PipelineConfig;
///
/// let config = PipelineConfig::default();
/// assert!(!config.log_arguments);
/// assert!(config.diagnostics);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct PipelineConfig {
    /// Include bound argument values in handler log lines.
    #[serde(default)]
    pub log_arguments: bool,

    /// Attach the built-in diagnostic listeners.
    #[serde(default = "default_true")]
    pub diagnostics: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            log_arguments: false,
            diagnostics: true,
        }
    }
}

/// Handler selection settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct SelectionConfig {
    /// Route value / query key naming the requested handler.
    #[serde(default = "default_handler_key")]
    pub handler_key: String,

    /// Serve HEAD requests with GET handlers when no HEAD handler matches.
    #[serde(default = "default_true")]
    pub head_falls_back_to_get: bool,
}

impl Default for SelectionConfig {
    fn default() -> Self {
        Self {
            handler_key: default_handler_key(),
            head_falls_back_to_get: true,
        }
    }
}

fn default_handler_key() -> String {
    "handler".to_string()
}

/// Log output format.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// JSON format for production.
    #[default]
    Json,
    /// Human-readable format for development.
    Pretty,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    /// Enable logging.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Filter directive ("trace", "debug", "info", "warn", "error", or
    /// per-target directives such as "praxis_pipeline=debug,info").
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Output format.
    #[serde(default)]
    pub format: LogFormat,

    /// Include file and line in log lines.
    #[serde(default)]
    pub include_location: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            level: default_log_level(),
            format: LogFormat::Json,
            include_location: false,
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Metrics configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct MetricsConfig {
    /// Enable metrics collection.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Histogram bucket boundaries for invocation duration, in seconds.
    #[serde(default = "default_duration_buckets")]
    pub duration_buckets: Vec<f64>,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            duration_buckets: default_duration_buckets(),
        }
    }
}

fn default_duration_buckets() -> Vec<f64> {
    praxis_telemetry::MetricsConfig::default().duration_buckets
}

/// Telemetry configuration section.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct TelemetryConfigSection {
    /// Service name reported in logs.
    #[serde(default = "default_service_name")]
    pub service_name: String,

    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Metrics settings.
    #[serde(default)]
    pub metrics: MetricsConfig,
}

impl Default for TelemetryConfigSection {
    fn default() -> Self {
        Self {
            service_name: default_service_name(),
            logging: LoggingConfig::default(),
            metrics: MetricsConfig::default(),
        }
    }
}

fn default_service_name() -> String {
    "praxis".to_string()
}

fn default_true() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_section_uses_defaults() {
        let config: SelectionConfig = toml::from_str(r#"handler_key = "op""#).unwrap();
        assert_eq!(config.handler_key, "op");
        assert!(config.head_falls_back_to_get);
    }

    #[test]
    fn test_unknown_field_rejected() {
        let result: Result<PipelineConfig, _> = toml::from_str("log_everything = true");
        assert!(result.is_err());
    }

    #[test]
    fn test_log_format_names() {
        let config: LoggingConfig = toml::from_str(r#"format = "pretty""#).unwrap();
        assert_eq!(config.format, LogFormat::Pretty);
        assert!(toml::from_str::<LoggingConfig>(r#"format = "xml""#).is_err());
    }
}
