//! Main configuration types.

use serde::{Deserialize, Serialize};

use crate::{ConfigError, LogFormat, PipelineConfig, SelectionConfig, TelemetryConfigSection};

/// Complete Praxis configuration.
///
/// Use [`ConfigLoader`](crate::ConfigLoader) to load it from files and
/// environment variables.
///
/// # Example
///
/// ```
/// use praxis_config::PraxisConfig;
///
/// let config = PraxisConfig::default();
/// assert_eq!(config.selection.handler_key, "handler");
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(deny_unknown_fields)]
pub struct PraxisConfig {
    /// Pipeline behaviour.
    #[serde(default)]
    pub pipeline: PipelineConfig,

    /// Handler selection.
    #[serde(default)]
    pub selection: SelectionConfig,

    /// Logging and metrics.
    #[serde(default)]
    pub telemetry: TelemetryConfigSection,
}

impl PraxisConfig {
    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if:
    /// - The handler key is empty
    /// - The service name is empty
    /// - The log level is not a valid filter directive
    /// - Duration buckets are empty or not ascending
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.selection.handler_key.trim().is_empty() {
            return Err(ConfigError::invalid_value(
                "selection.handler_key",
                "must not be empty",
            ));
        }

        if self.telemetry.service_name.trim().is_empty() {
            return Err(ConfigError::invalid_value(
                "telemetry.service_name",
                "must not be empty",
            ));
        }

        let level = &self.telemetry.logging.level;
        if praxis_telemetry::logging::create_env_filter(level).is_err() {
            return Err(ConfigError::invalid_value(
                "telemetry.logging.level",
                format!("invalid filter directive: {level}"),
            ));
        }

        let buckets = &self.telemetry.metrics.duration_buckets;
        if buckets.is_empty() || buckets.windows(2).any(|pair| pair[0] >= pair[1]) {
            return Err(ConfigError::invalid_value(
                "telemetry.metrics.duration_buckets",
                "must be a non-empty ascending list",
            ));
        }

        Ok(())
    }

    /// Development preset: pretty debug logs, argument values logged.
    ///
    /// ```
    /// use praxis_config::PraxisConfig;
    ///
    /// let config = PraxisConfig::development();
    /// assert_eq!(config.telemetry.logging.level, "debug");
    /// assert!(config.pipeline.log_arguments);
    /// ```
    #[must_use]
    pub fn development() -> Self {
        let mut config = Self::default();
        config.pipeline.log_arguments = true;
        config.telemetry.logging.level = "debug".to_string();
        config.telemetry.logging.format = LogFormat::Pretty;
        config.telemetry.logging.include_location = true;
        config
    }

    /// Production preset: JSON info logs, arguments never logged.
    #[must_use]
    pub fn production() -> Self {
        let mut config = Self::default();
        config.pipeline.log_arguments = false;
        config.telemetry.logging.level = "info".to_string();
        config.telemetry.logging.format = LogFormat::Json;
        config.telemetry.logging.include_location = false;
        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        assert!(PraxisConfig::default().validate().is_ok());
        assert!(PraxisConfig::development().validate().is_ok());
        assert!(PraxisConfig::production().validate().is_ok());
    }

    #[test]
    fn test_empty_handler_key_rejected() {
        let mut config = PraxisConfig::default();
        config.selection.handler_key = "  ".to_string();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("selection.handler_key"));
    }

    #[test]
    fn test_bad_log_level_rejected() {
        let mut config = PraxisConfig::default();
        config.telemetry.logging.level = "praxis=loud".to_string();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("telemetry.logging.level"));
    }

    #[test]
    fn test_unsorted_buckets_rejected() {
        let mut config = PraxisConfig::default();
        config.telemetry.metrics.duration_buckets = vec![0.5, 0.1];
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_presets_differ_in_format() {
        assert_eq!(
            PraxisConfig::development().telemetry.logging.format,
            LogFormat::Pretty
        );
        assert_eq!(
            PraxisConfig::production().telemetry.logging.format,
            LogFormat::Json
        );
    }
}
