//! Conversions from configuration sections to runtime types.

use crate::{LogFormat, LoggingConfig, PipelineConfig, PraxisConfig, SelectionConfig};
use praxis_pipeline::{ActionPipelineBuilder, DefaultHandlerSelector, InvokerOptions};
use praxis_telemetry::{MetricsListener, TelemetryConfig, TracingListener};
use std::sync::Arc;

impl From<&SelectionConfig> for DefaultHandlerSelector {
    fn from(config: &SelectionConfig) -> Self {
        Self::new()
            .with_handler_key(config.handler_key.clone())
            .with_head_fallback(config.head_falls_back_to_get)
    }
}

impl From<&PipelineConfig> for InvokerOptions {
    fn from(config: &PipelineConfig) -> Self {
        Self {
            log_arguments: config.log_arguments,
        }
    }
}

impl From<LogFormat> for praxis_telemetry::LogFormat {
    fn from(format: LogFormat) -> Self {
        match format {
            LogFormat::Json => Self::Json,
            LogFormat::Pretty => Self::Pretty,
        }
    }
}

impl From<&LoggingConfig> for praxis_telemetry::LogConfig {
    fn from(config: &LoggingConfig) -> Self {
        let preset = match config.format {
            LogFormat::Json => Self::production(),
            LogFormat::Pretty => Self::development(),
        };
        Self {
            enabled: config.enabled,
            level: config.level.clone(),
            format: config.format.into(),
            include_location: config.include_location,
            ..preset
        }
    }
}

impl PraxisConfig {
    /// Telemetry settings for [`praxis_telemetry::init_telemetry`].
    #[must_use]
    pub fn telemetry_config(&self) -> TelemetryConfig {
        let telemetry = &self.telemetry;
        TelemetryConfig::builder()
            .service_name(&telemetry.service_name)
            .logging((&telemetry.logging).into())
            .metrics(praxis_telemetry::MetricsConfig {
                enabled: telemetry.metrics.enabled,
                duration_buckets: telemetry.metrics.duration_buckets.clone(),
            })
            .build()
    }

    /// Applies selection, options and (when enabled) the diagnostic
    /// listeners to a pipeline under construction.
    ///
    /// # Example
    ///
    /// ```
    /// use praxis_config::PraxisConfig;
    /// use praxis_core::ActionDescriptor;
    /// use praxis_pipeline::ActionPipeline;
    ///
    /// let config = PraxisConfig::default();
    /// let pipeline = config
    ///     .configure_pipeline(ActionPipeline::builder(ActionDescriptor::new("/Index")))
    ///     .build();
    /// assert_eq!(pipeline.action_descriptor().display_name(), "/Index");
    /// ```
    #[must_use]
    pub fn configure_pipeline(&self, builder: ActionPipelineBuilder) -> ActionPipelineBuilder {
        let mut builder = builder
            .handler_selector(DefaultHandlerSelector::from(&self.selection))
            .options(InvokerOptions::from(&self.pipeline));

        if self.pipeline.diagnostics {
            builder = builder.listener(Arc::new(TracingListener));
            if self.telemetry.metrics.enabled {
                builder = builder.listener(Arc::new(MetricsListener));
            }
        }
        builder
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_logging_conversion() {
        let config = LoggingConfig {
            level: "warn".to_string(),
            format: LogFormat::Pretty,
            ..Default::default()
        };
        let log: praxis_telemetry::LogConfig = (&config).into();
        assert_eq!(log.level, "warn");
        assert_eq!(log.format, praxis_telemetry::LogFormat::Pretty);
        assert!(!log.include_location);
    }

    #[test]
    fn test_options_conversion() {
        let options = InvokerOptions::from(&PipelineConfig {
            log_arguments: true,
            diagnostics: false,
        });
        assert!(options.log_arguments);
    }

    #[test]
    fn test_telemetry_config_carries_service_name() {
        let mut config = PraxisConfig::default();
        config.telemetry.service_name = "orders".to_string();
        let telemetry = config.telemetry_config();
        assert_eq!(telemetry.service_name, "orders");
        assert_eq!(telemetry.logging.service_name, "orders");
    }
}
