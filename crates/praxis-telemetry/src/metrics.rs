//! Prometheus metrics for Praxis.
//!
//! # Standard Metrics
//!
//! | Metric | Type | Labels | Description |
//! |--------|------|--------|-------------|
//! | `praxis_actions_total` | Counter | `action`, `status` | Completed invocations |
//! | `praxis_action_duration_seconds` | Histogram | `action` | Invocation latency |
//! | `praxis_handler_invocations_total` | Counter | `handler` | Handler method calls |
//!
//! Recording works whether or not [`init_metrics`] ran; without an
//! installed recorder the calls are no-ops.

use crate::error::TelemetryError;
use crate::TelemetryResult;
use metrics::{counter, describe_counter, describe_histogram, histogram};
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder, PrometheusHandle};
use std::sync::OnceLock;
use std::time::Duration;

/// Invocation counter.
pub const ACTIONS_TOTAL: &str = "praxis_actions_total";
/// Invocation latency histogram.
pub const ACTION_DURATION_SECONDS: &str = "praxis_action_duration_seconds";
/// Handler call counter.
pub const HANDLER_INVOCATIONS_TOTAL: &str = "praxis_handler_invocations_total";

/// Global metrics handle for rendering.
static METRICS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// Metrics configuration.
#[derive(Debug, Clone)]
pub struct MetricsConfig {
    /// Whether metrics are enabled.
    pub enabled: bool,

    /// Histogram buckets for invocation duration, in seconds.
    pub duration_buckets: Vec<f64>,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            // 1ms, 5ms, 10ms, 25ms, 50ms, 100ms, 250ms, 500ms, 1s, 2.5s, 5s, 10s
            duration_buckets: vec![
                0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0,
            ],
        }
    }
}

/// Installs the Prometheus recorder for this process.
///
/// Calling it again after a successful install is a no-op.
///
/// # Errors
///
/// Returns `TelemetryError::MetricsInit` if the recorder cannot be built or
/// another recorder is already installed.
pub fn init_metrics(config: &MetricsConfig) -> TelemetryResult<()> {
    if !config.enabled || METRICS_HANDLE.get().is_some() {
        return Ok(());
    }

    let handle = PrometheusBuilder::new()
        .set_buckets_for_metric(
            Matcher::Full(ACTION_DURATION_SECONDS.to_string()),
            &config.duration_buckets,
        )
        .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?
        .install_recorder()
        .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?;

    let _ = METRICS_HANDLE.set(handle);
    describe_metrics();
    Ok(())
}

/// Renders metrics in Prometheus text format.
///
/// Returns `None` if metrics are not initialized.
#[must_use]
pub fn render_metrics() -> Option<String> {
    METRICS_HANDLE.get().map(PrometheusHandle::render)
}

/// Registers descriptions for the standard metrics.
pub fn describe_metrics() {
    describe_counter!(ACTIONS_TOTAL, "Total number of action invocations");
    describe_histogram!(
        ACTION_DURATION_SECONDS,
        "Action invocation duration in seconds"
    );
    describe_counter!(
        HANDLER_INVOCATIONS_TOTAL,
        "Total number of handler method invocations"
    );
}

/// Records a finished invocation.
pub fn record_action(action: &str, status: &str, duration: Duration) {
    counter!(
        ACTIONS_TOTAL,
        "action" => action.to_string(),
        "status" => status.to_string()
    )
    .increment(1);

    histogram!(ACTION_DURATION_SECONDS, "action" => action.to_string())
        .record(duration.as_secs_f64());
}

/// Records a handler method call.
pub fn record_handler_invocation(handler: &str) {
    counter!(HANDLER_INVOCATIONS_TOTAL, "handler" => handler.to_string()).increment(1);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = MetricsConfig::default();
        assert!(config.enabled);
        assert_eq!(config.duration_buckets.len(), 12);
    }

    #[test]
    fn test_record_functions_dont_panic_without_recorder() {
        record_action("/Index", "completed", Duration::from_millis(10));
        record_handler_invocation("GET:default");
    }

    #[test]
    fn test_recorded_metrics_render() {
        let recorder = PrometheusBuilder::new().build_recorder();
        let handle = recorder.handle();

        metrics::with_local_recorder(&recorder, || {
            record_action("/Index", "completed", Duration::from_millis(3));
            record_action("/Index", "completed", Duration::from_millis(5));
            record_handler_invocation("GET:default");
        });

        let rendered = handle.render();
        assert!(rendered.contains(r#"praxis_actions_total{action="/Index",status="completed"} 2"#));
        assert!(rendered.contains(r#"praxis_handler_invocations_total{handler="GET:default"} 1"#));
        assert!(rendered.contains("praxis_action_duration_seconds"));
    }

    #[test]
    fn test_disabled_metrics_install_nothing() {
        let config = MetricsConfig {
            enabled: false,
            ..Default::default()
        };
        assert!(init_metrics(&config).is_ok());
    }
}
