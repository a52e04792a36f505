//! Diagnostic listeners that forward pipeline events to logs and metrics.

use crate::metrics::{record_action, record_handler_invocation};
use praxis_pipeline::{DiagnosticEvent, DiagnosticListener};
use tracing::debug;

/// Re-emits every diagnostic event as a `tracing` event.
///
/// Events go to the `praxis::diagnostics` target at debug level, so they can
/// be switched on separately from the pipeline's own log lines.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingListener;

impl DiagnosticListener for TracingListener {
    fn is_enabled(&self, _name: &str) -> bool {
        tracing::enabled!(target: "praxis::diagnostics", tracing::Level::DEBUG)
    }

    fn on_event(&self, event: &DiagnosticEvent<'_>) {
        let action = event.action().action_descriptor().display_name();
        match event {
            DiagnosticEvent::BeforeAction { .. } => {
                debug!(target: "praxis::diagnostics", event = event.name(), action);
            }
            DiagnosticEvent::HandlerSelected { handler, .. } => {
                let handler = handler.map(|handler| handler.display_name());
                debug!(target: "praxis::diagnostics", event = event.name(), action, handler = ?handler);
            }
            DiagnosticEvent::BeforeHandler {
                handler, arguments, ..
            } => {
                debug!(
                    target: "praxis::diagnostics",
                    event = event.name(),
                    action,
                    handler = %handler.display_name(),
                    argument_count = arguments.len(),
                );
            }
            DiagnosticEvent::AfterHandler {
                handler, result, ..
            } => {
                let result_type = result.map_or("none", |result| result.result_type());
                debug!(
                    target: "praxis::diagnostics",
                    event = event.name(),
                    action,
                    handler = %handler.display_name(),
                    result_type,
                );
            }
            DiagnosticEvent::AfterAction {
                elapsed, status, ..
            } => {
                debug!(
                    target: "praxis::diagnostics",
                    event = event.name(),
                    action,
                    elapsed_ms = elapsed.as_secs_f64() * 1000.0,
                    status = status.as_str(),
                );
            }
        }
    }
}

/// Feeds the standard metrics from diagnostic events.
#[derive(Debug, Clone, Copy, Default)]
pub struct MetricsListener;

impl DiagnosticListener for MetricsListener {
    fn is_enabled(&self, name: &str) -> bool {
        matches!(name, "praxis.after_handler" | "praxis.after_action")
    }

    fn on_event(&self, event: &DiagnosticEvent<'_>) {
        match event {
            DiagnosticEvent::AfterHandler { handler, .. } => {
                record_handler_invocation(&handler.display_name());
            }
            DiagnosticEvent::AfterAction {
                action,
                elapsed,
                status,
            } => {
                record_action(
                    action.action_descriptor().display_name(),
                    status.as_str(),
                    *elapsed,
                );
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_listener_subscribes_to_completion_events() {
        let listener = MetricsListener;
        assert!(listener.is_enabled("praxis.after_action"));
        assert!(listener.is_enabled("praxis.after_handler"));
        assert!(!listener.is_enabled("praxis.before_action"));
    }

    #[test]
    fn test_tracing_listener_disabled_without_subscriber() {
        assert!(!TracingListener.is_enabled("praxis.before_action"));
    }
}
