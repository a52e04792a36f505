//! Diagnostic events.
//!
//! Listeners are injected when a pipeline is built and receive borrowed
//! views of the invocation at fixed points. They are purely observational:
//! nothing they return is consumed.

use praxis_core::{ActionContext, Arguments, HandlerDescriptor, SharedResult};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// How an invocation ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InvocationStatus {
    /// The pipeline completed normally.
    Completed,
    /// An unhandled fault escaped.
    Faulted,
    /// A filter broke the short-circuit contract.
    UsageViolation,
}

impl InvocationStatus {
    /// Label used in logs and metrics.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Completed => "completed",
            Self::Faulted => "faulted",
            Self::UsageViolation => "usage_violation",
        }
    }
}

impl fmt::Display for InvocationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An observable point in an invocation.
#[derive(Debug)]
pub enum DiagnosticEvent<'a> {
    /// Before any filter runs.
    BeforeAction {
        /// The invocation's context.
        action: &'a ActionContext,
    },
    /// After handler selection.
    HandlerSelected {
        /// The invocation's context.
        action: &'a ActionContext,
        /// The selected handler, if any matched.
        handler: Option<&'a HandlerDescriptor>,
    },
    /// Right before the handler method is called.
    BeforeHandler {
        /// The invocation's context.
        action: &'a ActionContext,
        /// The handler about to run.
        handler: &'a HandlerDescriptor,
        /// Its bound arguments.
        arguments: &'a Arguments,
    },
    /// Right after the handler method returned.
    AfterHandler {
        /// The invocation's context.
        action: &'a ActionContext,
        /// The handler that ran.
        handler: &'a HandlerDescriptor,
        /// Its bound arguments.
        arguments: &'a Arguments,
        /// What it produced; `None` when it failed or returned nothing.
        result: Option<&'a SharedResult>,
    },
    /// After the invocation finished, on every exit path.
    AfterAction {
        /// The invocation's context.
        action: &'a ActionContext,
        /// Wall time spent in the pipeline.
        elapsed: Duration,
        /// How it ended.
        status: InvocationStatus,
    },
}

impl DiagnosticEvent<'_> {
    /// Event name.
    pub const fn name(&self) -> &'static str {
        match self {
            Self::BeforeAction { .. } => "praxis.before_action",
            Self::HandlerSelected { .. } => "praxis.handler_selected",
            Self::BeforeHandler { .. } => "praxis.before_handler",
            Self::AfterHandler { .. } => "praxis.after_handler",
            Self::AfterAction { .. } => "praxis.after_action",
        }
    }

    /// The context every event carries.
    pub fn action(&self) -> &ActionContext {
        match self {
            Self::BeforeAction { action }
            | Self::HandlerSelected { action, .. }
            | Self::BeforeHandler { action, .. }
            | Self::AfterHandler { action, .. }
            | Self::AfterAction { action, .. } => action,
        }
    }
}

/// Receives diagnostic events.
pub trait DiagnosticListener: Send + Sync {
    /// Whether the listener wants events named `name`.
    fn is_enabled(&self, _name: &str) -> bool {
        true
    }

    /// Receives an event.
    fn on_event(&self, event: &DiagnosticEvent<'_>);
}

/// The listeners attached to one pipeline, notified in registration order.
#[derive(Clone, Default)]
pub struct Diagnostics {
    listeners: Vec<Arc<dyn DiagnosticListener>>,
}

impl Diagnostics {
    /// Creates an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a listener.
    pub fn add(&mut self, listener: Arc<dyn DiagnosticListener>) {
        self.listeners.push(listener);
    }

    /// Number of listeners.
    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    /// Returns true when nobody is listening.
    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }

    /// Notifies every interested listener.
    pub fn emit(&self, event: &DiagnosticEvent<'_>) {
        for listener in &self.listeners {
            if listener.is_enabled(event.name()) {
                listener.on_event(event);
            }
        }
    }
}

impl fmt::Debug for Diagnostics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Diagnostics")
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    #[derive(Default)]
    struct Names {
        only: Option<&'static str>,
        seen: Mutex<Vec<&'static str>>,
    }

    impl DiagnosticListener for Names {
        fn is_enabled(&self, name: &str) -> bool {
            self.only.map_or(true, |only| only == name)
        }

        fn on_event(&self, event: &DiagnosticEvent<'_>) {
            self.seen.lock().push(event.name());
        }
    }

    #[test]
    fn test_emit_respects_is_enabled() {
        let all = Arc::new(Names::default());
        let filtered = Arc::new(Names {
            only: Some("praxis.after_action"),
            ..Names::default()
        });

        let mut diagnostics = Diagnostics::new();
        diagnostics.add(all.clone());
        diagnostics.add(filtered.clone());
        assert_eq!(diagnostics.len(), 2);

        let action = ActionContext::default();
        diagnostics.emit(&DiagnosticEvent::BeforeAction { action: &action });
        diagnostics.emit(&DiagnosticEvent::AfterAction {
            action: &action,
            elapsed: Duration::from_millis(3),
            status: InvocationStatus::Completed,
        });

        assert_eq!(
            *all.seen.lock(),
            ["praxis.before_action", "praxis.after_action"]
        );
        assert_eq!(*filtered.seen.lock(), ["praxis.after_action"]);
    }

    #[test]
    fn test_status_labels() {
        assert_eq!(InvocationStatus::Completed.to_string(), "completed");
        assert_eq!(InvocationStatus::UsageViolation.as_str(), "usage_violation");
    }
}
