//! Error types for the action pipeline.
//!
//! [`ActionError`] is what filters, handlers and collaborators return.
//! [`InvokeError`] is what escapes the pipeline entry point: either a usage
//! contract violation or a fault nobody handled.

use crate::category::FilterCategory;
use crate::fault::{Fault, FaultOrigin};
use thiserror::Error;

/// Result type alias using [`ActionError`].
pub type PipelineResult<T> = Result<T, ActionError>;

/// Errors raised inside the pipeline.
///
/// # Example
///
/// ```
/// use praxis_core::ActionError;
///
/// fn load(id: &str) -> Result<(), ActionError> {
///     if id.is_empty() {
///         return Err(ActionError::binding_for("id", "value is required"));
///     }
///     Ok(())
/// }
///
/// assert!(load("").is_err());
/// ```
#[derive(Error, Debug)]
pub enum ActionError {
    /// Parameter binding or validation failed.
    #[error("Binding error: {message}")]
    Binding {
        /// Human-readable error message.
        message: String,
        /// The parameter that failed to bind.
        parameter: Option<String>,
    },

    /// The handler method failed.
    #[error("Handler error: {message}")]
    Handler {
        /// Human-readable error message.
        message: String,
        /// The underlying error.
        #[source]
        source: Option<anyhow::Error>,
    },

    /// A filter hook failed.
    #[error("Filter error: {message}")]
    Filter {
        /// Human-readable error message.
        message: String,
    },

    /// Executing a result failed.
    #[error("Result execution error: {message}")]
    ResultExecution {
        /// Human-readable error message.
        message: String,
    },

    /// Serializing a handler value failed.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A filter broke the short-circuit contract. Never captured as a fault.
    #[error(transparent)]
    UsageContract(UsageViolation),

    /// A captured fault being re-raised.
    #[error(transparent)]
    Faulted(Fault),

    /// Any other error.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ActionError {
    /// Creates a binding error.
    #[must_use]
    pub fn binding(message: impl Into<String>) -> Self {
        Self::Binding {
            message: message.into(),
            parameter: None,
        }
    }

    /// Creates a binding error for a specific parameter.
    #[must_use]
    pub fn binding_for(parameter: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Binding {
            message: message.into(),
            parameter: Some(parameter.into()),
        }
    }

    /// Creates a handler error.
    #[must_use]
    pub fn handler(message: impl Into<String>) -> Self {
        Self::Handler {
            message: message.into(),
            source: None,
        }
    }

    /// Creates a handler error wrapping a source error.
    #[must_use]
    pub fn handler_with_source(
        message: impl Into<String>,
        source: impl Into<anyhow::Error>,
    ) -> Self {
        Self::Handler {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    /// Creates a filter error.
    #[must_use]
    pub fn filter(message: impl Into<String>) -> Self {
        Self::Filter {
            message: message.into(),
        }
    }

    /// Creates a result execution error.
    #[must_use]
    pub fn result_execution(message: impl Into<String>) -> Self {
        Self::ResultExecution {
            message: message.into(),
        }
    }

    /// Returns true for usage contract violations.
    #[must_use]
    pub const fn is_usage_violation(&self) -> bool {
        matches!(self, Self::UsageContract(_))
    }

    /// Returns the fault this error re-raises, if any.
    #[must_use]
    pub const fn as_fault(&self) -> Option<&Fault> {
        match self {
            Self::Faulted(fault) => Some(fault),
            _ => None,
        }
    }
}

/// A filter set a result (or cancelled) and still invoked its continuation.
///
/// This is a programming error in the filter, not a recoverable condition.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct UsageViolation {
    category: FilterCategory,
    filter: String,
    message: String,
}

impl UsageViolation {
    /// Builds the violation raised when `filter` continues after short-circuiting.
    pub fn continued_after_short_circuit(category: FilterCategory, filter: impl Into<String>) -> Self {
        let filter = filter.into();
        let what = match category {
            FilterCategory::Result => "set Cancel to true",
            _ => "set a Result",
        };
        let message = format!(
            "{category} filter '{filter}' {what} and then invoked the next delegate. \
             Filters in the {category} stage must either short-circuit or continue, not both."
        );
        Self {
            category,
            filter,
            message,
        }
    }

    /// Category of the offending filter.
    pub fn category(&self) -> FilterCategory {
        self.category
    }

    /// Name of the offending filter.
    pub fn filter(&self) -> &str {
        &self.filter
    }
}

/// Errors escaping [`invoke`](https://docs.rs/praxis-pipeline) of an action.
#[derive(Error, Debug)]
pub enum InvokeError {
    /// A filter broke the short-circuit contract.
    #[error("usage contract violated: {0}")]
    UsageContract(UsageViolation),

    /// A fault reached the pipeline exit with no hook handling it.
    #[error("unhandled fault: {0}")]
    Unhandled(Fault),
}

impl InvokeError {
    /// Returns the unhandled fault, if that is what escaped.
    pub fn fault(&self) -> Option<&Fault> {
        match self {
            Self::Unhandled(fault) => Some(fault),
            Self::UsageContract(_) => None,
        }
    }
}

impl From<ActionError> for InvokeError {
    fn from(error: ActionError) -> Self {
        match error {
            ActionError::UsageContract(violation) => Self::UsageContract(violation),
            other => Self::Unhandled(Fault::capture(other, FaultOrigin::Unknown)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn test_helpers() {
        assert_eq!(
            ActionError::binding("bad").to_string(),
            "Binding error: bad"
        );
        assert!(matches!(
            ActionError::binding_for("id", "missing"),
            ActionError::Binding { parameter: Some(p), .. } if p == "id"
        ));
        assert_eq!(
            ActionError::result_execution("io").to_string(),
            "Result execution error: io"
        );
    }

    #[test]
    fn test_handler_source_is_chained() {
        let err = ActionError::handler_with_source("lookup failed", anyhow::anyhow!("db down"));
        let source = err.source().map(ToString::to_string);
        assert_eq!(source.as_deref(), Some("db down"));
    }

    #[test]
    fn test_violation_message_names_filter_and_category() {
        let violation =
            UsageViolation::continued_after_short_circuit(FilterCategory::Action, "Audit");
        let message = violation.to_string();
        assert!(message.contains("action filter 'Audit'"));
        assert!(message.contains("set a Result"));
        assert!(message.contains("Filters in the action stage must either"));
        assert!(!message.contains("A action"));
        assert_eq!(violation.filter(), "Audit");

        let result =
            UsageViolation::continued_after_short_circuit(FilterCategory::Result, "Cache");
        assert!(result.to_string().contains("set Cancel to true"));
    }

    #[test]
    fn test_invoke_error_from_action_error() {
        let violation =
            UsageViolation::continued_after_short_circuit(FilterCategory::Resource, "r");
        assert!(matches!(
            InvokeError::from(ActionError::UsageContract(violation)),
            InvokeError::UsageContract(_)
        ));

        let fault = Fault::capture(ActionError::handler("x"), FaultOrigin::Unknown);
        let escaped = InvokeError::from(fault.rethrow());
        assert!(escaped.fault().is_some_and(|f| f.same_dispatch(&fault)));
    }
}
