//! Captured faults.
//!
//! A [`Fault`] is the capture-and-resume handle for an error raised inside the
//! pipeline: the error itself plus a [`DispatchInfo`] recording where and when
//! it was first observed. Faults are cheap to clone and are re-raised with
//! [`Fault::rethrow`], which keeps the original dispatch info intact no matter
//! how many stage boundaries the fault crosses.

use crate::category::FilterCategory;
use crate::error::ActionError;
use chrono::{DateTime, Utc};
use std::backtrace::Backtrace;
use std::fmt;
use std::sync::Arc;
use uuid::Uuid;

/// Where a fault was raised.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FaultOrigin {
    /// Raised by a filter hook.
    Filter {
        /// Category of the filter.
        category: FilterCategory,
        /// Name of the filter.
        filter: String,
    },
    /// Raised by the handler method.
    Handler {
        /// Display name of the handler.
        handler: String,
    },
    /// Raised while binding handler parameters.
    ParameterBinding {
        /// Display name of the handler being bound.
        handler: String,
    },
    /// Raised by the result executor.
    ResultExecution {
        /// Type name of the result being executed.
        result_type: &'static str,
    },
    /// Raised somewhere the pipeline could not attribute.
    Unknown,
}

impl FaultOrigin {
    /// Creates a filter origin.
    pub fn filter(category: FilterCategory, filter: impl Into<String>) -> Self {
        Self::Filter {
            category,
            filter: filter.into(),
        }
    }

    /// Classifies the origin.
    #[must_use]
    pub const fn kind(&self) -> FaultKind {
        match self {
            Self::Handler { .. } | Self::ParameterBinding { .. } => FaultKind::HandlerFault,
            Self::Filter { .. } => FaultKind::FilterFault,
            Self::ResultExecution { .. } => FaultKind::ResultFault,
            Self::Unknown => FaultKind::Unclassified,
        }
    }
}

impl fmt::Display for FaultOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Filter { category, filter } => write!(f, "{category} filter '{filter}'"),
            Self::Handler { handler } => write!(f, "handler '{handler}'"),
            Self::ParameterBinding { handler } => write!(f, "parameter binding for '{handler}'"),
            Self::ResultExecution { result_type } => write!(f, "execution of '{result_type}'"),
            Self::Unknown => f.write_str("unknown origin"),
        }
    }
}

/// Fault taxonomy used for recovery decisions and diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FaultKind {
    /// Raised by the handler method or its parameter binding.
    HandlerFault,
    /// Raised inside a filter's own hook.
    FilterFault,
    /// Raised while executing a result.
    ResultFault,
    /// Origin not known.
    Unclassified,
}

/// Where and when a fault was first captured.
#[derive(Debug, Clone)]
pub struct DispatchInfo {
    id: Uuid,
    origin: FaultOrigin,
    captured_at: DateTime<Utc>,
    backtrace: Arc<Backtrace>,
}

impl DispatchInfo {
    fn capture(origin: FaultOrigin) -> Self {
        Self {
            id: Uuid::now_v7(),
            origin,
            captured_at: Utc::now(),
            backtrace: Arc::new(Backtrace::capture()),
        }
    }

    /// Identity of the capture; stable across rethrows.
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Where the fault was raised.
    pub fn origin(&self) -> &FaultOrigin {
        &self.origin
    }

    /// When the fault was captured.
    pub fn captured_at(&self) -> DateTime<Utc> {
        self.captured_at
    }

    /// Backtrace at the capture site (empty unless `RUST_BACKTRACE` is set).
    pub fn backtrace(&self) -> &Backtrace {
        &self.backtrace
    }
}

/// A captured error plus its dispatch info.
///
/// # Example
///
/// ```
/// use praxis_core::{ActionError, Fault, FaultOrigin};
///
/// let fault = Fault::capture(
///     ActionError::handler("boom"),
///     FaultOrigin::Handler { handler: "GET:default".into() },
/// );
///
/// // Capturing a rethrown fault keeps the original identity.
/// let again = Fault::capture(fault.rethrow(), FaultOrigin::Unknown);
/// assert!(again.same_dispatch(&fault));
/// ```
#[derive(Debug, Clone)]
pub struct Fault {
    error: Arc<ActionError>,
    dispatch: DispatchInfo,
}

impl Fault {
    /// Captures `error` raised at `origin`.
    ///
    /// If `error` is itself a rethrown fault, that fault is returned unchanged
    /// and `origin` is ignored.
    pub fn capture(error: ActionError, origin: FaultOrigin) -> Self {
        match error {
            ActionError::Faulted(fault) => fault,
            error => Self {
                error: Arc::new(error),
                dispatch: DispatchInfo::capture(origin),
            },
        }
    }

    /// Returns the captured error.
    pub fn error(&self) -> &ActionError {
        &self.error
    }

    /// Returns the dispatch info.
    pub fn dispatch(&self) -> &DispatchInfo {
        &self.dispatch
    }

    /// Shorthand for `dispatch().origin()`.
    pub fn origin(&self) -> &FaultOrigin {
        &self.dispatch.origin
    }

    /// Shorthand for `origin().kind()`.
    pub fn kind(&self) -> FaultKind {
        self.dispatch.origin.kind()
    }

    /// Returns true when both handles come from the same capture.
    pub fn same_dispatch(&self, other: &Fault) -> bool {
        self.dispatch.id == other.dispatch.id
    }

    /// Re-raises the fault as an error without touching its dispatch info.
    #[must_use]
    pub fn rethrow(&self) -> ActionError {
        ActionError::Faulted(self.clone())
    }
}

impl fmt::Display for Fault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (raised by {})", self.error, self.dispatch.origin)
    }
}

impl std::error::Error for Fault {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(self.error.as_ref())
    }
}
