//! Action descriptors.

use crate::handler::HandlerDescriptor;
use http::Method;
use indexmap::IndexMap;
use std::sync::Arc;

/// Static description of an action: its name, route values and the handler
/// methods it can dispatch to.
///
/// Descriptors are built once when the pipeline is constructed and shared by
/// every invocation.
///
/// # Example
///
/// ```
/// use praxis_core::{ActionDescriptor, HandlerDescriptor, HandlerMethod};
/// use http::Method;
///
/// let action = ActionDescriptor::new("/Orders/Index")
///     .with_route_value("page", "/Orders/Index")
///     .with_handler(HandlerDescriptor::new(Method::GET, HandlerMethod::unit(|_| async { Ok(()) })));
///
/// assert_eq!(action.handlers().len(), 1);
/// assert_eq!(action.handlers_for(&Method::GET).count(), 1);
/// ```
#[derive(Debug, Clone, Default)]
pub struct ActionDescriptor {
    display_name: String,
    route_values: IndexMap<String, String>,
    handlers: Vec<Arc<HandlerDescriptor>>,
}

impl ActionDescriptor {
    /// Creates a descriptor with the given display name.
    pub fn new(display_name: impl Into<String>) -> Self {
        Self {
            display_name: display_name.into(),
            route_values: IndexMap::new(),
            handlers: Vec::new(),
        }
    }

    /// Adds a route value.
    #[must_use]
    pub fn with_route_value(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.route_values.insert(key.into(), value.into());
        self
    }

    /// Adds a handler method.
    #[must_use]
    pub fn with_handler(mut self, handler: HandlerDescriptor) -> Self {
        self.handlers.push(Arc::new(handler));
        self
    }

    /// Human-readable name used in logs and diagnostics.
    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    /// Route values the action was registered under.
    pub fn route_values(&self) -> &IndexMap<String, String> {
        &self.route_values
    }

    /// All handler methods, in declaration order.
    pub fn handlers(&self) -> &[Arc<HandlerDescriptor>] {
        &self.handlers
    }

    /// Handler methods answering `method`, in declaration order.
    pub fn handlers_for<'a>(
        &'a self,
        method: &'a Method,
    ) -> impl Iterator<Item = &'a Arc<HandlerDescriptor>> + 'a {
        self.handlers
            .iter()
            .filter(move |handler| handler.http_method() == method)
    }
}
