//! The action context shared by every stage of one invocation.

use crate::action::ActionDescriptor;
use crate::request::HttpContext;
use crate::value_provider::ValueProviderFactory;
use indexmap::IndexMap;
use serde::Serialize;
use std::fmt;
use std::sync::Arc;

/// Route values captured by the router for this request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct RouteData {
    values: IndexMap<String, String>,
}

impl RouteData {
    /// Creates empty route data.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a value, builder style.
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(key, value);
        self
    }

    /// Inserts or replaces a value.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.values.insert(key.into(), value.into());
    }

    /// Returns a value.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    /// Iterates values in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Number of values.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns true if there are no values.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl fmt::Display for RouteData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("{")?;
        for (i, (key, value)) in self.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{key} = \"{value}\"")?;
        }
        f.write_str("}")
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for RouteData {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            values: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

/// Binding and validation errors keyed by parameter name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ModelState {
    errors: IndexMap<String, Vec<String>>,
}

impl ModelState {
    /// Records an error for `key`.
    pub fn add_error(&mut self, key: impl Into<String>, message: impl Into<String>) {
        self.errors.entry(key.into()).or_default().push(message.into());
    }

    /// Returns true when no errors were recorded.
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// Errors recorded for `key`.
    pub fn errors_for(&self, key: &str) -> &[String] {
        self.errors.get(key).map_or(&[], Vec::as_slice)
    }

    /// Total number of recorded errors.
    pub fn error_count(&self) -> usize {
        self.errors.values().map(Vec::len).sum()
    }

    /// Removes every error.
    pub fn clear(&mut self) {
        self.errors.clear();
    }
}

/// Where an invocation currently is.
///
/// ```text
/// NotStarted → Authorizing → ResourceExecuting → ExceptionGuardEntered
///   → ActionExecuting → ActionExecuted → ExceptionGuardExited
///   → ResultExecuting → ResultExecuted → ResourceExecuted → Completed | Faulted
/// ```
///
/// A short-circuit jumps from an executing state straight to the matching
/// executed state of the same stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineState {
    /// Nothing has run yet.
    NotStarted,
    /// Authorization filters are running.
    Authorizing,
    /// The resource stage has started.
    ResourceExecuting,
    /// The exception guard around the action stage is active.
    ExceptionGuardEntered,
    /// The action stage has started.
    ActionExecuting,
    /// The action stage has produced its executed context.
    ActionExecuted,
    /// The exception guard finished (and possibly rethrew).
    ExceptionGuardExited,
    /// The result stage has started.
    ResultExecuting,
    /// The result stage has produced its executed context.
    ResultExecuted,
    /// The resource stage has produced its executed context.
    ResourceExecuted,
    /// The invocation finished normally.
    Completed,
    /// A fault or usage violation escaped the invocation.
    Faulted,
}

impl PipelineState {
    /// Returns true for `Completed` and `Faulted`.
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Faulted)
    }
}

impl fmt::Display for PipelineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Everything one invocation knows about its request.
///
/// The context is owned by whichever stage is currently running. Stages hand
/// it down by value and take it back afterwards, so a mutation made by an
/// outer filter (for example adding a value-provider factory) is what every
/// inner stage sees.
#[derive(Default)]
pub struct ActionContext {
    action: Arc<ActionDescriptor>,
    http: HttpContext,
    route_data: RouteData,
    model_state: ModelState,
    value_provider_factories: Vec<Arc<dyn ValueProviderFactory>>,
    state: Vec<PipelineState>,
}

impl ActionContext {
    /// Creates a context for `action` serving `http`.
    pub fn new(action: Arc<ActionDescriptor>, http: HttpContext, route_data: RouteData) -> Self {
        Self {
            action,
            http,
            route_data,
            model_state: ModelState::default(),
            value_provider_factories: Vec::new(),
            state: vec![PipelineState::NotStarted],
        }
    }

    /// Sets the initial value-provider factories.
    #[must_use]
    pub fn with_value_provider_factories(
        mut self,
        factories: Vec<Arc<dyn ValueProviderFactory>>,
    ) -> Self {
        self.value_provider_factories = factories;
        self
    }

    /// Returns the action being invoked.
    pub fn action_descriptor(&self) -> &Arc<ActionDescriptor> {
        &self.action
    }

    /// Returns the HTTP context.
    pub fn http(&self) -> &HttpContext {
        &self.http
    }

    /// Returns mutable access to the HTTP context.
    pub fn http_mut(&mut self) -> &mut HttpContext {
        &mut self.http
    }

    /// Returns the route data.
    pub fn route_data(&self) -> &RouteData {
        &self.route_data
    }

    /// Returns mutable access to the route data.
    pub fn route_data_mut(&mut self) -> &mut RouteData {
        &mut self.route_data
    }

    /// Returns the model state.
    pub fn model_state(&self) -> &ModelState {
        &self.model_state
    }

    /// Returns mutable access to the model state.
    pub fn model_state_mut(&mut self) -> &mut ModelState {
        &mut self.model_state
    }

    /// Returns the value-provider factories, in lookup order.
    ///
    /// The list is read-only here; resource filters change it through their
    /// stage context.
    pub fn value_provider_factories(&self) -> &[Arc<dyn ValueProviderFactory>] {
        &self.value_provider_factories
    }

    /// Returns the current pipeline state.
    pub fn pipeline_state(&self) -> PipelineState {
        self.state.last().copied().unwrap_or(PipelineState::NotStarted)
    }

    /// Every state this invocation has been in, oldest first.
    pub fn state_trace(&self) -> &[PipelineState] {
        &self.state
    }

    /// Records a transition to `state`.
    pub fn enter_state(&mut self, state: PipelineState) {
        tracing::trace!(from = %self.pipeline_state(), to = %state, "pipeline state transition");
        self.state.push(state);
    }
}

impl fmt::Debug for ActionContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActionContext")
            .field("action", &self.action.display_name())
            .field("http", &self.http)
            .field("route_data", &self.route_data)
            .field("model_state", &self.model_state)
            .field(
                "value_provider_factories",
                &self.value_provider_factories.len(),
            )
            .field("state", &self.pipeline_state())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_route_data_display() {
        let route: RouteData = [("page", "/Orders"), ("id", "7")].into_iter().collect();
        assert_eq!(route.to_string(), r#"{page = "/Orders", id = "7"}"#);
        assert_eq!(route.get("id"), Some("7"));
        assert_eq!(route.len(), 2);
    }

    #[test]
    fn test_model_state() {
        let mut state = ModelState::default();
        assert!(state.is_valid());

        state.add_error("id", "required");
        state.add_error("id", "must be numeric");
        assert!(!state.is_valid());
        assert_eq!(state.errors_for("id").len(), 2);
        assert!(state.errors_for("name").is_empty());
        assert_eq!(state.error_count(), 2);

        state.clear();
        assert!(state.is_valid());
    }

    #[test]
    fn test_state_trace() {
        let mut ctx = ActionContext::new(
            Arc::new(ActionDescriptor::new("/Index")),
            HttpContext::default(),
            RouteData::new(),
        );
        assert_eq!(ctx.pipeline_state(), PipelineState::NotStarted);

        ctx.enter_state(PipelineState::ResourceExecuting);
        ctx.enter_state(PipelineState::Completed);
        assert!(ctx.pipeline_state().is_terminal());
        assert_eq!(
            ctx.state_trace(),
            &[
                PipelineState::NotStarted,
                PipelineState::ResourceExecuting,
                PipelineState::Completed
            ]
        );
    }

    #[test]
    fn test_default_context_is_empty() {
        let ctx = ActionContext::default();
        assert!(ctx.value_provider_factories().is_empty());
        assert_eq!(ctx.pipeline_state(), PipelineState::NotStarted);
    }
}
