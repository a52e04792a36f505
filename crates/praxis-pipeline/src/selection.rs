//! Default handler selection.

use crate::log;
use http::Method;
use praxis_core::{ActionContext, HandlerDescriptor, HandlerSelector};
use std::sync::Arc;

/// Selects a handler by HTTP method and handler name.
///
/// The handler name comes from the route value named by the handler key,
/// falling back to the query string parameter of the same name. Unnamed
/// handlers answer requests that name no handler. `HEAD` falls back to the
/// `GET` handlers when none answer `HEAD` directly.
///
/// When several handlers match, the first declared wins; the ambiguity is
/// logged, not rejected.
#[derive(Debug, Clone)]
pub struct DefaultHandlerSelector {
    handler_key: String,
    head_falls_back_to_get: bool,
}

impl Default for DefaultHandlerSelector {
    fn default() -> Self {
        Self {
            handler_key: "handler".to_string(),
            head_falls_back_to_get: true,
        }
    }
}

impl DefaultHandlerSelector {
    /// Creates a selector with the default handler key.
    pub fn new() -> Self {
        Self::default()
    }

    /// Uses `key` to look up the requested handler name.
    #[must_use]
    pub fn with_handler_key(mut self, key: impl Into<String>) -> Self {
        self.handler_key = key.into();
        self
    }

    /// Enables or disables the `HEAD` to `GET` fallback.
    #[must_use]
    pub fn with_head_fallback(mut self, enabled: bool) -> Self {
        self.head_falls_back_to_get = enabled;
        self
    }

    fn requested_name(&self, ctx: &ActionContext) -> Option<String> {
        let routed = ctx.route_data().get(&self.handler_key);
        if let Some(name) = routed.filter(|name| !name.is_empty()) {
            return Some(name.to_string());
        }
        let query = ctx.http().query()?;
        serde_urlencoded::from_str::<Vec<(String, String)>>(query)
            .ok()?
            .into_iter()
            .find(|(key, _)| *key == self.handler_key)
            .map(|(_, value)| value)
            .filter(|value| !value.is_empty())
    }

    fn candidates(
        ctx: &ActionContext,
        method: &Method,
        name: Option<&str>,
    ) -> Vec<Arc<HandlerDescriptor>> {
        ctx.action_descriptor()
            .handlers_for(method)
            .filter(|handler| match (handler.name(), name) {
                (Some(declared), Some(requested)) => declared.eq_ignore_ascii_case(requested),
                (None, None) => true,
                _ => false,
            })
            .cloned()
            .collect()
    }
}

impl HandlerSelector for DefaultHandlerSelector {
    fn select(&self, ctx: &ActionContext) -> Option<Arc<HandlerDescriptor>> {
        let name = self.requested_name(ctx);
        let method = ctx.http().method();

        let mut candidates = Self::candidates(ctx, method, name.as_deref());
        if candidates.is_empty() && self.head_falls_back_to_get && *method == Method::HEAD {
            candidates = Self::candidates(ctx, &Method::GET, name.as_deref());
        }
        if candidates.len() > 1 {
            log::ambiguous_handlers(ctx, candidates.len());
        }
        candidates.into_iter().next()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use praxis_core::{ActionDescriptor, HandlerMethod, HttpContext, RouteData};

    fn noop() -> HandlerMethod {
        HandlerMethod::unit(|_| async { Ok(()) })
    }

    fn action() -> Arc<ActionDescriptor> {
        Arc::new(
            ActionDescriptor::new("/Orders")
                .with_handler(HandlerDescriptor::new(Method::GET, noop()))
                .with_handler(HandlerDescriptor::new(Method::POST, noop()))
                .with_handler(HandlerDescriptor::new(Method::POST, noop()).named("Cancel"))
                .with_handler(HandlerDescriptor::new(Method::POST, noop()).named("cancel")),
        )
    }

    fn ctx(method: Method, uri: &'static str, route: RouteData) -> ActionContext {
        ActionContext::new(action(), HttpContext::new(method, uri.parse().unwrap()), route)
    }

    fn selected(ctx: &ActionContext) -> Option<String> {
        DefaultHandlerSelector::new()
            .select(ctx)
            .map(|handler| handler.display_name())
    }

    #[test]
    fn test_unnamed_handler_by_method() {
        let get = ctx(Method::GET, "/orders", RouteData::new());
        assert_eq!(selected(&get).as_deref(), Some("GET:default"));

        let post = ctx(Method::POST, "/orders", RouteData::new());
        assert_eq!(selected(&post).as_deref(), Some("POST:default"));
    }

    #[test]
    fn test_named_handler_from_query() {
        let ctx = ctx(Method::POST, "/orders?handler=cancel", RouteData::new());
        let handler = DefaultHandlerSelector::new().select(&ctx).unwrap();
        // Both "Cancel" and "cancel" match; the first declared wins.
        assert_eq!(handler.name(), Some("Cancel"));
    }

    #[test]
    fn test_route_value_beats_query() {
        let route = RouteData::new().with("handler", "missing");
        let ctx = ctx(Method::POST, "/orders?handler=cancel", route);
        assert_eq!(selected(&ctx), None);
    }

    #[test]
    fn test_empty_route_value_is_ignored() {
        let route = RouteData::new().with("handler", "");
        let unnamed = ctx(Method::POST, "/orders", route.clone());
        assert_eq!(selected(&unnamed).as_deref(), Some("POST:default"));

        let queried = ctx(Method::POST, "/orders?handler=cancel", route);
        assert_eq!(selected(&queried).as_deref(), Some("POST:Cancel"));
    }

    #[test]
    fn test_named_request_does_not_fall_back_to_unnamed() {
        let ctx = ctx(Method::GET, "/orders?handler=export", RouteData::new());
        assert_eq!(selected(&ctx), None);
    }

    #[test]
    fn test_head_falls_back_to_get() {
        let ctx = ctx(Method::HEAD, "/orders", RouteData::new());
        assert_eq!(selected(&ctx).as_deref(), Some("GET:default"));

        let strict = DefaultHandlerSelector::new().with_head_fallback(false);
        assert!(strict.select(&ctx).is_none());
    }

    #[test]
    fn test_custom_handler_key() {
        let ctx = ctx(Method::POST, "/orders?op=cancel", RouteData::new());
        let selector = DefaultHandlerSelector::new().with_handler_key("op");
        assert_eq!(
            selector.select(&ctx).and_then(|h| h.name().map(str::to_owned)),
            Some("Cancel".to_string())
        );
    }
}
