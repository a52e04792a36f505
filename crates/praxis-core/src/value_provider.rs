//! Value providers.
//!
//! Value providers expose request data (route values, query string, ...) to
//! parameter binding under a uniform key lookup. The list of factories lives
//! on the [`ActionContext`] and resource filters may rearrange it before
//! binding happens.

use crate::context::ActionContext;
use crate::error::ActionError;
use indexmap::IndexMap;
use std::fmt;

/// Looks up raw request values by key.
pub trait ValueProvider: Send + Sync {
    /// Returns the value for `key`.
    fn get_value(&self, key: &str) -> Option<String>;
}

/// Creates a [`ValueProvider`] for a request.
pub trait ValueProviderFactory: Send + Sync + fmt::Debug {
    /// Name reported in logs.
    fn name(&self) -> &str;

    /// Creates a provider, or `None` if this request has nothing to offer.
    fn create_value_provider(
        &self,
        ctx: &ActionContext,
    ) -> Result<Option<Box<dyn ValueProvider>>, ActionError>;
}

/// A provider backed by an in-memory map.
#[derive(Debug, Clone, Default)]
pub struct DictionaryValueProvider {
    values: IndexMap<String, String>,
}

impl DictionaryValueProvider {
    /// Creates a provider from key/value pairs. The first occurrence of a key wins.
    pub fn new<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        let mut values = IndexMap::new();
        for (key, value) in pairs {
            values.entry(key.into()).or_insert_with(|| value.into());
        }
        Self { values }
    }
}

impl ValueProvider for DictionaryValueProvider {
    fn get_value(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }
}

/// Exposes route values.
#[derive(Debug, Clone, Copy, Default)]
pub struct RouteValueProviderFactory;

impl ValueProviderFactory for RouteValueProviderFactory {
    fn name(&self) -> &str {
        "route"
    }

    fn create_value_provider(
        &self,
        ctx: &ActionContext,
    ) -> Result<Option<Box<dyn ValueProvider>>, ActionError> {
        if ctx.route_data().is_empty() {
            return Ok(None);
        }
        Ok(Some(Box::new(DictionaryValueProvider::new(
            ctx.route_data().iter(),
        ))))
    }
}

/// Exposes the query string.
#[derive(Debug, Clone, Copy, Default)]
pub struct QueryStringValueProviderFactory;

impl ValueProviderFactory for QueryStringValueProviderFactory {
    fn name(&self) -> &str {
        "query"
    }

    fn create_value_provider(
        &self,
        ctx: &ActionContext,
    ) -> Result<Option<Box<dyn ValueProvider>>, ActionError> {
        let Some(query) = ctx.http().query() else {
            return Ok(None);
        };
        let pairs: Vec<(String, String)> = serde_urlencoded::from_str(query)
            .map_err(|e| ActionError::binding(format!("malformed query string: {e}")))?;
        Ok(Some(Box::new(DictionaryValueProvider::new(pairs))))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::ActionDescriptor;
    use crate::context::RouteData;
    use crate::request::HttpContext;
    use http::{Method, Uri};
    use std::sync::Arc;

    fn ctx(uri: &'static str, route: RouteData) -> ActionContext {
        ActionContext::new(
            Arc::new(ActionDescriptor::new("/Index")),
            HttpContext::new(Method::GET, Uri::from_static(uri)),
            route,
        )
    }

    #[test]
    fn test_route_values() {
        let ctx = ctx("/", RouteData::new().with("id", "42"));
        let provider = RouteValueProviderFactory
            .create_value_provider(&ctx)
            .unwrap()
            .unwrap();
        assert_eq!(provider.get_value("id").as_deref(), Some("42"));
        assert_eq!(provider.get_value("other"), None);
    }

    #[test]
    fn test_no_route_values_means_no_provider() {
        let ctx = ctx("/", RouteData::new());
        assert!(RouteValueProviderFactory
            .create_value_provider(&ctx)
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_query_values_are_decoded_and_first_wins() {
        let ctx = ctx("/?name=ada%20l&tag=a&tag=b", RouteData::new());
        let provider = QueryStringValueProviderFactory
            .create_value_provider(&ctx)
            .unwrap()
            .unwrap();
        assert_eq!(provider.get_value("name").as_deref(), Some("ada l"));
        assert_eq!(provider.get_value("tag").as_deref(), Some("a"));
    }

    #[test]
    fn test_missing_query_means_no_provider() {
        let ctx = ctx("/orders", RouteData::new());
        assert!(QueryStringValueProviderFactory
            .create_value_provider(&ctx)
            .unwrap()
            .is_none());
    }
}
