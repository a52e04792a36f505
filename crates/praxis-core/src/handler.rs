//! Handler methods and their parameters.
//!
//! A handler is resolved into a [`HandlerMethod`] once, when its descriptor is
//! built. The pipeline then calls the stored closure directly with the bound
//! [`Arguments`]; nothing is looked up per request.

use crate::capability::BoxFuture;
use crate::error::ActionError;
use crate::result::{ActionResult, JsonResult, SharedResult};
use http::Method;
use indexmap::IndexMap;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

/// Bound handler arguments, keyed by parameter name in declaration order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Arguments {
    values: IndexMap<String, serde_json::Value>,
}

impl Arguments {
    /// Creates an empty argument set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an argument, builder style.
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.insert(name, value);
        self
    }

    /// Inserts or replaces an argument.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<serde_json::Value>) {
        self.values.insert(name.into(), value.into());
    }

    /// Removes an argument.
    pub fn remove(&mut self, name: &str) -> Option<serde_json::Value> {
        self.values.shift_remove(name)
    }

    /// Returns the raw value of an argument.
    pub fn get(&self, name: &str) -> Option<&serde_json::Value> {
        self.values.get(name)
    }

    /// Deserializes an argument into `T`.
    ///
    /// Raw request values arrive as strings, so a string that does not fit
    /// `T` directly is retried as a JSON literal (`"42"` binds to a `u32`).
    /// Returns a binding error naming the parameter when it is missing or has
    /// the wrong shape.
    pub fn get_as<T: DeserializeOwned>(&self, name: &str) -> Result<T, ActionError> {
        let value = self
            .values
            .get(name)
            .ok_or_else(|| ActionError::binding_for(name, format!("missing argument '{name}'")))?;
        let invalid = |e: serde_json::Error| {
            ActionError::binding_for(name, format!("invalid argument '{name}': {e}"))
        };
        match serde_json::from_value(value.clone()) {
            Ok(typed) => Ok(typed),
            Err(e) => match value {
                serde_json::Value::String(raw) => {
                    serde_json::from_str(raw).map_err(|_| invalid(e))
                }
                _ => Err(invalid(e)),
            },
        }
    }

    /// Iterates arguments in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &serde_json::Value)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Number of arguments.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns true if there are no arguments.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// A handler parameter the binder must supply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParameterDescriptor {
    name: String,
    required: bool,
}

impl ParameterDescriptor {
    /// An optional parameter.
    pub fn optional(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            required: false,
        }
    }

    /// A required parameter.
    pub fn required(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            required: true,
        }
    }

    /// Parameter name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether binding must find a value.
    pub fn is_required(&self) -> bool {
        self.required
    }
}

type UnitFn = dyn Fn(Arguments) -> BoxFuture<'static, Result<(), ActionError>> + Send + Sync;
type ResultFn = dyn Fn(Arguments) -> BoxFuture<'static, Result<SharedResult, ActionError>> + Send + Sync;
type ValueFn =
    dyn Fn(Arguments) -> BoxFuture<'static, Result<serde_json::Value, ActionError>> + Send + Sync;

/// The shape of a handler method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HandlerKind {
    /// Produces no result; the action renders its default result.
    Unit,
    /// Produces an action result.
    Result,
    /// Produces a serializable value, rendered as JSON.
    Value,
}

/// A directly invocable handler, resolved once from a closure.
///
/// # Example
///
/// ```
/// use praxis_core::{Arguments, ContentResult, HandlerKind, HandlerMethod};
///
/// let greet = HandlerMethod::result(|args: Arguments| async move {
///     let name: String = args.get_as("name")?;
///     Ok(ContentResult::text(format!("hello {name}")))
/// });
/// assert_eq!(greet.kind(), HandlerKind::Result);
/// ```
#[derive(Clone)]
pub enum HandlerMethod {
    /// See [`HandlerKind::Unit`].
    Unit(Arc<UnitFn>),
    /// See [`HandlerKind::Result`].
    Result(Arc<ResultFn>),
    /// See [`HandlerKind::Value`].
    Value(Arc<ValueFn>),
}

impl HandlerMethod {
    /// Wraps a handler that returns nothing.
    pub fn unit<F, Fut>(handler: F) -> Self
    where
        F: Fn(Arguments) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), ActionError>> + Send + 'static,
    {
        Self::Unit(Arc::new(
            move |args: Arguments| -> BoxFuture<'static, Result<(), ActionError>> {
                Box::pin(handler(args))
            },
        ))
    }

    /// Wraps a handler that returns an action result.
    pub fn result<F, Fut, R>(handler: F) -> Self
    where
        F: Fn(Arguments) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<R, ActionError>> + Send + 'static,
        R: ActionResult,
    {
        Self::Result(Arc::new(
            move |args: Arguments| -> BoxFuture<'static, Result<SharedResult, ActionError>> {
                let pending = handler(args);
                Box::pin(async move {
                    let result = pending.await?;
                    Ok(Arc::new(result) as SharedResult)
                })
            },
        ))
    }

    /// Wraps a handler that returns a serializable value.
    pub fn value<F, Fut, T>(handler: F) -> Self
    where
        F: Fn(Arguments) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, ActionError>> + Send + 'static,
        T: Serialize + Send + 'static,
    {
        Self::Value(Arc::new(
            move |args: Arguments| -> BoxFuture<'static, Result<serde_json::Value, ActionError>> {
                let pending = handler(args);
                Box::pin(async move {
                    let value = pending.await?;
                    Ok(serde_json::to_value(value)?)
                })
            },
        ))
    }

    /// Returns the handler shape.
    pub fn kind(&self) -> HandlerKind {
        match self {
            Self::Unit(_) => HandlerKind::Unit,
            Self::Result(_) => HandlerKind::Result,
            Self::Value(_) => HandlerKind::Value,
        }
    }

    /// Calls the handler.
    pub async fn invoke(&self, arguments: Arguments) -> Result<Option<SharedResult>, ActionError> {
        match self {
            Self::Unit(handler) => {
                handler(arguments).await?;
                Ok(None)
            }
            Self::Result(handler) => Ok(Some(handler(arguments).await?)),
            Self::Value(handler) => {
                let value = handler(arguments).await?;
                Ok(Some(Arc::new(JsonResult::new(value)) as SharedResult))
            }
        }
    }
}

impl fmt::Debug for HandlerMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("HandlerMethod").field(&self.kind()).finish()
    }
}

/// A handler method an action can dispatch to.
#[derive(Debug, Clone)]
pub struct HandlerDescriptor {
    http_method: Method,
    name: Option<String>,
    parameters: Vec<ParameterDescriptor>,
    method: HandlerMethod,
}

impl HandlerDescriptor {
    /// Creates an unnamed handler for `http_method`.
    pub fn new(http_method: Method, method: HandlerMethod) -> Self {
        Self {
            http_method,
            name: None,
            parameters: Vec::new(),
            method,
        }
    }

    /// Names the handler; named handlers are selected with the handler key.
    #[must_use]
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Declares a parameter.
    #[must_use]
    pub fn with_parameter(mut self, parameter: ParameterDescriptor) -> Self {
        self.parameters.push(parameter);
        self
    }

    /// HTTP method the handler answers.
    pub fn http_method(&self) -> &Method {
        &self.http_method
    }

    /// Handler name, if any.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Declared parameters.
    pub fn parameters(&self) -> &[ParameterDescriptor] {
        &self.parameters
    }

    /// The invocable method.
    pub fn method(&self) -> &HandlerMethod {
        &self.method
    }

    /// Name used in logs, e.g. `POST:cancel` or `GET:default`.
    pub fn display_name(&self) -> String {
        format!(
            "{}:{}",
            self.http_method,
            self.name.as_deref().unwrap_or("default")
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::result::ContentResult;
    use serde_json::json;

    #[test]
    fn test_arguments_typed_access() {
        let args = Arguments::new().with("id", 7).with("name", "ada");
        assert_eq!(args.get_as::<u32>("id").unwrap(), 7);
        assert_eq!(args.get_as::<String>("name").unwrap(), "ada");
        assert!(matches!(
            args.get_as::<u32>("missing"),
            Err(ActionError::Binding { parameter: Some(p), .. }) if p == "missing"
        ));
        assert!(args.get_as::<u32>("name").is_err());

        let raw = Arguments::new().with("id", "42").with("zip", "01234");
        assert_eq!(raw.get_as::<u32>("id").unwrap(), 42);
        assert_eq!(raw.get_as::<String>("zip").unwrap(), "01234");
    }

    #[test]
    fn test_arguments_preserve_order() {
        let mut args = Arguments::new().with("b", 1).with("a", 2);
        let names: Vec<_> = args.iter().map(|(name, _)| name).collect();
        assert_eq!(names, ["b", "a"]);
        assert_eq!(args.remove("b"), Some(json!(1)));
        assert_eq!(args.len(), 1);
    }

    #[tokio::test]
    async fn test_unit_handler_produces_no_result() {
        let method = HandlerMethod::unit(|_| async { Ok(()) });
        assert_eq!(method.kind(), HandlerKind::Unit);
        assert!(method.invoke(Arguments::new()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_result_handler() {
        let method = HandlerMethod::result(|args: Arguments| async move {
            let id: u32 = args.get_as("id")?;
            Ok(ContentResult::text(format!("order {id}")))
        });
        let result = method
            .invoke(Arguments::new().with("id", 3))
            .await
            .unwrap()
            .unwrap();
        let content = result.downcast_ref::<ContentResult>().unwrap();
        assert_eq!(content.content(), "order 3");
    }

    #[tokio::test]
    async fn test_value_handler_renders_json() {
        let method = HandlerMethod::value(|_| async { Ok(json!({ "ok": true })) });
        let result = method.invoke(Arguments::new()).await.unwrap().unwrap();
        let json = result.downcast_ref::<JsonResult>().unwrap();
        assert_eq!(json.value(), &json!({ "ok": true }));
    }

    #[tokio::test]
    async fn test_handler_errors_propagate() {
        let method = HandlerMethod::unit(|_| async { Err(ActionError::handler("boom")) });
        let err = method.invoke(Arguments::new()).await.unwrap_err();
        assert_eq!(err.to_string(), "Handler error: boom");
    }

    #[test]
    fn test_display_name() {
        let unnamed = HandlerDescriptor::new(Method::GET, HandlerMethod::unit(|_| async { Ok(()) }));
        assert_eq!(unnamed.display_name(), "GET:default");
        let named = unnamed.clone().named("cancel");
        assert_eq!(named.display_name(), "GET:cancel");
        assert_eq!(named.name(), Some("cancel"));
    }
}
