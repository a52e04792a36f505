//! Action results.
//!
//! A result is the value a handler (or a short-circuiting filter) hands to
//! the result stage. Executing it is the [`ResultExecutor`]'s job; the
//! built-in [`ResponseResultExecutor`] simply lets each result write itself
//! into the [`HttpResponse`].

use crate::capability::{BoxFuture, ResultExecutor};
use crate::context::ActionContext;
use crate::error::ActionError;
use crate::request::HttpResponse;
use http::header::{HeaderValue, CONTENT_TYPE};
use http::StatusCode;
use std::any::Any;
use std::fmt;
use std::sync::Arc;

/// A result shared between the stages that observe it.
pub type SharedResult = Arc<dyn ActionResult>;

/// Upcast helper so results can be downcast to their concrete type.
pub trait AsAny: Any {
    /// Returns `self` as [`Any`].
    fn as_any(&self) -> &dyn Any;
}

impl<T: Any> AsAny for T {
    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// A value the result stage can execute.
pub trait ActionResult: AsAny + fmt::Debug + Send + Sync {
    /// Type name reported in logs and fault origins.
    fn result_type(&self) -> &'static str {
        std::any::type_name::<Self>()
    }

    /// Writes the result into `response`.
    fn apply(&self, _response: &mut HttpResponse) -> Result<(), ActionError> {
        Ok(())
    }
}

impl dyn ActionResult {
    /// Returns the concrete result if it is a `T`.
    pub fn downcast_ref<T: ActionResult>(&self) -> Option<&T> {
        self.as_any().downcast_ref()
    }

    /// Returns true if the result is a `T`.
    pub fn is<T: ActionResult>(&self) -> bool {
        self.as_any().is::<T>()
    }
}

/// Executed when nothing else produced a result. Writes nothing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EmptyResult;

impl EmptyResult {
    /// Returns a shared empty result.
    pub fn shared() -> SharedResult {
        Arc::new(Self)
    }
}

impl ActionResult for EmptyResult {}

/// Sets a status code and nothing else.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusCodeResult(pub StatusCode);

impl ActionResult for StatusCodeResult {
    fn apply(&self, response: &mut HttpResponse) -> Result<(), ActionError> {
        response.set_status(self.0);
        Ok(())
    }
}

/// A textual body with a content type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentResult {
    content: String,
    content_type: &'static str,
    status: StatusCode,
}

impl ContentResult {
    /// A `text/plain` body.
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            content_type: "text/plain; charset=utf-8",
            status: StatusCode::OK,
        }
    }

    /// A `text/html` body.
    pub fn html(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            content_type: "text/html; charset=utf-8",
            status: StatusCode::OK,
        }
    }

    /// Overrides the status code.
    #[must_use]
    pub fn with_status(mut self, status: StatusCode) -> Self {
        self.status = status;
        self
    }

    /// The body.
    pub fn content(&self) -> &str {
        &self.content
    }

    /// The status code.
    pub fn status(&self) -> StatusCode {
        self.status
    }
}

impl ActionResult for ContentResult {
    fn apply(&self, response: &mut HttpResponse) -> Result<(), ActionError> {
        response.set_status(self.status);
        response
            .headers_mut()
            .insert(CONTENT_TYPE, HeaderValue::from_static(self.content_type));
        response.set_body(self.content.clone());
        Ok(())
    }
}

/// A JSON body.
#[derive(Debug, Clone, PartialEq)]
pub struct JsonResult {
    value: serde_json::Value,
    status: StatusCode,
}

impl JsonResult {
    /// Wraps an already serialized value.
    pub fn new(value: serde_json::Value) -> Self {
        Self {
            value,
            status: StatusCode::OK,
        }
    }

    /// Serializes `value`.
    pub fn from_serialize<T: serde::Serialize>(value: &T) -> Result<Self, ActionError> {
        Ok(Self::new(serde_json::to_value(value)?))
    }

    /// Overrides the status code.
    #[must_use]
    pub fn with_status(mut self, status: StatusCode) -> Self {
        self.status = status;
        self
    }

    /// The value.
    pub fn value(&self) -> &serde_json::Value {
        &self.value
    }
}

impl ActionResult for JsonResult {
    fn apply(&self, response: &mut HttpResponse) -> Result<(), ActionError> {
        let body = serde_json::to_vec(&self.value)?;
        response.set_status(self.status);
        response
            .headers_mut()
            .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        response.set_body(body);
        Ok(())
    }
}

/// Executes results by letting them write into the request's response.
#[derive(Debug, Clone, Copy, Default)]
pub struct ResponseResultExecutor;

impl ResultExecutor for ResponseResultExecutor {
    fn execute<'a>(
        &'a self,
        ctx: &'a mut ActionContext,
        result: &'a SharedResult,
    ) -> BoxFuture<'a, Result<(), ActionError>> {
        Box::pin(async move { result.apply(ctx.http_mut().response_mut()) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_downcast() {
        let result: SharedResult = Arc::new(StatusCodeResult(StatusCode::ACCEPTED));
        assert!(result.is::<StatusCodeResult>());
        assert!(!result.is::<EmptyResult>());
        assert_eq!(
            result.downcast_ref::<StatusCodeResult>(),
            Some(&StatusCodeResult(StatusCode::ACCEPTED))
        );
    }

    #[test]
    fn test_result_type_names_concrete_type() {
        assert!(EmptyResult::shared().result_type().ends_with("EmptyResult"));
    }

    #[test]
    fn test_content_result_writes_body() {
        let mut response = HttpResponse::default();
        ContentResult::html("<p>hi</p>")
            .with_status(StatusCode::CREATED)
            .apply(&mut response)
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        assert_eq!(response.headers()[CONTENT_TYPE], "text/html; charset=utf-8");
        assert_eq!(response.body().as_ref(), b"<p>hi</p>");
    }

    #[tokio::test]
    async fn test_response_executor_applies_json() {
        let mut ctx = ActionContext::default();
        let result: SharedResult = Arc::new(JsonResult::new(json!({ "id": 1 })));
        ResponseResultExecutor
            .execute(&mut ctx, &result)
            .await
            .unwrap();

        let response = ctx.http().response();
        assert_eq!(response.headers()[CONTENT_TYPE], "application/json");
        assert_eq!(response.body().as_ref(), br#"{"id":1}"#);
    }

    #[test]
    fn test_empty_result_leaves_response_alone() {
        let mut response = HttpResponse::default();
        EmptyResult.apply(&mut response).unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.body().is_empty());
    }
}
