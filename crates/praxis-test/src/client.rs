//! Test client for in-memory pipeline invocation.

use crate::error::TestError;
use crate::request::{TestRequest, TestRequestBuilder};
use crate::response::TestResponse;
use bytes::Bytes;
use http::Method;
use praxis_core::RequestId;
use praxis_pipeline::ActionPipeline;
use serde::Serialize;

/// A test client that invokes an [`ActionPipeline`] without a server.
///
/// # Example
///
/// ```
/// use http::{Method, StatusCode};
/// use praxis_core::{ActionDescriptor, ContentResult, HandlerDescriptor, HandlerMethod};
/// use praxis_pipeline::ActionPipeline;
/// use praxis_test::TestClient;
///
/// # tokio_test::block_on(async {
/// let action = ActionDescriptor::new("/Ping").with_handler(HandlerDescriptor::new(
///     Method::GET,
///     HandlerMethod::result(|_| async { Ok(ContentResult::text("pong")) }),
/// ));
/// let client = TestClient::new(ActionPipeline::builder(action).build());
///
/// let response = client.get("/ping").send().await.unwrap();
/// response.assert_status(StatusCode::OK).assert_text("pong");
/// # });
/// ```
#[must_use]
#[derive(Debug, Clone)]
pub struct TestClient {
    pipeline: ActionPipeline,
    default_headers: Vec<(String, String)>,
}

impl TestClient {
    /// Creates a client for `pipeline`.
    pub fn new(pipeline: ActionPipeline) -> Self {
        Self {
            pipeline,
            default_headers: Vec::new(),
        }
    }

    /// Adds a header that will be included in all requests.
    pub fn with_default_header(
        mut self,
        name: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        self.default_headers.push((name.into(), value.into()));
        self
    }

    /// The pipeline requests are sent to.
    pub fn pipeline(&self) -> &ActionPipeline {
        &self.pipeline
    }

    /// Creates a GET request builder.
    pub fn get(&self, uri: impl AsRef<str>) -> TestClientRequest<'_> {
        TestClientRequest::new(self, TestRequest::get(uri))
    }

    /// Creates a POST request builder.
    pub fn post(&self, uri: impl AsRef<str>) -> TestClientRequest<'_> {
        TestClientRequest::new(self, TestRequest::post(uri))
    }

    /// Creates a PUT request builder.
    pub fn put(&self, uri: impl AsRef<str>) -> TestClientRequest<'_> {
        TestClientRequest::new(self, TestRequest::put(uri))
    }

    /// Creates a PATCH request builder.
    pub fn patch(&self, uri: impl AsRef<str>) -> TestClientRequest<'_> {
        TestClientRequest::new(self, TestRequest::patch(uri))
    }

    /// Creates a DELETE request builder.
    pub fn delete(&self, uri: impl AsRef<str>) -> TestClientRequest<'_> {
        TestClientRequest::new(self, TestRequest::delete(uri))
    }

    /// Creates a HEAD request builder.
    pub fn head(&self, uri: impl AsRef<str>) -> TestClientRequest<'_> {
        TestClientRequest::new(self, TestRequest::head(uri))
    }

    /// Creates a request builder with a custom method.
    pub fn request(&self, method: Method, uri: impl AsRef<str>) -> TestClientRequest<'_> {
        TestClientRequest::new(self, TestRequestBuilder::new(method, uri))
    }

    /// Invokes the pipeline with a built request.
    ///
    /// # Errors
    ///
    /// Returns `TestError::Invoke` when the invocation faults or a filter
    /// breaks the short-circuit contract.
    pub async fn send(&self, request: TestRequest) -> Result<TestResponse, TestError> {
        let (http, route_data) = request.into_parts();
        let report = self.pipeline.invoke(http, route_data).await?;
        Ok(TestResponse::new(report))
    }
}

/// A request builder bound to a test client.
#[must_use]
pub struct TestClientRequest<'a> {
    client: &'a TestClient,
    builder: TestRequestBuilder,
}

impl<'a> TestClientRequest<'a> {
    fn new(client: &'a TestClient, builder: TestRequestBuilder) -> Self {
        let builder = client
            .default_headers
            .iter()
            .fold(builder, |builder, (name, value)| builder.header(name, value));
        Self { client, builder }
    }

    /// Sets a header on the request.
    pub fn header(mut self, name: impl AsRef<str>, value: impl AsRef<str>) -> Self {
        self.builder = self.builder.header(name, value);
        self
    }

    /// Appends query string parameters.
    pub fn query<T: Serialize + ?Sized>(mut self, params: &T) -> Self {
        self.builder = self.builder.query(params);
        self
    }

    /// Adds a route value.
    pub fn route(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.builder = self.builder.route(key, value);
        self
    }

    /// Pins the request id.
    pub fn request_id(mut self, request_id: RequestId) -> Self {
        self.builder = self.builder.request_id(request_id);
        self
    }

    /// Sets the raw request body.
    pub fn body(mut self, body: impl Into<Bytes>) -> Self {
        self.builder = self.builder.body(body);
        self
    }

    /// Sets the request body as JSON.
    pub fn json<T: Serialize>(mut self, value: &T) -> Self {
        self.builder = self.builder.json(value);
        self
    }

    /// Builds the request and invokes the pipeline.
    ///
    /// # Errors
    ///
    /// Returns `TestError` if the request does not build or the invocation
    /// fails.
    pub async fn send(self) -> Result<TestResponse, TestError> {
        let request = self.builder.build()?;
        self.client.send(request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::StatusCode;
    use praxis_core::{
        ActionDescriptor, ActionError, ContentResult, HandlerDescriptor, HandlerMethod,
        JsonResult, PipelineState,
    };
    use serde_json::json;

    fn sample_pipeline() -> ActionPipeline {
        let action = ActionDescriptor::new("/Sample")
            .with_handler(HandlerDescriptor::new(
                Method::GET,
                HandlerMethod::value(|_| async { Ok(json!({ "ok": true })) }),
            ))
            .with_handler(HandlerDescriptor::new(
                Method::POST,
                HandlerMethod::result(|_| async { Err::<ContentResult, _>(ActionError::handler("nope")) }),
            ));
        ActionPipeline::builder(action).build()
    }

    #[tokio::test]
    async fn test_send_get() {
        let client = TestClient::new(sample_pipeline());
        let response = client.get("/sample").send().await.unwrap();

        response
            .assert_status(StatusCode::OK)
            .assert_visited(PipelineState::Completed);
        assert!(response.result_is::<JsonResult>());
        assert_eq!(response.content_type(), Some("application/json"));
        assert_eq!(response.json_value().unwrap(), json!({ "ok": true }));
    }

    #[tokio::test]
    async fn test_unhandled_fault_is_invoke_error() {
        let client = TestClient::new(sample_pipeline());
        let err = client.post("/sample").send().await.unwrap_err();

        let fault = err.invoke_error().and_then(|e| e.fault()).unwrap();
        assert_eq!(fault.error().to_string(), ActionError::handler("nope").to_string());
    }

    #[tokio::test]
    async fn test_build_error_short_circuits_send() {
        let client = TestClient::new(sample_pipeline()).with_default_header("bad header", "x");
        let err = client.get("/sample").send().await.unwrap_err();
        assert!(matches!(err, TestError::InvalidHeader(_)));
    }
}
