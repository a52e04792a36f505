//! Test response wrapper.

use crate::error::TestError;
use bytes::Bytes;
use http::{header, HeaderMap, HeaderValue, StatusCode};
use praxis_core::{ActionContext, ActionResult, ModelState, PipelineState, SharedResult};
use praxis_pipeline::InvocationReport;
use serde::de::DeserializeOwned;
use std::time::Duration;

/// What an in-memory invocation produced, with helpers for assertions.
///
/// Besides the written response it keeps the pipeline's own view: the result
/// it ended with and every state it went through.
#[derive(Debug)]
pub struct TestResponse {
    report: InvocationReport,
}

impl TestResponse {
    /// Wraps an invocation report.
    pub fn new(report: InvocationReport) -> Self {
        Self { report }
    }

    /// The final action context.
    pub fn action_context(&self) -> &ActionContext {
        self.report.action_context()
    }

    /// Returns the status code.
    pub fn status(&self) -> StatusCode {
        self.action_context().http().response().status()
    }

    /// Returns the status code as a u16.
    pub fn status_code(&self) -> u16 {
        self.status().as_u16()
    }

    /// Returns true if the status is successful (2xx).
    pub fn is_success(&self) -> bool {
        self.status().is_success()
    }

    /// Returns true if the status is a client error (4xx).
    pub fn is_client_error(&self) -> bool {
        self.status().is_client_error()
    }

    /// Returns a reference to the response headers.
    pub fn headers(&self) -> &HeaderMap {
        self.action_context().http().response().headers()
    }

    /// Gets a header value by name.
    pub fn header(&self, name: impl AsRef<str>) -> Option<&HeaderValue> {
        self.headers().get(name.as_ref())
    }

    /// Gets a header value as a string.
    pub fn header_str(&self, name: impl AsRef<str>) -> Option<&str> {
        self.header(name).and_then(|v| v.to_str().ok())
    }

    /// Returns the Content-Type header value.
    pub fn content_type(&self) -> Option<&str> {
        self.header_str(header::CONTENT_TYPE.as_str())
    }

    /// Returns the raw body bytes.
    pub fn body(&self) -> &Bytes {
        self.action_context().http().response().body()
    }

    /// Returns the body as a string.
    ///
    /// Returns an error if the body is not valid UTF-8.
    pub fn text(&self) -> Result<String, TestError> {
        String::from_utf8(self.body().to_vec())
            .map_err(|e| TestError::BodyRead(format!("invalid UTF-8: {e}")))
    }

    /// Deserializes the body as JSON.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, TestError> {
        Ok(serde_json::from_slice(self.body())?)
    }

    /// Deserializes the body as an untyped JSON value.
    pub fn json_value(&self) -> Result<serde_json::Value, TestError> {
        self.json()
    }

    /// The result the pipeline ended with.
    pub fn result(&self) -> Option<&SharedResult> {
        self.report.result()
    }

    /// Returns the final result if it is a `T`.
    pub fn result_as<T: ActionResult>(&self) -> Option<&T> {
        self.result().and_then(|result| result.downcast_ref::<T>())
    }

    /// Returns true if the final result is a `T`.
    pub fn result_is<T: ActionResult>(&self) -> bool {
        self.result_as::<T>().is_some()
    }

    /// Every state the invocation went through.
    pub fn states(&self) -> &[PipelineState] {
        self.report.states()
    }

    /// Model state left by binding and filters.
    pub fn model_state(&self) -> &ModelState {
        self.action_context().model_state()
    }

    /// Time spent in the pipeline.
    pub fn elapsed(&self) -> Duration {
        self.report.elapsed()
    }

    /// Consumes the wrapper, returning the report.
    pub fn into_report(self) -> InvocationReport {
        self.report
    }

    /// Asserts the status code.
    ///
    /// # Panics
    ///
    /// Panics if the status does not match.
    #[track_caller]
    pub fn assert_status(&self, expected: StatusCode) -> &Self {
        assert_eq!(
            self.status(),
            expected,
            "expected status {expected}, got {}",
            self.status()
        );
        self
    }

    /// Asserts the body equals `expected`.
    ///
    /// # Panics
    ///
    /// Panics if the body differs or is not UTF-8.
    #[track_caller]
    pub fn assert_text(&self, expected: &str) -> &Self {
        match self.text() {
            Ok(text) => assert_eq!(text, expected, "unexpected response body"),
            Err(e) => panic!("response body is not text: {e}"),
        }
        self
    }

    /// Asserts the pipeline passed through `state`.
    ///
    /// # Panics
    ///
    /// Panics if `state` is not in the trace.
    #[track_caller]
    pub fn assert_visited(&self, state: PipelineState) -> &Self {
        assert!(
            self.states().contains(&state),
            "state {state} not in trace {:?}",
            self.states()
        );
        self
    }
}
