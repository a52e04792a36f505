//! Test request building.

use crate::error::TestError;
use bytes::Bytes;
use http::{header, HeaderMap, HeaderName, HeaderValue, Method, Uri};
use praxis_core::{HttpContext, RequestId, RouteData};
use serde::Serialize;

/// A request ready to be handed to a pipeline.
#[derive(Debug)]
pub struct TestRequest {
    /// HTTP method
    pub method: Method,
    /// Request URI
    pub uri: Uri,
    /// Request headers
    pub headers: HeaderMap,
    /// Request body
    pub body: Bytes,
    /// Values the router would have matched
    pub route_data: RouteData,
    /// Fixed request id, if one was set
    pub request_id: Option<RequestId>,
}

impl TestRequest {
    /// Creates a new GET request.
    pub fn get(uri: impl AsRef<str>) -> TestRequestBuilder {
        TestRequestBuilder::new(Method::GET, uri)
    }

    /// Creates a new POST request.
    pub fn post(uri: impl AsRef<str>) -> TestRequestBuilder {
        TestRequestBuilder::new(Method::POST, uri)
    }

    /// Creates a new PUT request.
    pub fn put(uri: impl AsRef<str>) -> TestRequestBuilder {
        TestRequestBuilder::new(Method::PUT, uri)
    }

    /// Creates a new PATCH request.
    pub fn patch(uri: impl AsRef<str>) -> TestRequestBuilder {
        TestRequestBuilder::new(Method::PATCH, uri)
    }

    /// Creates a new DELETE request.
    pub fn delete(uri: impl AsRef<str>) -> TestRequestBuilder {
        TestRequestBuilder::new(Method::DELETE, uri)
    }

    /// Creates a new HEAD request.
    pub fn head(uri: impl AsRef<str>) -> TestRequestBuilder {
        TestRequestBuilder::new(Method::HEAD, uri)
    }

    /// Splits the request into what `ActionPipeline::invoke` takes.
    pub fn into_parts(self) -> (HttpContext, RouteData) {
        let mut http = HttpContext::new(self.method, self.uri)
            .with_headers(self.headers)
            .with_body(self.body);
        if let Some(request_id) = self.request_id {
            http = http.with_request_id(request_id);
        }
        (http, self.route_data)
    }
}

/// Builder for constructing test requests.
///
/// Invalid input is remembered and reported by [`build`](Self::build), so
/// calls can be chained without intermediate `?`.
#[must_use]
#[derive(Debug)]
pub struct TestRequestBuilder {
    method: Method,
    uri: String,
    headers: HeaderMap,
    body: Option<Bytes>,
    route_data: RouteData,
    request_id: Option<RequestId>,
    error: Option<TestError>,
}

impl TestRequestBuilder {
    /// Creates a new request builder.
    pub fn new(method: Method, uri: impl AsRef<str>) -> Self {
        Self {
            method,
            uri: uri.as_ref().to_string(),
            headers: HeaderMap::new(),
            body: None,
            route_data: RouteData::new(),
            request_id: None,
            error: None,
        }
    }

    /// Sets a header on the request.
    pub fn header(mut self, name: impl AsRef<str>, value: impl AsRef<str>) -> Self {
        let name = match HeaderName::try_from(name.as_ref()) {
            Ok(name) => name,
            Err(e) => return self.fail(TestError::InvalidHeader(e.to_string())),
        };
        let value = match HeaderValue::try_from(value.as_ref()) {
            Ok(value) => value,
            Err(e) => return self.fail(TestError::InvalidHeader(e.to_string())),
        };
        self.headers.insert(name, value);
        self
    }

    /// Sets a typed header on the request.
    pub fn header_typed(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    /// Sets the Content-Type header.
    pub fn content_type(self, content_type: impl AsRef<str>) -> Self {
        self.header(header::CONTENT_TYPE.as_str(), content_type)
    }

    /// Appends query string parameters to the URI.
    ///
    /// # Example
    ///
    /// ```
    /// use praxis_test::TestRequest;
    ///
    /// let request = TestRequest::get("/orders")
    ///     .query(&[("handler", "cancel"), ("id", "7")])
    ///     .build()
    ///     .unwrap();
    ///
    /// assert_eq!(request.uri.query(), Some("handler=cancel&id=7"));
    /// ```
    pub fn query<T: Serialize + ?Sized>(mut self, params: &T) -> Self {
        let encoded = match serde_urlencoded::to_string(params) {
            Ok(encoded) => encoded,
            Err(e) => return self.fail(TestError::RequestBuild(e.to_string())),
        };
        if !encoded.is_empty() {
            let separator = if self.uri.contains('?') { '&' } else { '?' };
            self.uri.push(separator);
            self.uri.push_str(&encoded);
        }
        self
    }

    /// Adds a route value, as if the router had matched it.
    pub fn route(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.route_data.insert(key, value);
        self
    }

    /// Pins the request id instead of generating one.
    pub fn request_id(mut self, request_id: RequestId) -> Self {
        self.request_id = Some(request_id);
        self
    }

    /// Sets the raw request body.
    pub fn body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Sets the request body as JSON and the matching Content-Type.
    pub fn json<T: Serialize>(mut self, value: &T) -> Self {
        match serde_json::to_vec(value) {
            Ok(body) => {
                self.body = Some(Bytes::from(body));
                self.content_type("application/json")
            }
            Err(e) => self.fail(TestError::Json(e)),
        }
    }

    fn fail(mut self, error: TestError) -> Self {
        self.error.get_or_insert(error);
        self
    }

    /// Builds the request.
    ///
    /// # Errors
    ///
    /// Returns the first error recorded while building, or
    /// `TestError::RequestBuild` if the URI does not parse.
    pub fn build(self) -> Result<TestRequest, TestError> {
        if let Some(error) = self.error {
            return Err(error);
        }

        let uri: Uri = self
            .uri
            .parse()
            .map_err(|e: http::uri::InvalidUri| TestError::RequestBuild(e.to_string()))?;

        Ok(TestRequest {
            method: self.method,
            uri,
            headers: self.headers,
            body: self.body.unwrap_or_default(),
            route_data: self.route_data,
            request_id: self.request_id,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_build_request() {
        let request = TestRequest::post("/orders")
            .header("X-Tenant", "acme")
            .route("page", "/Orders")
            .build()
            .unwrap();

        assert_eq!(request.method, Method::POST);
        assert_eq!(request.uri.path(), "/orders");
        assert_eq!(request.headers["x-tenant"], "acme");
        assert_eq!(request.route_data.get("page"), Some("/Orders"));
        assert!(request.body.is_empty());
    }

    #[test]
    fn test_json_sets_content_type() {
        let request = TestRequest::post("/orders")
            .json(&json!({ "id": 7 }))
            .build()
            .unwrap();

        assert_eq!(request.headers[header::CONTENT_TYPE], "application/json");
        assert_eq!(request.body.as_ref(), br#"{"id":7}"#);
    }

    #[test]
    fn test_query_appends_to_existing() {
        let request = TestRequest::get("/orders?page=2")
            .query(&[("id", "7 8")])
            .build()
            .unwrap();
        assert_eq!(request.uri.query(), Some("page=2&id=7+8"));
    }

    #[test]
    fn test_invalid_header_reported_at_build() {
        let result = TestRequest::get("/")
            .header("bad header", "x")
            .header("X-Ok", "fine")
            .build();
        assert!(matches!(result, Err(TestError::InvalidHeader(_))));
    }

    #[test]
    fn test_invalid_uri() {
        let result = TestRequest::get("/orders list").build();
        assert!(matches!(result, Err(TestError::RequestBuild(_))));
    }

    #[test]
    fn test_into_parts_keeps_request_id() {
        let id = RequestId::new();
        let (http, route) = TestRequest::get("/?handler=x")
            .request_id(id)
            .route("id", "3")
            .build()
            .unwrap()
            .into_parts();

        assert_eq!(http.request_id(), id);
        assert_eq!(http.query(), Some("handler=x"));
        assert_eq!(route.get("id"), Some("3"));
    }
}
