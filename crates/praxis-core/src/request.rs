//! Request-scoped HTTP state.
//!
//! [`HttpContext`] is the transport collaborator's view of one request as the
//! pipeline sees it: the request line, headers and body, a response under
//! construction, and a typed extension bag that filters use to hand data to
//! each other.

use bytes::Bytes;
use http::{HeaderMap, Method, StatusCode, Uri};
use serde::{Deserialize, Serialize};
use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::time::Instant;
use uuid::Uuid;

/// A unique identifier for each request, using UUID v7.
///
/// UUID v7 is time-ordered, which keeps log lines and fault ids of one
/// request sortable.
///
/// # Example
///
/// ```
/// use praxis_core::RequestId;
///
/// let id = RequestId::new();
/// assert_eq!(id.to_string().len(), 36);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestId(Uuid);

impl RequestId {
    /// Creates a new unique request ID.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    /// Creates a `RequestId` from an existing UUID, e.g. one parsed from a header.
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the underlying UUID.
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Uuid> for RequestId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

/// The response a result writes into.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    status: StatusCode,
    headers: HeaderMap,
    body: Bytes,
}

impl HttpResponse {
    /// Returns the status code.
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Sets the status code.
    pub fn set_status(&mut self, status: StatusCode) {
        self.status = status;
    }

    /// Returns the response headers.
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Returns mutable access to the response headers.
    pub fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }

    /// Returns the response body.
    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// Replaces the response body.
    pub fn set_body(&mut self, body: impl Into<Bytes>) {
        self.body = body.into();
    }
}

impl Default for HttpResponse {
    fn default() -> Self {
        Self {
            status: StatusCode::OK,
            headers: HeaderMap::new(),
            body: Bytes::new(),
        }
    }
}

/// Per-request HTTP state handed to the pipeline by the transport.
///
/// # Example
///
/// ```
/// use praxis_core::HttpContext;
/// use http::Method;
///
/// let mut http = HttpContext::new(Method::POST, "/orders?handler=cancel".parse().unwrap());
/// http.set_extension(42_u32);
///
/// assert_eq!(http.query(), Some("handler=cancel"));
/// assert_eq!(http.get_extension::<u32>(), Some(&42));
/// ```
pub struct HttpContext {
    request_id: RequestId,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
    response: HttpResponse,
    started_at: Instant,
    /// Typed request-scoped data shared between filters.
    extensions: HashMap<TypeId, Box<dyn Any + Send + Sync>>,
}

impl HttpContext {
    /// Creates a context for a request with an empty body and no headers.
    #[must_use]
    pub fn new(method: Method, uri: Uri) -> Self {
        Self {
            request_id: RequestId::new(),
            method,
            uri,
            headers: HeaderMap::new(),
            body: Bytes::new(),
            response: HttpResponse::default(),
            started_at: Instant::now(),
            extensions: HashMap::new(),
        }
    }

    /// Sets the request headers.
    #[must_use]
    pub fn with_headers(mut self, headers: HeaderMap) -> Self {
        self.headers = headers;
        self
    }

    /// Sets the request body.
    #[must_use]
    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    /// Overrides the generated request id.
    #[must_use]
    pub fn with_request_id(mut self, request_id: RequestId) -> Self {
        self.request_id = request_id;
        self
    }

    /// Returns the request ID.
    pub fn request_id(&self) -> RequestId {
        self.request_id
    }

    /// Returns the request method.
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Returns the request URI.
    pub fn uri(&self) -> &Uri {
        &self.uri
    }

    /// Returns the raw query string, if any.
    pub fn query(&self) -> Option<&str> {
        self.uri.query()
    }

    /// Returns the request headers.
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Returns the request body.
    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// Returns the response under construction.
    pub fn response(&self) -> &HttpResponse {
        &self.response
    }

    /// Returns mutable access to the response under construction.
    pub fn response_mut(&mut self) -> &mut HttpResponse {
        &mut self.response
    }

    /// Returns when the request arrived at the pipeline.
    pub fn started_at(&self) -> Instant {
        self.started_at
    }

    /// Stores a typed extension, replacing any previous value of that type.
    pub fn set_extension<T: Send + Sync + 'static>(&mut self, value: T) {
        self.extensions.insert(TypeId::of::<T>(), Box::new(value));
    }

    /// Returns a typed extension.
    pub fn get_extension<T: Send + Sync + 'static>(&self) -> Option<&T> {
        self.extensions
            .get(&TypeId::of::<T>())
            .and_then(|boxed| boxed.downcast_ref())
    }

    /// Returns mutable access to a typed extension.
    pub fn get_extension_mut<T: Send + Sync + 'static>(&mut self) -> Option<&mut T> {
        self.extensions
            .get_mut(&TypeId::of::<T>())
            .and_then(|boxed| boxed.downcast_mut())
    }

    /// Removes and returns a typed extension.
    pub fn remove_extension<T: Send + Sync + 'static>(&mut self) -> Option<T> {
        self.extensions
            .remove(&TypeId::of::<T>())
            .and_then(|boxed| boxed.downcast().ok())
            .map(|boxed| *boxed)
    }
}

impl Default for HttpContext {
    fn default() -> Self {
        Self::new(Method::GET, Uri::from_static("/"))
    }
}

impl std::fmt::Debug for HttpContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpContext")
            .field("request_id", &self.request_id)
            .field("method", &self.method)
            .field("uri", &self.uri)
            .field("response", &self.response)
            .field("extensions", &self.extensions.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_ids_are_unique() {
        assert_ne!(RequestId::new(), RequestId::new());
    }

    #[test]
    fn test_query_is_exposed() {
        let http = HttpContext::new(Method::GET, Uri::from_static("/p?a=1&b=2"));
        assert_eq!(http.query(), Some("a=1&b=2"));
        assert_eq!(HttpContext::default().query(), None);
    }

    #[test]
    fn test_extensions() {
        #[derive(Debug, PartialEq)]
        struct Tenant(&'static str);

        let mut http = HttpContext::default();
        assert!(http.get_extension::<Tenant>().is_none());

        http.set_extension(Tenant("acme"));
        assert_eq!(http.get_extension::<Tenant>(), Some(&Tenant("acme")));

        if let Some(tenant) = http.get_extension_mut::<Tenant>() {
            tenant.0 = "globex";
        }
        assert_eq!(http.remove_extension::<Tenant>(), Some(Tenant("globex")));
        assert!(http.get_extension::<Tenant>().is_none());
    }

    #[test]
    fn test_response_defaults_to_ok() {
        let mut http = HttpContext::default();
        assert_eq!(http.response().status(), StatusCode::OK);

        http.response_mut().set_status(StatusCode::NOT_FOUND);
        http.response_mut().set_body("missing");
        assert_eq!(http.response().status(), StatusCode::NOT_FOUND);
        assert_eq!(http.response().body().as_ref(), b"missing");
    }
}
