//! # Praxis Test
//!
//! Test utilities for the Praxis action pipeline: in-memory invocation
//! without a server, and recording fakes for every collaborator the
//! pipeline takes.
//!
//! ## Key Features
//!
//! - **In-Memory Invocation**: [`TestClient`] drives a real [`ActionPipeline`](praxis_pipeline::ActionPipeline)
//! - **Request Builder**: Fluent API for method, headers, query, route values and body
//! - **Response Assertions**: Status, body, final result type and state trace
//! - **Recording Fakes**: Filters, listener, executor, selector and binder that log what ran
//!
//! ## Example
//!
//! ```
//! use http::{Method, StatusCode};
//! use praxis_core::{ActionDescriptor, ContentResult, HandlerDescriptor, HandlerMethod};
//! use praxis_pipeline::{ActionPipeline, Filter};
//! use praxis_test::{EventLog, RecordingFilter, TestClient};
//!
//! # tokio_test::block_on(async {
//! let log = EventLog::new();
//! let action = ActionDescriptor::new("/Orders").with_handler(HandlerDescriptor::new(
//!     Method::GET,
//!     HandlerMethod::result(|_| async { Ok(ContentResult::text("orders")) }),
//! ));
//! let pipeline = ActionPipeline::builder(action)
//!     .filter(Filter::action(RecordingFilter::new("audit", &log)))
//!     .build();
//!
//! let response = TestClient::new(pipeline).get("/orders").send().await.unwrap();
//!
//! response.assert_status(StatusCode::OK).assert_text("orders");
//! assert_eq!(
//!     log.entries(),
//!     ["audit.executing", "audit.executed canceled=false faulted=false"]
//! );
//! # });
//! ```

#![doc(html_root_url = "https://docs.rs/praxis-test/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod client;
mod error;
mod fakes;
mod request;
mod response;

pub use client::{TestClient, TestClientRequest};
pub use error::TestError;
pub use fakes::{
    ContinueAfterShortCircuit, EventLog, FakeParameterBinder, Hook, RecordingAsyncFilter,
    RecordingFilter, RecordingListener, RecordingResultExecutor, StaticHandlerSelector,
};
pub use request::{TestRequest, TestRequestBuilder};
pub use response::TestResponse;
