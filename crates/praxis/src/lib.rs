//! # Praxis
//!
//! Invokes page actions through an ordered, category-aware filter pipeline:
//! authorization, resource, action (around the handler), exception and
//! result filters, each stage reporting one outcome to the filters around
//! it.
//!
//! This crate re-exports the workspace:
//!
//! - [`core`] - Data model and collaborator traits
//! - [`pipeline`] - Filter chain, stage engine and invoker
//! - [`telemetry`] - Logging, metrics and diagnostic listeners
//! - [`config`] - Layered configuration
//!
//! ## Example
//!
//! ```
//! use praxis::prelude::*;
//! use http::{Method, StatusCode};
//!
//! # tokio_test::block_on(async {
//! let config = ConfigLoader::new()
//!     .with_string("[selection]\nhandler_key = \"op\"", "toml")
//!     .unwrap()
//!     .load()
//!     .unwrap();
//!
//! let action = ActionDescriptor::new("/Orders")
//!     .with_handler(HandlerDescriptor::new(
//!         Method::POST,
//!         HandlerMethod::result(|_| async { Ok(StatusCodeResult(StatusCode::ACCEPTED)) }),
//!     ).named("cancel"));
//! let pipeline = config.configure_pipeline(ActionPipeline::builder(action)).build();
//!
//! let uri = "/orders?op=cancel".parse().unwrap();
//! let report = pipeline
//!     .invoke(HttpContext::new(Method::POST, uri), RouteData::new())
//!     .await
//!     .unwrap();
//!
//! assert_eq!(report.action_context().http().response().status(), StatusCode::ACCEPTED);
//! # });
//! ```

#![doc(html_root_url = "https://docs.rs/praxis/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

// Re-export core types
pub use praxis_core as core;

// Re-export the pipeline
pub use praxis_pipeline as pipeline;

// Re-export telemetry
pub use praxis_telemetry as telemetry;

// Re-export configuration
pub use praxis_config as config;

/// Prelude module for convenient imports.
///
/// # Example
///
/// ```rust
/// use praxis::prelude::*;
/// ```
pub mod prelude {
    pub use praxis_core::{
        ActionContext, ActionDescriptor, ActionError, ActionResult, Arguments, ContentResult,
        EmptyResult, Fault, FaultOrigin, HandlerDescriptor, HandlerMethod, HttpContext,
        InvokeError, JsonResult, ParameterDescriptor, PipelineState, RouteData, SharedResult,
        StatusCodeResult,
    };

    // Filters and their contexts
    pub use praxis_pipeline::{
        ActionExecutingContext, AsyncFilter, AuthorizationContext, AuthorizationFilter,
        ExceptionContext, ExceptionFilter, ExecutedContext, Filter, FilterDescriptor,
        FnAuthorizationFilter, FnExceptionFilter, Next, ResourceExecutingContext,
        ResultExecutingContext, SyncFilter,
    };

    // Building and invoking
    pub use praxis_pipeline::{
        ActionPipeline, ActionPipelineBuilder, DiagnosticEvent, DiagnosticListener,
        InvocationReport, InvocationStatus, InvokerOptions,
    };

    // Configuration and telemetry
    pub use praxis_config::{ConfigError, ConfigLoader, PraxisConfig};
    pub use praxis_telemetry::{init_telemetry, MetricsListener, TelemetryConfig, TracingListener};
}
