//! # Praxis Pipeline
//!
//! Filter chain, stage executor and invoker for Praxis actions.
//!
//! An invocation runs the request through five filter categories wrapped
//! around the selected handler method:
//!
//! ```text
//! Authorization → Resource ─┬─────────────────────────────────────────┬→ Resource (after)
//!                           └→ [guard] Action → Handler → Action (after)
//!                                 │ fault                    │
//!                                 └→ Exception filters ──────┤
//!                                                            └→ Result → Executor → Result (after)
//! ```
//!
//! | Stage         | Filters                   | Center                  |
//! |---------------|---------------------------|-------------------------|
//! | Authorization | [`AuthorizationFilter`]   | -                       |
//! | Resource      | [`SyncFilter`] / [`AsyncFilter`] | everything below |
//! | Exception     | [`ExceptionFilter`]       | - (reverse order)       |
//! | Action        | [`SyncFilter`] / [`AsyncFilter`] | handler method   |
//! | Result        | [`SyncFilter`] / [`AsyncFilter`] | result executor  |
//!
//! ## Key Features
//!
//! - **One outcome per stage**: short-circuits, faults and results all land in
//!   a single [`StageOutcome`] that after-hooks can inspect and edit
//! - **Fault unwinding**: a fault is offered to every enclosing after-hook
//!   before it leaves the stage
//! - **Usage contract**: a filter that short-circuits and then continues fails
//!   the invocation
//! - **Diagnostics**: [`DiagnosticListener`]s observe named invocation events
//!
//! ## Example
//!
//! ```
//! use http::{Method, StatusCode};
//! use praxis_core::{
//!     ActionDescriptor, ActionError, ContentResult, HandlerDescriptor, HandlerMethod,
//!     HttpContext, ParameterDescriptor, RouteData, StatusCodeResult,
//! };
//! use praxis_pipeline::{ActionExecutingContext, ActionPipeline, Filter, SyncFilter};
//!
//! struct RequireValidModel;
//!
//! impl SyncFilter<ActionExecutingContext> for RequireValidModel {
//!     fn on_executing(&self, ctx: &mut ActionExecutingContext) -> Result<(), ActionError> {
//!         if !ctx.action_context().model_state().is_valid() {
//!             ctx.set_result(StatusCodeResult(StatusCode::BAD_REQUEST));
//!         }
//!         Ok(())
//!     }
//! }
//!
//! let action = ActionDescriptor::new("/Orders").with_handler(
//!     HandlerDescriptor::new(
//!         Method::GET,
//!         HandlerMethod::result(|args| async move {
//!             let id: u32 = args.get_as("id")?;
//!             Ok(ContentResult::text(format!("order {id}")))
//!         }),
//!     )
//!     .with_parameter(ParameterDescriptor::required("id")),
//! );
//!
//! let pipeline = ActionPipeline::builder(action)
//!     .filter(Filter::action(RequireValidModel))
//!     .build();
//!
//! # tokio_test::block_on(async {
//! let report = pipeline
//!     .invoke(HttpContext::new(Method::GET, "/orders".parse().unwrap()), RouteData::new())
//!     .await
//!     .unwrap();
//! assert_eq!(report.action_context().http().response().status(), StatusCode::BAD_REQUEST);
//!
//! let report = pipeline
//!     .invoke(HttpContext::new(Method::GET, "/orders?id=7".parse().unwrap()), RouteData::new())
//!     .await
//!     .unwrap();
//! assert_eq!(report.action_context().http().response().body().as_ref(), b"order 7");
//! # });
//! ```

#![doc(html_root_url = "https://docs.rs/praxis-pipeline/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod binding;
pub mod chain;
pub mod context;
pub mod diagnostics;
pub mod filter;
pub mod invoker;
mod log;
mod selection;
pub mod stage;

pub use binding::ValueProviderBinder;
pub use chain::FilterChain;
pub use context::{
    ActionExecutingContext, AuthorizationContext, ExceptionContext, ExecutedContext,
    ResourceExecutingContext, ResultExecutingContext, StageContext, StageOutcome, StageSlot,
};
pub use diagnostics::{DiagnosticEvent, DiagnosticListener, Diagnostics, InvocationStatus};
pub use filter::{
    AsyncAuthorizationFilter, AsyncExceptionFilter, AsyncFilter, AuthorizationFilter,
    ExceptionFilter, Filter, FilterDescriptor, FnAuthorizationFilter, FnExceptionFilter,
    SyncAdapter, SyncFilter,
};
pub use invoker::{
    ActionInvoker, ActionPipeline, ActionPipelineBuilder, InvocationReport, InvokerOptions,
};
pub use selection::DefaultHandlerSelector;
pub use stage::{Next, StageExecutor, StageTerminal};
