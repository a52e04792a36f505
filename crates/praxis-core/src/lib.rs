//! # Praxis Core
//!
//! Data model and collaborator capabilities for the Praxis action pipeline.
//!
//! - [`ActionContext`] - Per-invocation state shared by every stage
//! - [`HttpContext`] / [`RequestId`] - The request as the pipeline sees it
//! - [`ActionDescriptor`] / [`HandlerDescriptor`] - What can be invoked
//! - [`ActionResult`] - What a handler produces
//! - [`ActionError`] / [`Fault`] - Errors and captured faults
//! - [`HandlerSelector`], [`ParameterBinder`], [`ResultExecutor`] - Injected collaborators

#![doc(html_root_url = "https://docs.rs/praxis-core/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod action;
mod capability;
mod category;
mod context;
mod error;
mod fault;
mod handler;
mod request;
mod result;
pub mod value_provider;

pub use action::ActionDescriptor;
pub use capability::{BoxFuture, HandlerSelector, ParameterBinder, ResultExecutor};
pub use category::FilterCategory;
pub use context::{ActionContext, ModelState, PipelineState, RouteData};
pub use error::{ActionError, InvokeError, PipelineResult, UsageViolation};
pub use fault::{DispatchInfo, Fault, FaultKind, FaultOrigin};
pub use handler::{Arguments, HandlerDescriptor, HandlerKind, HandlerMethod, ParameterDescriptor};
pub use request::{HttpContext, HttpResponse, RequestId};
pub use result::{
    ActionResult, AsAny, ContentResult, EmptyResult, JsonResult, ResponseResultExecutor,
    SharedResult, StatusCodeResult,
};
pub use value_provider::{
    QueryStringValueProviderFactory, RouteValueProviderFactory, ValueProvider,
    ValueProviderFactory,
};
