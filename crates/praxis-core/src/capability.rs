//! Collaborator capabilities.
//!
//! The pipeline does not select handlers, bind parameters or render results
//! itself. It calls these traits, which are injected when the pipeline is
//! built.

use crate::context::ActionContext;
use crate::error::ActionError;
use crate::handler::{Arguments, HandlerDescriptor};
use crate::result::SharedResult;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

/// A boxed future that is `Send`.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Picks the handler method an invocation dispatches to.
pub trait HandlerSelector: Send + Sync {
    /// Returns the handler to run, or `None` when the action has no match.
    fn select(&self, ctx: &ActionContext) -> Option<Arc<HandlerDescriptor>>;
}

/// Produces handler arguments from the request.
pub trait ParameterBinder: Send + Sync {
    /// Binds the parameters of `handler`.
    ///
    /// Validation problems that should not fault the request belong in the
    /// context's model state. Returning an error faults the action stage.
    fn bind<'a>(
        &'a self,
        ctx: &'a mut ActionContext,
        handler: &'a HandlerDescriptor,
    ) -> BoxFuture<'a, Result<Arguments, ActionError>>;
}

/// Renders a result.
pub trait ResultExecutor: Send + Sync {
    /// Executes `result` against the request.
    fn execute<'a>(
        &'a self,
        ctx: &'a mut ActionContext,
        result: &'a SharedResult,
    ) -> BoxFuture<'a, Result<(), ActionError>>;
}
