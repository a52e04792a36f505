//! Filter traits.
//!
//! Chained categories (resource, action, result) come in two flavours:
//!
//! - [`SyncFilter`]: a before/after hook pair.
//! - [`AsyncFilter`]: a single hook that receives the continuation.
//!
//! The engine only knows [`AsyncFilter`]; a sync filter is driven through
//! [`SyncAdapter`], which calls the before hook, stops if the filter
//! short-circuited, and otherwise runs the continuation and the after hook.
//!
//! Authorization and exception filters are not chained. They have their own
//! sync/async trait pairs and closure wrappers.
//!
//! # Example
//!
//! ```
//! use praxis_core::{ActionError, StatusCodeResult};
//! use praxis_pipeline::{ActionExecutingContext, ExecutedContext, SyncFilter};
//! use http::StatusCode;
//!
//! struct RequireId;
//!
//! impl SyncFilter<ActionExecutingContext> for RequireId {
//!     fn on_executing(&self, ctx: &mut ActionExecutingContext) -> Result<(), ActionError> {
//!         if ctx.arguments().get("id").is_none() {
//!             ctx.set_result(StatusCodeResult(StatusCode::BAD_REQUEST));
//!         }
//!         Ok(())
//!     }
//! }
//! ```

use crate::context::{
    ActionExecutingContext, AuthorizationContext, ExceptionContext, ExecutedContext,
    ResourceExecutingContext, ResultExecutingContext, StageContext,
};
use crate::stage::Next;
use praxis_core::{ActionError, BoxFuture, FilterCategory};
use std::fmt;
use std::sync::Arc;

/// A filter that wraps the rest of its stage.
pub trait AsyncFilter<C: StageContext>: Send + Sync + 'static {
    /// Name used in logs, fault origins and violation messages.
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }

    /// Runs the filter.
    ///
    /// Call `next.run(ctx)` to continue; its [`ExecutedContext`] is the
    /// after-phase view of the stage. Returning without calling it
    /// short-circuits the stage. Setting a short-circuit result on `ctx` and
    /// then calling `next.run` anyway is a usage contract violation.
    fn on_execution<'a>(
        &'a self,
        ctx: &'a mut C,
        next: Next<'a, C>,
    ) -> BoxFuture<'a, Result<(), ActionError>>;
}

/// A before/after hook pair.
pub trait SyncFilter<C: StageContext>: Send + Sync + 'static {
    /// Name used in logs, fault origins and violation messages.
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }

    /// Runs before the rest of the stage. Setting a result here short-circuits.
    fn on_executing(&self, _ctx: &mut C) -> Result<(), ActionError> {
        Ok(())
    }

    /// Runs after the rest of the stage, unless this filter short-circuited.
    fn on_executed(&self, _ctx: &mut ExecutedContext<'_>) -> Result<(), ActionError> {
        Ok(())
    }
}

/// Drives a sync filter (of any category) through the async interface.
#[derive(Debug, Clone, Copy)]
pub struct SyncAdapter<F>(pub F);

impl<C, F> AsyncFilter<C> for SyncAdapter<F>
where
    C: StageContext,
    F: SyncFilter<C>,
{
    fn name(&self) -> &str {
        <F as SyncFilter<C>>::name(&self.0)
    }

    fn on_execution<'a>(
        &'a self,
        ctx: &'a mut C,
        next: Next<'a, C>,
    ) -> BoxFuture<'a, Result<(), ActionError>> {
        Box::pin(async move {
            self.0.on_executing(ctx)?;
            if ctx.wants_short_circuit() {
                return Ok(());
            }
            let mut executed = next.run(ctx).await?;
            self.0.on_executed(&mut executed)
        })
    }
}

/// Decides whether a request may proceed.
pub trait AuthorizationFilter: Send + Sync + 'static {
    /// Name used in logs and fault origins.
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }

    /// Sets a result on `ctx` to reject the request.
    fn on_authorization(&self, ctx: &mut AuthorizationContext) -> Result<(), ActionError>;
}

/// Async counterpart of [`AuthorizationFilter`].
pub trait AsyncAuthorizationFilter: Send + Sync + 'static {
    /// Name used in logs and fault origins.
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }

    /// Sets a result on `ctx` to reject the request.
    fn on_authorization<'a>(
        &'a self,
        ctx: &'a mut AuthorizationContext,
    ) -> BoxFuture<'a, Result<(), ActionError>>;
}

impl<F: AuthorizationFilter> AsyncAuthorizationFilter for SyncAdapter<F> {
    fn name(&self) -> &str {
        self.0.name()
    }

    fn on_authorization<'a>(
        &'a self,
        ctx: &'a mut AuthorizationContext,
    ) -> BoxFuture<'a, Result<(), ActionError>> {
        Box::pin(async move { self.0.on_authorization(ctx) })
    }
}

/// Observes faults escaping the action stage.
pub trait ExceptionFilter: Send + Sync + 'static {
    /// Name used in logs and fault origins.
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }

    /// Handles the fault by calling [`ExceptionContext::handle_with`] or
    /// [`ExceptionContext::set_exception_handled`]. Returning an error
    /// replaces the fault.
    fn on_exception(&self, ctx: &mut ExceptionContext) -> Result<(), ActionError>;
}

/// Async counterpart of [`ExceptionFilter`].
pub trait AsyncExceptionFilter: Send + Sync + 'static {
    /// Name used in logs and fault origins.
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }

    /// See [`ExceptionFilter::on_exception`].
    fn on_exception<'a>(
        &'a self,
        ctx: &'a mut ExceptionContext,
    ) -> BoxFuture<'a, Result<(), ActionError>>;
}

impl<F: ExceptionFilter> AsyncExceptionFilter for SyncAdapter<F> {
    fn name(&self) -> &str {
        self.0.name()
    }

    fn on_exception<'a>(
        &'a self,
        ctx: &'a mut ExceptionContext,
    ) -> BoxFuture<'a, Result<(), ActionError>> {
        Box::pin(async move { self.0.on_exception(ctx) })
    }
}

/// An authorization filter built from a closure.
///
/// # Example
///
/// ```
/// use praxis_core::StatusCodeResult;
/// use praxis_pipeline::{Filter, FnAuthorizationFilter};
/// use http::StatusCode;
///
/// let deny_all = Filter::authorization(FnAuthorizationFilter::new("deny-all", |ctx| {
///     ctx.set_result(StatusCodeResult(StatusCode::FORBIDDEN));
///     Ok(())
/// }));
/// assert_eq!(deny_all.name(), "deny-all");
/// ```
pub struct FnAuthorizationFilter<F> {
    name: &'static str,
    func: F,
}

impl<F> FnAuthorizationFilter<F>
where
    F: Fn(&mut AuthorizationContext) -> Result<(), ActionError> + Send + Sync + 'static,
{
    /// Creates a named closure filter.
    pub fn new(name: &'static str, func: F) -> Self {
        Self { name, func }
    }
}

impl<F> AuthorizationFilter for FnAuthorizationFilter<F>
where
    F: Fn(&mut AuthorizationContext) -> Result<(), ActionError> + Send + Sync + 'static,
{
    fn name(&self) -> &str {
        self.name
    }

    fn on_authorization(&self, ctx: &mut AuthorizationContext) -> Result<(), ActionError> {
        (self.func)(ctx)
    }
}

/// An exception filter built from a closure.
pub struct FnExceptionFilter<F> {
    name: &'static str,
    func: F,
}

impl<F> FnExceptionFilter<F>
where
    F: Fn(&mut ExceptionContext) -> Result<(), ActionError> + Send + Sync + 'static,
{
    /// Creates a named closure filter.
    pub fn new(name: &'static str, func: F) -> Self {
        Self { name, func }
    }
}

impl<F> ExceptionFilter for FnExceptionFilter<F>
where
    F: Fn(&mut ExceptionContext) -> Result<(), ActionError> + Send + Sync + 'static,
{
    fn name(&self) -> &str {
        self.name
    }

    fn on_exception(&self, ctx: &mut ExceptionContext) -> Result<(), ActionError> {
        (self.func)(ctx)
    }
}

/// A filter instance tagged with its category.
#[derive(Clone)]
pub enum Filter {
    /// An authorization filter.
    Authorization(Arc<dyn AsyncAuthorizationFilter>),
    /// A resource filter.
    Resource(Arc<dyn AsyncFilter<ResourceExecutingContext>>),
    /// An action filter.
    Action(Arc<dyn AsyncFilter<ActionExecutingContext>>),
    /// An exception filter.
    Exception(Arc<dyn AsyncExceptionFilter>),
    /// A result filter.
    Result(Arc<dyn AsyncFilter<ResultExecutingContext>>),
}

impl Filter {
    /// Wraps a sync authorization filter.
    pub fn authorization(filter: impl AuthorizationFilter) -> Self {
        Self::Authorization(Arc::new(SyncAdapter(filter)))
    }

    /// Wraps an async authorization filter.
    pub fn authorization_async(filter: impl AsyncAuthorizationFilter) -> Self {
        Self::Authorization(Arc::new(filter))
    }

    /// Wraps a sync resource filter.
    pub fn resource(filter: impl SyncFilter<ResourceExecutingContext>) -> Self {
        Self::Resource(Arc::new(SyncAdapter(filter)))
    }

    /// Wraps an async resource filter.
    pub fn resource_async(filter: impl AsyncFilter<ResourceExecutingContext>) -> Self {
        Self::Resource(Arc::new(filter))
    }

    /// Wraps a sync action filter.
    pub fn action(filter: impl SyncFilter<ActionExecutingContext>) -> Self {
        Self::Action(Arc::new(SyncAdapter(filter)))
    }

    /// Wraps an async action filter.
    pub fn action_async(filter: impl AsyncFilter<ActionExecutingContext>) -> Self {
        Self::Action(Arc::new(filter))
    }

    /// Wraps a sync exception filter.
    pub fn exception(filter: impl ExceptionFilter) -> Self {
        Self::Exception(Arc::new(SyncAdapter(filter)))
    }

    /// Wraps an async exception filter.
    pub fn exception_async(filter: impl AsyncExceptionFilter) -> Self {
        Self::Exception(Arc::new(filter))
    }

    /// Wraps a sync result filter.
    pub fn result(filter: impl SyncFilter<ResultExecutingContext>) -> Self {
        Self::Result(Arc::new(SyncAdapter(filter)))
    }

    /// Wraps an async result filter.
    pub fn result_async(filter: impl AsyncFilter<ResultExecutingContext>) -> Self {
        Self::Result(Arc::new(filter))
    }

    /// The category this filter runs in.
    pub fn category(&self) -> FilterCategory {
        match self {
            Self::Authorization(_) => FilterCategory::Authorization,
            Self::Resource(_) => FilterCategory::Resource,
            Self::Action(_) => FilterCategory::Action,
            Self::Exception(_) => FilterCategory::Exception,
            Self::Result(_) => FilterCategory::Result,
        }
    }

    /// The filter's name.
    pub fn name(&self) -> &str {
        match self {
            Self::Authorization(filter) => filter.name(),
            Self::Resource(filter) => filter.name(),
            Self::Action(filter) => filter.name(),
            Self::Exception(filter) => filter.name(),
            Self::Result(filter) => filter.name(),
        }
    }
}

impl fmt::Debug for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Filter")
            .field("category", &self.category())
            .field("name", &self.name())
            .finish()
    }
}

/// A filter plus its ordering key.
///
/// Lower orders run first (outermost). Filters with equal order keep their
/// declaration order.
#[derive(Debug, Clone)]
pub struct FilterDescriptor {
    filter: Filter,
    order: i32,
}

impl FilterDescriptor {
    /// Creates a descriptor with order `0`.
    pub fn new(filter: Filter) -> Self {
        Self { filter, order: 0 }
    }

    /// Sets the order.
    #[must_use]
    pub fn with_order(mut self, order: i32) -> Self {
        self.order = order;
        self
    }

    /// The filter.
    pub fn filter(&self) -> &Filter {
        &self.filter
    }

    /// The order.
    pub fn order(&self) -> i32 {
        self.order
    }

    /// The filter's category.
    pub fn category(&self) -> FilterCategory {
        self.filter.category()
    }

    pub(crate) fn into_filter(self) -> Filter {
        self.filter
    }
}

impl From<Filter> for FilterDescriptor {
    fn from(filter: Filter) -> Self {
        Self::new(filter)
    }
}
