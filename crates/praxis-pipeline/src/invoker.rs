//! The action invoker.
//!
//! [`ActionPipeline`] is built once per action and holds everything that
//! does not change between requests: the descriptor, the filter chain, the
//! collaborators and the diagnostic listeners. Each request gets an
//! [`ActionInvoker`] that owns that request's [`ActionContext`] and runs it
//! through the stages:
//!
//! ```text
//! authorization
//! resource filters
//!   └─ exception guard
//!        └─ select handler → bind → action filters → handler
//!      result filters → result executor
//! ```
//!
//! A fault that no hook handles leaves [`ActionInvoker::invoke`] as
//! [`InvokeError::Unhandled`]; it is never turned into a default result.

use crate::binding::ValueProviderBinder;
use crate::chain::FilterChain;
use crate::context::{
    ActionExecutingContext, AuthorizationContext, ExceptionContext, ResourceExecutingContext,
    ResultExecutingContext, StageContext, StageOutcome,
};
use crate::diagnostics::{DiagnosticEvent, DiagnosticListener, Diagnostics, InvocationStatus};
use crate::filter::FilterDescriptor;
use crate::log;
use crate::selection::DefaultHandlerSelector;
use crate::stage::{capture, StageExecutor, StageTerminal};
use praxis_core::{
    ActionContext, ActionDescriptor, ActionError, Arguments, BoxFuture, EmptyResult, Fault,
    FaultOrigin, FilterCategory, HandlerSelector, HttpContext, InvokeError, ParameterBinder,
    PipelineState, QueryStringValueProviderFactory, ResponseResultExecutor, ResultExecutor,
    RouteData, RouteValueProviderFactory, SharedResult, ValueProviderFactory,
};
use std::fmt;
use std::mem;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{info_span, Instrument};

/// Behaviour switches that are not collaborators.
#[derive(Debug, Clone, Default)]
pub struct InvokerOptions {
    /// Include bound argument values in the handler log entry.
    pub log_arguments: bool,
}

/// What a completed invocation produced.
#[derive(Debug)]
pub struct InvocationReport {
    result: Option<SharedResult>,
    action: ActionContext,
    elapsed: Duration,
}

impl InvocationReport {
    /// The result the pipeline ended with.
    pub fn result(&self) -> Option<&SharedResult> {
        self.result.as_ref()
    }

    /// The final action context, including the response.
    pub fn action_context(&self) -> &ActionContext {
        &self.action
    }

    /// Consumes the report, returning the final action context.
    pub fn into_action_context(self) -> ActionContext {
        self.action
    }

    /// Every state the invocation went through.
    pub fn states(&self) -> &[PipelineState] {
        self.action.state_trace()
    }

    /// Time spent in the pipeline.
    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }
}

struct PipelineInner {
    action: Arc<ActionDescriptor>,
    filters: FilterChain,
    selector: Arc<dyn HandlerSelector>,
    binder: Arc<dyn ParameterBinder>,
    executor: Arc<dyn ResultExecutor>,
    value_provider_factories: Vec<Arc<dyn ValueProviderFactory>>,
    diagnostics: Diagnostics,
    options: InvokerOptions,
}

/// An action plus everything needed to invoke it.
///
/// Cheap to clone; invocations share nothing mutable.
///
/// # Example
///
/// ```
/// use praxis_core::{ActionDescriptor, ContentResult, HandlerDescriptor, HandlerMethod, HttpContext, RouteData};
/// use praxis_pipeline::ActionPipeline;
/// use http::Method;
///
/// # tokio_test::block_on(async {
/// let pipeline = ActionPipeline::builder(
///     ActionDescriptor::new("/Hello").with_handler(HandlerDescriptor::new(
///         Method::GET,
///         HandlerMethod::result(|_| async { Ok(ContentResult::text("hello")) }),
///     )),
/// )
/// .build();
///
/// let report = pipeline
///     .invoke(HttpContext::new(Method::GET, "/hello".parse().unwrap()), RouteData::new())
///     .await
///     .unwrap();
/// assert_eq!(report.action_context().http().response().body().as_ref(), b"hello");
/// # });
/// ```
#[derive(Clone)]
pub struct ActionPipeline {
    inner: Arc<PipelineInner>,
}

impl ActionPipeline {
    /// Starts building a pipeline for `action`.
    pub fn builder(action: ActionDescriptor) -> ActionPipelineBuilder {
        ActionPipelineBuilder::new(action)
    }

    /// The action this pipeline invokes.
    pub fn action_descriptor(&self) -> &Arc<ActionDescriptor> {
        &self.inner.action
    }

    /// The filter chain.
    pub fn filters(&self) -> &FilterChain {
        &self.inner.filters
    }

    /// Prepares an invocation for one request.
    pub fn invoker(&self, http: HttpContext, route_data: RouteData) -> ActionInvoker {
        let action = ActionContext::new(Arc::clone(&self.inner.action), http, route_data)
            .with_value_provider_factories(self.inner.value_provider_factories.clone());
        ActionInvoker {
            pipeline: Arc::clone(&self.inner),
            action,
        }
    }

    /// Shorthand for `invoker(http, route_data).invoke()`.
    pub async fn invoke(
        &self,
        http: HttpContext,
        route_data: RouteData,
    ) -> Result<InvocationReport, InvokeError> {
        self.invoker(http, route_data).invoke().await
    }
}

impl fmt::Debug for ActionPipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActionPipeline")
            .field("action", &self.inner.action.display_name())
            .field("filters", &self.inner.filters)
            .field("diagnostics", &self.inner.diagnostics)
            .field("options", &self.inner.options)
            .finish_non_exhaustive()
    }
}

/// Builder for [`ActionPipeline`].
///
/// Collaborators left unset get the defaults: [`DefaultHandlerSelector`],
/// [`ValueProviderBinder`], [`ResponseResultExecutor`], and route plus
/// query-string value providers.
pub struct ActionPipelineBuilder {
    action: ActionDescriptor,
    filters: Vec<FilterDescriptor>,
    selector: Option<Arc<dyn HandlerSelector>>,
    binder: Option<Arc<dyn ParameterBinder>>,
    executor: Option<Arc<dyn ResultExecutor>>,
    value_provider_factories: Option<Vec<Arc<dyn ValueProviderFactory>>>,
    diagnostics: Diagnostics,
    options: InvokerOptions,
}

impl ActionPipelineBuilder {
    fn new(action: ActionDescriptor) -> Self {
        Self {
            action,
            filters: Vec::new(),
            selector: None,
            binder: None,
            executor: None,
            value_provider_factories: None,
            diagnostics: Diagnostics::new(),
            options: InvokerOptions::default(),
        }
    }

    /// Adds a filter.
    #[must_use]
    pub fn filter(mut self, filter: impl Into<FilterDescriptor>) -> Self {
        self.filters.push(filter.into());
        self
    }

    /// Adds several filters.
    #[must_use]
    pub fn filters<I>(mut self, filters: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<FilterDescriptor>,
    {
        self.filters.extend(filters.into_iter().map(Into::into));
        self
    }

    /// Sets the handler selector.
    #[must_use]
    pub fn handler_selector(mut self, selector: impl HandlerSelector + 'static) -> Self {
        self.selector = Some(Arc::new(selector));
        self
    }

    /// Sets the parameter binder.
    #[must_use]
    pub fn parameter_binder(mut self, binder: impl ParameterBinder + 'static) -> Self {
        self.binder = Some(Arc::new(binder));
        self
    }

    /// Sets the result executor.
    #[must_use]
    pub fn result_executor(mut self, executor: Arc<dyn ResultExecutor>) -> Self {
        self.executor = Some(executor);
        self
    }

    /// Replaces the value-provider factories every invocation starts with.
    #[must_use]
    pub fn value_provider_factories(mut self, factories: Vec<Arc<dyn ValueProviderFactory>>) -> Self {
        self.value_provider_factories = Some(factories);
        self
    }

    /// Adds a diagnostic listener.
    #[must_use]
    pub fn listener(mut self, listener: Arc<dyn DiagnosticListener>) -> Self {
        self.diagnostics.add(listener);
        self
    }

    /// Sets the invoker options.
    #[must_use]
    pub fn options(mut self, options: InvokerOptions) -> Self {
        self.options = options;
        self
    }

    /// Builds the pipeline.
    pub fn build(self) -> ActionPipeline {
        let value_provider_factories = self.value_provider_factories.unwrap_or_else(|| {
            vec![
                Arc::new(RouteValueProviderFactory),
                Arc::new(QueryStringValueProviderFactory),
            ]
        });
        ActionPipeline {
            inner: Arc::new(PipelineInner {
                action: Arc::new(self.action),
                filters: FilterChain::new(self.filters),
                selector: self
                    .selector
                    .unwrap_or_else(|| Arc::new(DefaultHandlerSelector::default())),
                binder: self.binder.unwrap_or_else(|| Arc::new(ValueProviderBinder)),
                executor: self
                    .executor
                    .unwrap_or_else(|| Arc::new(ResponseResultExecutor)),
                value_provider_factories,
                diagnostics: self.diagnostics,
                options: self.options,
            }),
        }
    }
}

/// One request's pass through an [`ActionPipeline`].
pub struct ActionInvoker {
    pipeline: Arc<PipelineInner>,
    action: ActionContext,
}

impl ActionInvoker {
    /// The context the invocation will run with.
    pub fn action_context(&self) -> &ActionContext {
        &self.action
    }

    /// Mutable access to the context before the invocation starts.
    pub fn action_context_mut(&mut self) -> &mut ActionContext {
        &mut self.action
    }

    /// Runs the invocation.
    pub async fn invoke(mut self) -> Result<InvocationReport, InvokeError> {
        let span = info_span!(
            "action",
            action = self.action.action_descriptor().display_name(),
            request_id = %self.action.http().request_id(),
        );

        async move {
            let started = Instant::now();
            let pipeline = Arc::clone(&self.pipeline);

            log::executing_action(&self.action);
            pipeline.diagnostics.emit(&DiagnosticEvent::BeforeAction {
                action: &self.action,
            });

            let outcome = pipeline.run(&mut self.action).await;

            let elapsed = started.elapsed();
            let status = match &outcome {
                Ok(_) => InvocationStatus::Completed,
                Err(error) if error.is_usage_violation() => InvocationStatus::UsageViolation,
                Err(_) => InvocationStatus::Faulted,
            };
            self.action.enter_state(match status {
                InvocationStatus::Completed => PipelineState::Completed,
                _ => PipelineState::Faulted,
            });
            pipeline.diagnostics.emit(&DiagnosticEvent::AfterAction {
                action: &self.action,
                elapsed,
                status,
            });
            log::executed_action(&self.action, elapsed, status);

            match outcome {
                Ok(result) => Ok(InvocationReport {
                    result,
                    action: self.action,
                    elapsed,
                }),
                Err(ActionError::UsageContract(violation)) => {
                    Err(InvokeError::UsageContract(violation))
                }
                Err(error) => {
                    let fault = Fault::capture(error, FaultOrigin::Unknown);
                    log::unhandled_fault(&fault);
                    Err(InvokeError::Unhandled(fault))
                }
            }
        }
        .instrument(span)
        .await
    }
}

impl fmt::Debug for ActionInvoker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActionInvoker")
            .field("action", &self.action)
            .finish_non_exhaustive()
    }
}

impl PipelineInner {
    /// Authorization, then the resource stage around everything else.
    async fn run(&self, action: &mut ActionContext) -> Result<Option<SharedResult>, ActionError> {
        if let Some(rejection) = self.authorize(action).await? {
            self.execute_result(action, &rejection).await?;
            return Ok(Some(rejection));
        }

        action.enter_state(PipelineState::ResourceExecuting);
        let terminal = ResourceTerminal { pipeline: self };
        let mut ctx = ResourceExecutingContext::new(mem::take(action));
        let outcome = StageExecutor::new(self.filters.resource(), &terminal)
            .execute(&mut ctx)
            .await;
        ctx.commit_value_provider_factories();
        *action = ctx.into_action_context();
        action.enter_state(PipelineState::ResourceExecuted);

        Ok(outcome?.into_result())
    }

    /// Runs authorization filters until one rejects the request.
    async fn authorize(
        &self,
        action: &mut ActionContext,
    ) -> Result<Option<SharedResult>, ActionError> {
        let filters = self.filters.authorization();
        if filters.is_empty() {
            return Ok(None);
        }

        action.enter_state(PipelineState::Authorizing);
        let mut ctx = AuthorizationContext::new(mem::take(action));
        let mut outcome = Ok(None);
        for filter in filters {
            if let Err(error) = filter.on_authorization(&mut ctx).await {
                let origin = || FaultOrigin::filter(FilterCategory::Authorization, filter.name());
                outcome = Err(capture(error, origin));
                break;
            }
            if let Some(rejection) = ctx.take_result() {
                log::authorization_failure(filter.name());
                outcome = Ok(Some(rejection));
                break;
            }
        }
        *action = ctx.into_action_context();
        outcome
    }

    /// Everything inside the resource filters.
    ///
    /// The returned outcome is canceled when either the action or the result
    /// stage was short-circuited.
    async fn run_inner(&self, action: &mut ActionContext) -> Result<StageOutcome, ActionError> {
        let guarded = self.run_guarded_action(action).await?;
        let action_canceled = guarded.canceled();
        let result = guarded.into_result().unwrap_or_else(EmptyResult::shared);
        let executed = self.run_result_stage(action, result).await?;
        if action_canceled {
            return Ok(StageOutcome::short_circuited(executed.into_result()));
        }
        Ok(executed)
    }

    /// The action stage inside the exception guard.
    async fn run_guarded_action(
        &self,
        action: &mut ActionContext,
    ) -> Result<StageOutcome, ActionError> {
        action.enter_state(PipelineState::ExceptionGuardEntered);
        let outcome = match self.run_action_stage(action).await {
            Ok(outcome) => Ok(outcome),
            Err(error @ ActionError::UsageContract(_)) => return Err(error),
            Err(error) => {
                let fault = Fault::capture(error, FaultOrigin::Unknown);
                self.run_exception_filters(action, fault)
                    .await
                    .map(StageOutcome::completed)
            }
        };
        action.enter_state(PipelineState::ExceptionGuardExited);
        outcome
    }

    /// Offers `fault` to the exception filters, innermost (last declared) first.
    async fn run_exception_filters(
        &self,
        action: &mut ActionContext,
        fault: Fault,
    ) -> Result<Option<SharedResult>, ActionError> {
        let filters = self.filters.exception();
        if filters.is_empty() {
            return Err(fault.rethrow());
        }

        let mut ctx = ExceptionContext::new(mem::take(action), fault);
        let mut fatal = None;
        for filter in filters.iter().rev() {
            if ctx.exception_handled() {
                break;
            }
            if let Err(error) = filter.on_exception(&mut ctx).await {
                if error.is_usage_violation() {
                    fatal = Some(error);
                    break;
                }
                let origin = FaultOrigin::filter(FilterCategory::Exception, filter.name());
                let replacement = Fault::capture(error, origin);
                log::exception_filter_replaced(filter.name(), &replacement);
                ctx.replace_exception(replacement);
            }
        }

        let (restored, unhandled, result) = ctx.into_parts();
        *action = restored;
        if let Some(error) = fatal {
            return Err(error);
        }
        match unhandled {
            Some(fault) => Err(fault.rethrow()),
            None => Ok(result),
        }
    }

    /// Handler selection, binding, then the action filters around the handler.
    async fn run_action_stage(
        &self,
        action: &mut ActionContext,
    ) -> Result<StageOutcome, ActionError> {
        action.enter_state(PipelineState::ActionExecuting);

        let handler = self.selector.select(action);
        log::handler_selected(action, handler.as_deref());
        self.diagnostics.emit(&DiagnosticEvent::HandlerSelected {
            action,
            handler: handler.as_deref(),
        });

        let arguments = match &handler {
            Some(handler) => self.binder.bind(action, handler).await.map_err(|error| {
                capture(error, || FaultOrigin::ParameterBinding {
                    handler: handler.display_name(),
                })
            })?,
            None => Arguments::new(),
        };

        let terminal = HandlerTerminal { pipeline: self };
        let mut ctx = ActionExecutingContext::new(mem::take(action), handler, arguments);
        let outcome = StageExecutor::new(self.filters.action(), &terminal)
            .execute(&mut ctx)
            .await;
        *action = ctx.into_action_context();
        action.enter_state(PipelineState::ActionExecuted);

        outcome
    }

    /// The result filters around the result executor.
    async fn run_result_stage(
        &self,
        action: &mut ActionContext,
        result: SharedResult,
    ) -> Result<StageOutcome, ActionError> {
        action.enter_state(PipelineState::ResultExecuting);
        let terminal = ResultTerminal { pipeline: self };
        let mut ctx = ResultExecutingContext::new(mem::take(action), result);
        let outcome = StageExecutor::new(self.filters.result(), &terminal)
            .execute(&mut ctx)
            .await;
        *action = ctx.into_action_context();
        action.enter_state(PipelineState::ResultExecuted);

        outcome
    }

    async fn execute_result(
        &self,
        action: &mut ActionContext,
        result: &SharedResult,
    ) -> Result<(), ActionError> {
        log::executing_result(result);
        self.executor.execute(action, result).await.map_err(|error| {
            capture(error, || FaultOrigin::ResultExecution {
                result_type: result.result_type(),
            })
        })
    }
}

/// Center of the resource stage: everything else.
struct ResourceTerminal<'p> {
    pipeline: &'p PipelineInner,
}

impl StageTerminal<ResourceExecutingContext> for ResourceTerminal<'_> {
    fn execute<'c>(
        &'c self,
        ctx: &'c mut ResourceExecutingContext,
    ) -> BoxFuture<'c, Result<Option<SharedResult>, ActionError>> {
        Box::pin(async move {
            ctx.commit_value_provider_factories();
            let inner = self.pipeline.run_inner(ctx.action_context_mut()).await?;
            if inner.canceled() {
                ctx.slot().propagate_cancel();
            }
            Ok(inner.into_result())
        })
    }

    fn fault_origin(&self, _ctx: &ResourceExecutingContext) -> FaultOrigin {
        FaultOrigin::Unknown
    }

    /// A resource filter that short-circuits has its result executed on the
    /// spot, without result filters.
    fn on_short_circuit<'c>(
        &'c self,
        ctx: &'c mut ResourceExecutingContext,
    ) -> BoxFuture<'c, Result<(), ActionError>> {
        Box::pin(async move {
            let Some(result) = ctx.result().cloned() else {
                return Ok(());
            };
            self.pipeline
                .execute_result(ctx.action_context_mut(), &result)
                .await
        })
    }
}

/// Center of the action stage: the handler method.
struct HandlerTerminal<'p> {
    pipeline: &'p PipelineInner,
}

impl StageTerminal<ActionExecutingContext> for HandlerTerminal<'_> {
    fn execute<'c>(
        &'c self,
        ctx: &'c mut ActionExecutingContext,
    ) -> BoxFuture<'c, Result<Option<SharedResult>, ActionError>> {
        Box::pin(async move {
            let Some(handler) = ctx.handler().cloned() else {
                return Ok(None);
            };
            let diagnostics = &self.pipeline.diagnostics;

            log::executing_handler(
                &handler,
                ctx.arguments(),
                ctx.action_context().model_state().is_valid(),
                self.pipeline.options.log_arguments,
            );
            diagnostics.emit(&DiagnosticEvent::BeforeHandler {
                action: ctx.action_context(),
                handler: &handler,
                arguments: ctx.arguments(),
            });

            let outcome = handler.method().invoke(ctx.arguments().clone()).await;

            let result = outcome.as_ref().ok().and_then(Option::as_ref);
            diagnostics.emit(&DiagnosticEvent::AfterHandler {
                action: ctx.action_context(),
                handler: &handler,
                arguments: ctx.arguments(),
                result,
            });
            if outcome.is_ok() {
                log::executed_handler(&handler, result);
            }
            outcome
        })
    }

    fn fault_origin(&self, ctx: &ActionExecutingContext) -> FaultOrigin {
        FaultOrigin::Handler {
            handler: ctx
                .handler()
                .map_or_else(|| "none".to_string(), |handler| handler.display_name()),
        }
    }
}

/// Center of the result stage: the result executor.
struct ResultTerminal<'p> {
    pipeline: &'p PipelineInner,
}

impl StageTerminal<ResultExecutingContext> for ResultTerminal<'_> {
    fn execute<'c>(
        &'c self,
        ctx: &'c mut ResultExecutingContext,
    ) -> BoxFuture<'c, Result<Option<SharedResult>, ActionError>> {
        Box::pin(async move {
            let result = Arc::clone(ctx.result());
            self.pipeline
                .execute_result(ctx.action_context_mut(), &result)
                .await?;
            Ok(Some(result))
        })
    }

    fn fault_origin(&self, ctx: &ResultExecutingContext) -> FaultOrigin {
        FaultOrigin::ResultExecution {
            result_type: ctx.result().result_type(),
        }
    }
}
