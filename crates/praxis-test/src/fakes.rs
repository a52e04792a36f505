//! Recording fakes for the pipeline's collaborators and filters.
//!
//! Everything here writes into an [`EventLog`] or keeps its own counters so a
//! test can assert on what ran, in what order.

use http::StatusCode;
use parking_lot::Mutex;
use praxis_core::{
    ActionContext, ActionError, Arguments, BoxFuture, HandlerDescriptor, HandlerSelector,
    ParameterBinder, ResponseResultExecutor, ResultExecutor, SharedResult, StatusCodeResult,
};
use praxis_pipeline::{
    ActionExecutingContext, AsyncFilter, AuthorizationContext, AuthorizationFilter,
    DiagnosticEvent, DiagnosticListener, ExceptionContext, ExceptionFilter, ExecutedContext,
    InvocationStatus, Next, ResourceExecutingContext, ResultExecutingContext, StageContext,
    SyncFilter,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// A shared, ordered list of entries.
#[derive(Debug, Clone, Default)]
pub struct EventLog(Arc<Mutex<Vec<String>>>);

impl EventLog {
    /// Creates an empty log.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an entry.
    pub fn push(&self, entry: impl Into<String>) {
        self.0.lock().push(entry.into());
    }

    /// A copy of the entries so far.
    pub fn entries(&self) -> Vec<String> {
        self.0.lock().clone()
    }

    /// Whether an entry equal to `entry` was logged.
    pub fn contains(&self, entry: &str) -> bool {
        self.0.lock().iter().any(|e| e == entry)
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.0.lock().len()
    }

    /// Returns true if nothing was logged.
    pub fn is_empty(&self) -> bool {
        self.0.lock().is_empty()
    }

    /// Removes every entry.
    pub fn clear(&self) {
        self.0.lock().clear();
    }
}

/// A sync filter usable in every category that logs its hooks.
///
/// Chained stages log `"{name}.executing"` and
/// `"{name}.executed canceled={} faulted={}"`. Authorization filters log
/// `"{name}.authorization"`, exception filters `"{name}.exception"`.
///
/// With [`short_circuit`](Self::short_circuit) set, resource and action
/// filters end their stage with a [`StatusCodeResult`], result filters
/// cancel execution, authorization filters reject and exception filters
/// handle the fault. [`fail_on`](Self::fail_on) makes a hook raise
/// `ActionError::Filter` after logging.
#[derive(Debug, Clone)]
pub struct RecordingFilter {
    name: String,
    log: EventLog,
    short_circuit: Option<StatusCode>,
    fail_on: Option<Hook>,
}

/// Which hook of a [`RecordingFilter`] raises.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Hook {
    /// The executing hook, or the only hook of authorization and exception
    /// filters.
    Before,
    /// The executed hook.
    After,
}

impl RecordingFilter {
    /// Creates a filter that only records.
    pub fn new(name: impl Into<String>, log: &EventLog) -> Self {
        Self {
            name: name.into(),
            log: log.clone(),
            short_circuit: None,
            fail_on: None,
        }
    }

    /// Makes the filter stop its stage with `status`.
    #[must_use]
    pub fn short_circuit(mut self, status: StatusCode) -> Self {
        self.short_circuit = Some(status);
        self
    }

    /// Makes `hook` fail with `"{name} failed"`.
    #[must_use]
    pub fn fail_on(mut self, hook: Hook) -> Self {
        self.fail_on = Some(hook);
        self
    }

    fn check(&self, hook: Hook) -> Result<(), ActionError> {
        if self.fail_on == Some(hook) {
            return Err(ActionError::filter(format!("{} failed", self.name)));
        }
        Ok(())
    }

    fn executing(&self) -> Result<(), ActionError> {
        self.log.push(format!("{}.executing", self.name));
        self.check(Hook::Before)
    }

    fn executed(&self, ctx: &ExecutedContext<'_>) -> Result<(), ActionError> {
        self.log.push(format!(
            "{}.executed canceled={} faulted={}",
            self.name,
            ctx.canceled(),
            ctx.is_faulted()
        ));
        self.check(Hook::After)
    }
}

impl SyncFilter<ResourceExecutingContext> for RecordingFilter {
    fn name(&self) -> &str {
        &self.name
    }

    fn on_executing(&self, ctx: &mut ResourceExecutingContext) -> Result<(), ActionError> {
        self.executing()?;
        if let Some(status) = self.short_circuit {
            ctx.set_result(StatusCodeResult(status));
        }
        Ok(())
    }

    fn on_executed(&self, ctx: &mut ExecutedContext<'_>) -> Result<(), ActionError> {
        self.executed(ctx)
    }
}

impl SyncFilter<ActionExecutingContext> for RecordingFilter {
    fn name(&self) -> &str {
        &self.name
    }

    fn on_executing(&self, ctx: &mut ActionExecutingContext) -> Result<(), ActionError> {
        self.executing()?;
        if let Some(status) = self.short_circuit {
            ctx.set_result(StatusCodeResult(status));
        }
        Ok(())
    }

    fn on_executed(&self, ctx: &mut ExecutedContext<'_>) -> Result<(), ActionError> {
        self.executed(ctx)
    }
}

impl SyncFilter<ResultExecutingContext> for RecordingFilter {
    fn name(&self) -> &str {
        &self.name
    }

    fn on_executing(&self, ctx: &mut ResultExecutingContext) -> Result<(), ActionError> {
        self.executing()?;
        if self.short_circuit.is_some() {
            ctx.set_cancel(true);
        }
        Ok(())
    }

    fn on_executed(&self, ctx: &mut ExecutedContext<'_>) -> Result<(), ActionError> {
        self.executed(ctx)
    }
}

impl AuthorizationFilter for RecordingFilter {
    fn name(&self) -> &str {
        &self.name
    }

    fn on_authorization(&self, ctx: &mut AuthorizationContext) -> Result<(), ActionError> {
        self.log.push(format!("{}.authorization", self.name));
        self.check(Hook::Before)?;
        if let Some(status) = self.short_circuit {
            ctx.set_result(StatusCodeResult(status));
        }
        Ok(())
    }
}

impl ExceptionFilter for RecordingFilter {
    fn name(&self) -> &str {
        &self.name
    }

    fn on_exception(&self, ctx: &mut ExceptionContext) -> Result<(), ActionError> {
        self.log.push(format!("{}.exception", self.name));
        self.check(Hook::Before)?;
        if let Some(status) = self.short_circuit {
            ctx.handle_with(StatusCodeResult(status));
        }
        Ok(())
    }
}

/// An async action filter that logs around its continuation, yielding to
/// the runtime on both sides of it.
#[derive(Debug, Clone)]
pub struct RecordingAsyncFilter {
    name: String,
    log: EventLog,
}

impl RecordingAsyncFilter {
    /// Creates a filter logging `"{name}.before"` and `"{name}.after"`.
    pub fn new(name: impl Into<String>, log: &EventLog) -> Self {
        Self {
            name: name.into(),
            log: log.clone(),
        }
    }

    async fn around<C: StageContext>(
        &self,
        ctx: &mut C,
        next: Next<'_, C>,
    ) -> Result<(), ActionError> {
        self.log.push(format!("{}.before", self.name));
        tokio::task::yield_now().await;
        let executed = next.run(ctx).await?;
        let faulted = executed.is_faulted();
        tokio::task::yield_now().await;
        self.log.push(format!("{}.after faulted={faulted}", self.name));
        Ok(())
    }
}

impl AsyncFilter<ResourceExecutingContext> for RecordingAsyncFilter {
    fn name(&self) -> &str {
        &self.name
    }

    fn on_execution<'a>(
        &'a self,
        ctx: &'a mut ResourceExecutingContext,
        next: Next<'a, ResourceExecutingContext>,
    ) -> BoxFuture<'a, Result<(), ActionError>> {
        Box::pin(self.around(ctx, next))
    }
}

impl AsyncFilter<ActionExecutingContext> for RecordingAsyncFilter {
    fn name(&self) -> &str {
        &self.name
    }

    fn on_execution<'a>(
        &'a self,
        ctx: &'a mut ActionExecutingContext,
        next: Next<'a, ActionExecutingContext>,
    ) -> BoxFuture<'a, Result<(), ActionError>> {
        Box::pin(self.around(ctx, next))
    }
}

impl AsyncFilter<ResultExecutingContext> for RecordingAsyncFilter {
    fn name(&self) -> &str {
        &self.name
    }

    fn on_execution<'a>(
        &'a self,
        ctx: &'a mut ResultExecutingContext,
        next: Next<'a, ResultExecutingContext>,
    ) -> BoxFuture<'a, Result<(), ActionError>> {
        Box::pin(self.around(ctx, next))
    }
}

/// An async filter that sets a short-circuit result and then continues
/// anyway, which the pipeline must reject.
///
/// With `swallow` the filter also discards the error `next` returns, to check
/// that the violation is still reported.
#[derive(Debug, Clone)]
pub struct ContinueAfterShortCircuit {
    log: EventLog,
    swallow: bool,
}

impl ContinueAfterShortCircuit {
    /// Creates a filter that propagates the violation.
    pub fn new(log: &EventLog) -> Self {
        Self {
            log: log.clone(),
            swallow: false,
        }
    }

    /// Creates a filter that ignores the error from `next`.
    pub fn swallowing(log: &EventLog) -> Self {
        Self {
            log: log.clone(),
            swallow: true,
        }
    }

    async fn continue_anyway<C: StageContext>(
        &self,
        ctx: &mut C,
        next: Next<'_, C>,
    ) -> Result<(), ActionError> {
        self.log.push("misbehaving.continue");
        match next.run(ctx).await {
            Ok(_) => Ok(()),
            Err(_) if self.swallow => Ok(()),
            Err(e) => Err(e),
        }
    }
}

impl AsyncFilter<ResourceExecutingContext> for ContinueAfterShortCircuit {
    fn name(&self) -> &str {
        "misbehaving"
    }

    fn on_execution<'a>(
        &'a self,
        ctx: &'a mut ResourceExecutingContext,
        next: Next<'a, ResourceExecutingContext>,
    ) -> BoxFuture<'a, Result<(), ActionError>> {
        Box::pin(async move {
            ctx.set_result(StatusCodeResult(StatusCode::NO_CONTENT));
            self.continue_anyway(ctx, next).await
        })
    }
}

impl AsyncFilter<ActionExecutingContext> for ContinueAfterShortCircuit {
    fn name(&self) -> &str {
        "misbehaving"
    }

    fn on_execution<'a>(
        &'a self,
        ctx: &'a mut ActionExecutingContext,
        next: Next<'a, ActionExecutingContext>,
    ) -> BoxFuture<'a, Result<(), ActionError>> {
        Box::pin(async move {
            ctx.set_result(StatusCodeResult(StatusCode::NO_CONTENT));
            self.continue_anyway(ctx, next).await
        })
    }
}

/// Records diagnostic event names and final statuses.
#[derive(Debug, Default)]
pub struct RecordingListener {
    events: Mutex<Vec<&'static str>>,
    statuses: Mutex<Vec<InvocationStatus>>,
}

impl RecordingListener {
    /// Creates a shared listener, ready to hand to a pipeline builder.
    pub fn shared() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Event names, in the order they were received.
    pub fn events(&self) -> Vec<&'static str> {
        self.events.lock().clone()
    }

    /// How many times `name` was received.
    pub fn count(&self, name: &str) -> usize {
        self.events.lock().iter().filter(|e| **e == name).count()
    }

    /// Statuses reported by `AfterAction` events.
    pub fn statuses(&self) -> Vec<InvocationStatus> {
        self.statuses.lock().clone()
    }
}

impl DiagnosticListener for RecordingListener {
    fn on_event(&self, event: &DiagnosticEvent<'_>) {
        self.events.lock().push(event.name());
        if let DiagnosticEvent::AfterAction { status, .. } = event {
            self.statuses.lock().push(*status);
        }
    }
}

/// Records executed result types, then delegates to
/// [`ResponseResultExecutor`] or fails.
#[derive(Debug, Default)]
pub struct RecordingResultExecutor {
    executed: Mutex<Vec<&'static str>>,
    failure: Option<String>,
    inner: ResponseResultExecutor,
}

impl RecordingResultExecutor {
    /// Creates an executor that writes results into the response.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an executor whose every call fails with `message`.
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            failure: Some(message.into()),
            ..Self::default()
        }
    }

    /// Result type names of every execution attempt.
    pub fn executed(&self) -> Vec<&'static str> {
        self.executed.lock().clone()
    }

    /// Number of execution attempts.
    pub fn calls(&self) -> usize {
        self.executed.lock().len()
    }
}

impl ResultExecutor for RecordingResultExecutor {
    fn execute<'a>(
        &'a self,
        ctx: &'a mut ActionContext,
        result: &'a SharedResult,
    ) -> BoxFuture<'a, Result<(), ActionError>> {
        self.executed.lock().push(result.result_type());
        match &self.failure {
            Some(message) => {
                let error = ActionError::result_execution(message.clone());
                Box::pin(async move { Err(error) })
            }
            None => self.inner.execute(ctx, result),
        }
    }
}

#[derive(Debug)]
enum Pick {
    First,
    Named(String),
    Nothing,
}

/// A handler selector that ignores the request.
#[derive(Debug)]
pub struct StaticHandlerSelector {
    pick: Pick,
}

impl StaticHandlerSelector {
    /// Always selects the action's first handler.
    pub fn first() -> Self {
        Self { pick: Pick::First }
    }

    /// Always selects the handler with `name`.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            pick: Pick::Named(name.into()),
        }
    }

    /// Never selects a handler.
    pub fn none() -> Self {
        Self {
            pick: Pick::Nothing,
        }
    }
}

impl HandlerSelector for StaticHandlerSelector {
    fn select(&self, ctx: &ActionContext) -> Option<Arc<HandlerDescriptor>> {
        let handlers = ctx.action_descriptor().handlers();
        match &self.pick {
            Pick::First => handlers.first().cloned(),
            Pick::Named(name) => handlers
                .iter()
                .find(|handler| handler.name() == Some(name.as_str()))
                .cloned(),
            Pick::Nothing => None,
        }
    }
}

/// A parameter binder that returns fixed arguments (or a fixed error) and
/// counts its calls.
///
/// Clones share the call counter, so a test can keep one and hand the other
/// to the pipeline.
#[derive(Debug, Clone, Default)]
pub struct FakeParameterBinder {
    arguments: Arguments,
    failure: Option<String>,
    calls: Arc<AtomicUsize>,
}

impl FakeParameterBinder {
    /// Binds `arguments` for every handler.
    pub fn new(arguments: Arguments) -> Self {
        Self {
            arguments,
            ..Self::default()
        }
    }

    /// Fails every bind with a binding error carrying `message`.
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            failure: Some(message.into()),
            ..Self::default()
        }
    }

    /// Number of bind calls.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl ParameterBinder for FakeParameterBinder {
    fn bind<'a>(
        &'a self,
        _ctx: &'a mut ActionContext,
        _handler: &'a HandlerDescriptor,
    ) -> BoxFuture<'a, Result<Arguments, ActionError>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let outcome = match &self.failure {
            Some(message) => Err(ActionError::binding(message.clone())),
            None => Ok(self.arguments.clone()),
        };
        Box::pin(async move { outcome })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_log() {
        let log = EventLog::new();
        assert!(log.is_empty());

        let shared = log.clone();
        shared.push("a");
        log.push("b");

        assert_eq!(log.entries(), ["a", "b"]);
        assert!(shared.contains("b"));
        assert_eq!(shared.len(), 2);

        log.clear();
        assert!(shared.is_empty());
    }

    #[test]
    fn test_static_selector_named() {
        use http::Method;
        use praxis_core::{ActionDescriptor, HandlerMethod};

        let action = ActionDescriptor::new("/Orders")
            .with_handler(HandlerDescriptor::new(
                Method::GET,
                HandlerMethod::unit(|_| async { Ok(()) }),
            ))
            .with_handler(
                HandlerDescriptor::new(Method::POST, HandlerMethod::unit(|_| async { Ok(()) }))
                    .named("cancel"),
            );
        let ctx = ActionContext::new(
            Arc::new(action),
            praxis_core::HttpContext::default(),
            praxis_core::RouteData::new(),
        );

        let picked = StaticHandlerSelector::named("cancel").select(&ctx).unwrap();
        assert_eq!(picked.http_method(), &Method::POST);
        assert!(StaticHandlerSelector::first().select(&ctx).unwrap().name().is_none());
        assert!(StaticHandlerSelector::none().select(&ctx).is_none());
        assert!(StaticHandlerSelector::named("missing").select(&ctx).is_none());
    }

    #[tokio::test]
    async fn test_fake_binder() {
        use http::Method;
        use praxis_core::HandlerMethod;

        let handler = HandlerDescriptor::new(Method::GET, HandlerMethod::unit(|_| async { Ok(()) }));
        let mut ctx = ActionContext::default();

        let binder = FakeParameterBinder::new(Arguments::new().with("id", 7));
        let args = binder.bind(&mut ctx, &handler).await.unwrap();
        assert_eq!(args.get_as::<u32>("id").unwrap(), 7);

        let failing = FakeParameterBinder::failing("no id");
        assert!(failing.bind(&mut ctx, &handler).await.is_err());
        assert_eq!(binder.calls() + failing.calls(), 2);
    }
}
