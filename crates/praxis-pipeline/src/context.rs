//! Stage contexts.
//!
//! Each chained stage (resource, action, result) has an *executing* context
//! that its filters receive on the way in, and hands its filters an
//! [`ExecutedContext`] on the way out. The executing context owns the
//! [`ActionContext`] while the stage runs; the executed context is a view
//! over the stage's single [`StageOutcome`].
//!
//! Authorization and exception filters are not chained and get their own
//! flat contexts.

use praxis_core::{
    ActionContext, ActionResult, Arguments, Fault, FilterCategory, HandlerDescriptor,
    SharedResult, UsageViolation, ValueProviderFactory,
};
use std::sync::Arc;

/// How a stage ended.
///
/// At most one of result and unhandled exception is meaningful: while an
/// exception is unhandled the result is ignored.
#[derive(Debug, Clone, Default)]
pub struct StageOutcome {
    result: Option<SharedResult>,
    exception: Option<Fault>,
    exception_handled: bool,
    canceled: bool,
}

impl StageOutcome {
    pub(crate) fn completed(result: Option<SharedResult>) -> Self {
        Self {
            result,
            ..Self::default()
        }
    }

    pub(crate) fn short_circuited(result: Option<SharedResult>) -> Self {
        Self {
            result,
            canceled: true,
            ..Self::default()
        }
    }

    pub(crate) fn faulted(fault: Fault) -> Self {
        Self {
            exception: Some(fault),
            ..Self::default()
        }
    }

    /// The stage result.
    pub fn result(&self) -> Option<&SharedResult> {
        self.result.as_ref()
    }

    /// Consumes the outcome, returning its result.
    pub fn into_result(self) -> Option<SharedResult> {
        self.result
    }

    /// The captured fault, handled or not.
    pub fn exception(&self) -> Option<&Fault> {
        self.exception.as_ref()
    }

    /// Whether a hook marked the fault handled.
    pub fn exception_handled(&self) -> bool {
        self.exception_handled
    }

    /// Whether a filter short-circuited the stage, or a stage nested inside
    /// it.
    pub fn canceled(&self) -> bool {
        self.canceled
    }

    /// The fault, if one is present and nobody handled it.
    pub fn unhandled_exception(&self) -> Option<&Fault> {
        self.exception.as_ref().filter(|_| !self.exception_handled)
    }
}

/// Per-stage bookkeeping owned by an executing context.
#[derive(Debug, Default)]
pub struct StageSlot {
    outcome: Option<StageOutcome>,
    violation: Option<UsageViolation>,
    inner_canceled: bool,
}

impl StageSlot {
    pub(crate) fn record(&mut self, mut outcome: StageOutcome) {
        outcome.canceled |= self.inner_canceled;
        self.outcome = Some(outcome);
    }

    /// A stage nested inside this one was short-circuited; the outcome this
    /// stage records reports `canceled` as well.
    pub(crate) fn propagate_cancel(&mut self) {
        self.inner_canceled = true;
    }

    pub(crate) fn has_outcome(&self) -> bool {
        self.outcome.is_some()
    }

    pub(crate) fn take_outcome(&mut self) -> Option<StageOutcome> {
        self.outcome.take()
    }

    pub(crate) fn outcome_mut(&mut self) -> &mut StageOutcome {
        self.outcome.get_or_insert_with(StageOutcome::default)
    }

    /// Violations are sticky: once a filter breaks the contract the stage
    /// can only fail.
    pub(crate) fn poison(&mut self, violation: UsageViolation) {
        self.violation.get_or_insert(violation);
    }

    pub(crate) fn violation(&self) -> Option<&UsageViolation> {
        self.violation.as_ref()
    }
}

mod sealed {
    pub trait Sealed {}
}

/// An executing context driven by the stage engine.
///
/// Implemented by [`ResourceExecutingContext`], [`ActionExecutingContext`]
/// and [`ResultExecutingContext`] only.
pub trait StageContext: sealed::Sealed + Send + Sync + 'static {
    /// Category whose filters receive this context.
    const CATEGORY: FilterCategory;

    /// Whether a filter asked to stop the stage here.
    fn wants_short_circuit(&self) -> bool;

    /// The outcome recorded when a filter declines to continue.
    fn short_circuit_outcome(&self) -> StageOutcome;

    /// Splits the context into the action context and the stage slot.
    fn parts(&mut self) -> (&ActionContext, &mut StageSlot);

    /// The stage slot.
    fn slot(&mut self) -> &mut StageSlot {
        self.parts().1
    }
}

/// What an after-hook sees: the action context and the stage outcome.
///
/// Every after-hook of a stage shares one outcome, so a hook that handles a
/// fault or replaces the result is observed by the hooks outside it.
#[derive(Debug)]
pub struct ExecutedContext<'c> {
    category: FilterCategory,
    action: &'c ActionContext,
    outcome: &'c mut StageOutcome,
}

impl<'c> ExecutedContext<'c> {
    pub(crate) fn of<C: StageContext>(ctx: &'c mut C) -> Self {
        let (action, slot) = ctx.parts();
        Self {
            category: C::CATEGORY,
            action,
            outcome: slot.outcome_mut(),
        }
    }

    /// Stage this context belongs to.
    pub fn category(&self) -> FilterCategory {
        self.category
    }

    /// The action context.
    pub fn action_context(&self) -> &ActionContext {
        self.action
    }

    /// The current result.
    pub fn result(&self) -> Option<&SharedResult> {
        self.outcome.result()
    }

    /// Replaces the result.
    pub fn set_result(&mut self, result: impl ActionResult) {
        self.outcome.result = Some(Arc::new(result));
    }

    /// Replaces the result with an already shared one.
    pub fn set_shared_result(&mut self, result: Option<SharedResult>) {
        self.outcome.result = result;
    }

    /// Whether the stage was short-circuited. Resource filters also see this
    /// when the action or result stage was.
    pub fn canceled(&self) -> bool {
        self.outcome.canceled
    }

    /// The captured fault, if any.
    pub fn exception(&self) -> Option<&Fault> {
        self.outcome.exception.as_ref()
    }

    /// Replaces (or clears) the captured fault.
    pub fn set_exception(&mut self, exception: Option<Fault>) {
        self.outcome.exception = exception;
    }

    /// Whether the fault was handled.
    pub fn exception_handled(&self) -> bool {
        self.outcome.exception_handled
    }

    /// Marks the fault handled (or not).
    pub fn set_exception_handled(&mut self, handled: bool) {
        self.outcome.exception_handled = handled;
    }

    /// Marks the fault handled and substitutes `result`.
    pub fn handle_exception(&mut self, result: impl ActionResult) {
        self.outcome.exception_handled = true;
        self.outcome.result = Some(Arc::new(result));
    }

    /// True while a fault is present and unhandled.
    pub fn is_faulted(&self) -> bool {
        self.outcome.unhandled_exception().is_some()
    }

    /// The outcome as it stands.
    pub fn outcome(&self) -> &StageOutcome {
        self.outcome
    }
}

macro_rules! owns_action_context {
    ($ty:ty) => {
        impl $ty {
            /// The action context.
            pub fn action_context(&self) -> &ActionContext {
                &self.action
            }

            /// Mutable access to the action context.
            pub fn action_context_mut(&mut self) -> &mut ActionContext {
                &mut self.action
            }

            pub(crate) fn into_action_context(self) -> ActionContext {
                self.action
            }
        }
    };
}

/// Context handed to resource filters.
#[derive(Debug)]
pub struct ResourceExecutingContext {
    action: ActionContext,
    value_provider_factories: Vec<Arc<dyn ValueProviderFactory>>,
    result: Option<SharedResult>,
    slot: StageSlot,
}

owns_action_context!(ResourceExecutingContext);

impl ResourceExecutingContext {
    pub(crate) fn new(action: ActionContext) -> Self {
        Self {
            value_provider_factories: action.value_provider_factories().to_vec(),
            action,
            result: None,
            slot: StageSlot::default(),
        }
    }

    /// The value-provider factories the handler will be bound with.
    pub fn value_provider_factories(&self) -> &[Arc<dyn ValueProviderFactory>] {
        &self.value_provider_factories
    }

    /// The value-provider factories, for modification.
    ///
    /// This is the only place the list can be changed. Changes are handed to
    /// the action context when the stage continues inward.
    ///
    /// ```compile_fail
    /// fn clear(ctx: &mut praxis_core::ActionContext) {
    ///     ctx.value_provider_factories_mut().clear();
    /// }
    /// ```
    pub fn value_provider_factories_mut(&mut self) -> &mut Vec<Arc<dyn ValueProviderFactory>> {
        &mut self.value_provider_factories
    }

    pub(crate) fn commit_value_provider_factories(&mut self) {
        let action = std::mem::take(&mut self.action);
        self.action = action.with_value_provider_factories(self.value_provider_factories.clone());
    }

    /// The short-circuit result, if set.
    pub fn result(&self) -> Option<&SharedResult> {
        self.result.as_ref()
    }

    /// Short-circuits the stage with `result`.
    pub fn set_result(&mut self, result: impl ActionResult) {
        self.result = Some(Arc::new(result));
    }

    /// Sets or clears the short-circuit result.
    pub fn set_shared_result(&mut self, result: Option<SharedResult>) {
        self.result = result;
    }
}

impl sealed::Sealed for ResourceExecutingContext {}

impl StageContext for ResourceExecutingContext {
    const CATEGORY: FilterCategory = FilterCategory::Resource;

    fn wants_short_circuit(&self) -> bool {
        self.result.is_some()
    }

    fn short_circuit_outcome(&self) -> StageOutcome {
        StageOutcome::short_circuited(self.result.clone())
    }

    fn parts(&mut self) -> (&ActionContext, &mut StageSlot) {
        (&self.action, &mut self.slot)
    }
}

/// Context handed to action filters.
#[derive(Debug)]
pub struct ActionExecutingContext {
    action: ActionContext,
    handler: Option<Arc<HandlerDescriptor>>,
    arguments: Arguments,
    result: Option<SharedResult>,
    slot: StageSlot,
}

owns_action_context!(ActionExecutingContext);

impl ActionExecutingContext {
    pub(crate) fn new(
        action: ActionContext,
        handler: Option<Arc<HandlerDescriptor>>,
        arguments: Arguments,
    ) -> Self {
        Self {
            action,
            handler,
            arguments,
            result: None,
            slot: StageSlot::default(),
        }
    }

    /// The selected handler, if any.
    pub fn handler(&self) -> Option<&Arc<HandlerDescriptor>> {
        self.handler.as_ref()
    }

    /// The bound arguments.
    pub fn arguments(&self) -> &Arguments {
        &self.arguments
    }

    /// The bound arguments, for modification before the handler runs.
    pub fn arguments_mut(&mut self) -> &mut Arguments {
        &mut self.arguments
    }

    /// The short-circuit result, if set.
    pub fn result(&self) -> Option<&SharedResult> {
        self.result.as_ref()
    }

    /// Short-circuits the stage with `result`; the handler will not run.
    pub fn set_result(&mut self, result: impl ActionResult) {
        self.result = Some(Arc::new(result));
    }

    /// Sets or clears the short-circuit result.
    pub fn set_shared_result(&mut self, result: Option<SharedResult>) {
        self.result = result;
    }
}

impl sealed::Sealed for ActionExecutingContext {}

impl StageContext for ActionExecutingContext {
    const CATEGORY: FilterCategory = FilterCategory::Action;

    fn wants_short_circuit(&self) -> bool {
        self.result.is_some()
    }

    fn short_circuit_outcome(&self) -> StageOutcome {
        StageOutcome::short_circuited(self.result.clone())
    }

    fn parts(&mut self) -> (&ActionContext, &mut StageSlot) {
        (&self.action, &mut self.slot)
    }
}

/// Context handed to result filters.
#[derive(Debug)]
pub struct ResultExecutingContext {
    action: ActionContext,
    result: SharedResult,
    cancel: bool,
    slot: StageSlot,
}

owns_action_context!(ResultExecutingContext);

impl ResultExecutingContext {
    pub(crate) fn new(action: ActionContext, result: SharedResult) -> Self {
        Self {
            action,
            result,
            cancel: false,
            slot: StageSlot::default(),
        }
    }

    /// The result about to be executed.
    pub fn result(&self) -> &SharedResult {
        &self.result
    }

    /// Replaces the result about to be executed.
    pub fn set_result(&mut self, result: impl ActionResult) {
        self.result = Arc::new(result);
    }

    /// Replaces the result with an already shared one.
    pub fn set_shared_result(&mut self, result: SharedResult) {
        self.result = result;
    }

    /// Whether a filter cancelled execution.
    pub fn cancel(&self) -> bool {
        self.cancel
    }

    /// Cancels (or un-cancels) execution of the result.
    pub fn set_cancel(&mut self, cancel: bool) {
        self.cancel = cancel;
    }
}

impl sealed::Sealed for ResultExecutingContext {}

impl StageContext for ResultExecutingContext {
    const CATEGORY: FilterCategory = FilterCategory::Result;

    fn wants_short_circuit(&self) -> bool {
        self.cancel
    }

    fn short_circuit_outcome(&self) -> StageOutcome {
        StageOutcome::short_circuited(Some(Arc::clone(&self.result)))
    }

    fn parts(&mut self) -> (&ActionContext, &mut StageSlot) {
        (&self.action, &mut self.slot)
    }
}

/// Context handed to authorization filters.
#[derive(Debug)]
pub struct AuthorizationContext {
    action: ActionContext,
    result: Option<SharedResult>,
}

owns_action_context!(AuthorizationContext);

impl AuthorizationContext {
    pub(crate) fn new(action: ActionContext) -> Self {
        Self {
            action,
            result: None,
        }
    }

    /// The result that ends the request, if set.
    pub fn result(&self) -> Option<&SharedResult> {
        self.result.as_ref()
    }

    /// Rejects the request with `result`.
    pub fn set_result(&mut self, result: impl ActionResult) {
        self.result = Some(Arc::new(result));
    }

    pub(crate) fn take_result(&mut self) -> Option<SharedResult> {
        self.result.take()
    }
}

/// Context handed to exception filters.
#[derive(Debug)]
pub struct ExceptionContext {
    action: ActionContext,
    exception: Fault,
    exception_handled: bool,
    result: Option<SharedResult>,
}

owns_action_context!(ExceptionContext);

impl ExceptionContext {
    pub(crate) fn new(action: ActionContext, exception: Fault) -> Self {
        Self {
            action,
            exception,
            exception_handled: false,
            result: None,
        }
    }

    /// The fault being handled.
    pub fn exception(&self) -> &Fault {
        &self.exception
    }

    /// Whether a filter handled the fault.
    pub fn exception_handled(&self) -> bool {
        self.exception_handled
    }

    /// Marks the fault handled (or not).
    pub fn set_exception_handled(&mut self, handled: bool) {
        self.exception_handled = handled;
    }

    /// The replacement result, if set.
    pub fn result(&self) -> Option<&SharedResult> {
        self.result.as_ref()
    }

    /// Sets the result to execute instead of faulting.
    pub fn set_result(&mut self, result: impl ActionResult) {
        self.result = Some(Arc::new(result));
    }

    /// Marks the fault handled and substitutes `result`.
    pub fn handle_with(&mut self, result: impl ActionResult) {
        self.exception_handled = true;
        self.set_result(result);
    }

    /// A filter raised while handling: its fault replaces the current one.
    pub(crate) fn replace_exception(&mut self, fault: Fault) {
        self.exception = fault;
        self.exception_handled = false;
        self.result = None;
    }

    pub(crate) fn into_parts(self) -> (ActionContext, Option<Fault>, Option<SharedResult>) {
        let unhandled = (!self.exception_handled).then_some(self.exception);
        (self.action, unhandled, self.result)
    }
}
