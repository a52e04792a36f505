//! The stage engine.
//!
//! A stage is an ordered list of filters of one category wrapped around a
//! terminal operation. [`StageExecutor`] composes them right to left into a
//! chain of [`Next`] continuations: each filter receives the continuation for
//! everything inside it and decides whether to call it.
//!
//! ```text
//! f1.before → f2.before → … → terminal → … → f2.after → f1.after
//! ```
//!
//! The engine keeps one [`StageOutcome`] per stage. Whoever finishes first
//! writes it: the terminal, the filter that declined to continue
//! (short-circuit, `canceled = true`), or the continuation that caught a
//! fault. After-hooks then observe and edit that same outcome while the
//! chain unwinds.

use crate::context::{ExecutedContext, StageContext, StageOutcome};
use crate::filter::AsyncFilter;
use crate::log;
use praxis_core::{ActionError, BoxFuture, Fault, FaultOrigin, SharedResult, UsageViolation};
use std::sync::Arc;

/// The operation at the center of a stage.
pub trait StageTerminal<C: StageContext>: Send + Sync {
    /// Runs the operation, returning the stage result.
    fn execute<'c>(&'c self, ctx: &'c mut C)
        -> BoxFuture<'c, Result<Option<SharedResult>, ActionError>>;

    /// Origin attributed to errors returned by [`execute`](Self::execute).
    fn fault_origin(&self, ctx: &C) -> FaultOrigin;

    /// Called at the level of a filter that short-circuited, right after the
    /// canceled outcome is recorded and before outer after-hooks run.
    fn on_short_circuit<'c>(&'c self, _ctx: &'c mut C) -> BoxFuture<'c, Result<(), ActionError>> {
        Box::pin(async { Ok(()) })
    }
}

/// Continuation for the rest of a stage.
///
/// Consuming `self` in [`run`](Self::run) guarantees it is invoked at most
/// once. A filter that does not call it short-circuits the stage.
pub struct Next<'a, C: StageContext> {
    link: Link<'a, C>,
    terminal: &'a dyn StageTerminal<C>,
    /// Filter holding this continuation, for usage violation messages.
    caller: &'a str,
}

enum Link<'a, C: StageContext> {
    Filter {
        filter: &'a dyn AsyncFilter<C>,
        next: Box<Next<'a, C>>,
    },
    Terminal,
}

impl<'a, C: StageContext> Next<'a, C> {
    /// Runs the rest of the stage and returns the executed view of it.
    ///
    /// Faults raised further in are captured into the outcome rather than
    /// returned, so the caller's after-hook always gets to observe them.
    /// The only error this returns is a usage contract violation: calling
    /// this after setting a short-circuit result (or cancel) on `ctx`, or a
    /// violation raised further in. Either way the stage stays failed even
    /// if the caller drops the error.
    pub async fn run<'c>(self, ctx: &'c mut C) -> Result<ExecutedContext<'c>, ActionError> {
        if ctx.wants_short_circuit() {
            let violation = UsageViolation::continued_after_short_circuit(C::CATEGORY, self.caller);
            log::usage_violation(&violation);
            ctx.slot().poison(violation.clone());
            return Err(ActionError::UsageContract(violation));
        }

        match self.invoke(ctx).await {
            Ok(()) => {}
            Err(ActionError::Faulted(fault)) => ctx.slot().record(StageOutcome::faulted(fault)),
            Err(ActionError::UsageContract(violation)) => {
                // a violation further in, inner stages included, breaks this
                // stage as well
                ctx.slot().poison(violation.clone());
                return Err(ActionError::UsageContract(violation));
            }
            Err(other) => return Err(other),
        }
        Ok(ExecutedContext::of(ctx))
    }

    /// Runs this level. Errors are either usage violations or captured faults.
    async fn invoke(self, ctx: &mut C) -> Result<(), ActionError> {
        let terminal = self.terminal;
        match self.link {
            Link::Terminal => match terminal.execute(ctx).await {
                Ok(result) => {
                    ctx.slot().record(StageOutcome::completed(result));
                    Ok(())
                }
                Err(error) => Err(capture(error, || terminal.fault_origin(ctx))),
            },
            Link::Filter { filter, next } => {
                let mut next = *next;
                next.caller = filter.name();
                let returned = filter.on_execution(ctx, next).await;

                if let Some(violation) = ctx.slot().violation() {
                    return Err(ActionError::UsageContract(violation.clone()));
                }
                if let Err(error) = returned {
                    let origin = || FaultOrigin::filter(C::CATEGORY, filter.name());
                    return Err(capture(error, origin));
                }
                if !ctx.slot().has_outcome() {
                    log::short_circuited(C::CATEGORY, filter.name());
                    let outcome = ctx.short_circuit_outcome();
                    ctx.slot().record(outcome);
                    if let Err(error) = terminal.on_short_circuit(ctx).await {
                        return Err(capture(error, || terminal.fault_origin(ctx)));
                    }
                }
                Ok(())
            }
        }
    }
}

/// Wraps `error` as a fault unless it is one already or must stay fatal.
pub(crate) fn capture(error: ActionError, origin: impl FnOnce() -> FaultOrigin) -> ActionError {
    match error {
        ActionError::UsageContract(_) | ActionError::Faulted(_) => error,
        other => ActionError::Faulted(Fault::capture(other, origin())),
    }
}

/// Runs one stage: its filters around its terminal.
pub struct StageExecutor<'a, C: StageContext> {
    filters: &'a [Arc<dyn AsyncFilter<C>>],
    terminal: &'a dyn StageTerminal<C>,
}

impl<'a, C: StageContext> StageExecutor<'a, C> {
    /// Creates an executor for `filters` (outermost first) around `terminal`.
    pub fn new(filters: &'a [Arc<dyn AsyncFilter<C>>], terminal: &'a dyn StageTerminal<C>) -> Self {
        Self { filters, terminal }
    }

    fn chain(&self) -> Next<'a, C> {
        let terminal = self.terminal;
        let mut next = Next {
            link: Link::Terminal,
            terminal,
            caller: "",
        };
        for filter in self.filters.iter().rev() {
            next = Next {
                link: Link::Filter {
                    filter: filter.as_ref(),
                    next: Box::new(next),
                },
                terminal,
                caller: "",
            };
        }
        next
    }

    /// Runs the stage to completion.
    ///
    /// Returns the final outcome, or the stage's fault when it is still
    /// unhandled after the outermost after-hook. Faults raised by the
    /// outermost filter itself propagate directly.
    pub async fn execute(&self, ctx: &mut C) -> Result<StageOutcome, ActionError> {
        self.chain().invoke(ctx).await?;

        let outcome = ctx.slot().take_outcome();
        let outcome = match outcome {
            Some(outcome) => outcome,
            None => ctx.short_circuit_outcome(),
        };
        if let Some(fault) = outcome.unhandled_exception() {
            return Err(fault.rethrow());
        }
        Ok(outcome)
    }
}
