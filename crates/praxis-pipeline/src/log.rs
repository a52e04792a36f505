//! Structured log points.
//!
//! Message text is free-form; the fields are what log pipelines key on.

use crate::diagnostics::InvocationStatus;
use praxis_core::{
    ActionContext, Arguments, Fault, FilterCategory, HandlerDescriptor, SharedResult,
    UsageViolation,
};
use std::time::Duration;
use tracing::{debug, error, info, warn};

pub(crate) fn executing_action(ctx: &ActionContext) {
    info!(
        action = ctx.action_descriptor().display_name(),
        route = %ctx.route_data(),
        "Route matched with {}. Executing action {}",
        ctx.route_data(),
        ctx.action_descriptor().display_name(),
    );
}

pub(crate) fn executed_action(ctx: &ActionContext, elapsed: Duration, status: InvocationStatus) {
    info!(
        action = ctx.action_descriptor().display_name(),
        elapsed_ms = elapsed.as_secs_f64() * 1000.0,
        status = status.as_str(),
        "Executed action {} in {:.4}ms",
        ctx.action_descriptor().display_name(),
        elapsed.as_secs_f64() * 1000.0,
    );
}

pub(crate) fn authorization_failure(filter: &str) {
    info!(filter, "Authorization failed for the request at filter '{}'", filter);
}

pub(crate) fn short_circuited(category: FilterCategory, filter: &str) {
    debug!(
        stage = category.name(),
        filter,
        "Request was short circuited at {} filter '{}'",
        category,
        filter,
    );
}

pub(crate) fn handler_selected(ctx: &ActionContext, handler: Option<&HandlerDescriptor>) {
    match handler {
        Some(handler) => debug!(
            action = ctx.action_descriptor().display_name(),
            handler = %handler.display_name(),
            "Selected handler {}",
            handler.display_name(),
        ),
        None => debug!(
            action = ctx.action_descriptor().display_name(),
            method = %ctx.http().method(),
            "No handler matched the request",
        ),
    }
}

pub(crate) fn ambiguous_handlers(ctx: &ActionContext, candidates: usize) {
    warn!(
        action = ctx.action_descriptor().display_name(),
        candidates,
        "Multiple handlers matched the request; using the first declared",
    );
}

pub(crate) fn executing_handler(
    handler: &HandlerDescriptor,
    arguments: &Arguments,
    model_state_valid: bool,
    log_arguments: bool,
) {
    if log_arguments {
        debug!(
            handler = %handler.display_name(),
            arguments = ?arguments,
            model_state_valid,
            "Executing handler method {} with arguments {:?}",
            handler.display_name(),
            arguments,
        );
    } else {
        debug!(
            handler = %handler.display_name(),
            argument_count = arguments.len(),
            model_state_valid,
            "Executing handler method {}",
            handler.display_name(),
        );
    }
}

pub(crate) fn executed_handler(handler: &HandlerDescriptor, result: Option<&SharedResult>) {
    let result_type = result.map_or("none", |result| result.result_type());
    debug!(
        handler = %handler.display_name(),
        result_type,
        "Executed handler method {}, returned result {}",
        handler.display_name(),
        result_type,
    );
}

pub(crate) fn executing_result(result: &SharedResult) {
    debug!(result_type = result.result_type(), "Executing result {}", result.result_type());
}

pub(crate) fn exception_filter_replaced(filter: &str, fault: &Fault) {
    warn!(
        filter,
        fault_id = %fault.dispatch().id(),
        "Exception filter '{}' raised while handling a fault: {}",
        filter,
        fault,
    );
}

pub(crate) fn usage_violation(violation: &UsageViolation) {
    error!(
        stage = violation.category().name(),
        filter = violation.filter(),
        "{}",
        violation,
    );
}

pub(crate) fn unhandled_fault(fault: &Fault) {
    error!(
        fault_id = %fault.dispatch().id(),
        origin = %fault.origin(),
        kind = ?fault.kind(),
        "Unhandled fault escaped the action pipeline: {}",
        fault,
    );
}
