use std::time::Duration;

use chrono::Utc;
use scaffold_core::types::Step;
use tracing::{debug, warn};

use crate::executor::context::StepContext;
use crate::executor::events::Event;
use crate::executor::result::{StepResult, StepStatus};
use crate::registry::{ResolveOptions, DEFAULT_TOOL_NAME};
use crate::tool::{ExecuteOptions, ToolError};

/// Evaluate the step's condition, resolve its tool and execute it.
///
/// `fresh` forces an uncached tool instance; composite tools always get one.
/// The result is recorded on the context before it is returned.
pub(crate) async fn run_step(step: &Step, ctx: &StepContext, fresh: bool) -> StepResult {
    let mut condition = None;
    if let Some(expr) = step.when.as_deref() {
        match ctx.evaluate_condition(expr) {
            Ok(true) => condition = Some(true),
            Ok(false) => {
                let result = StepResult::skipped(step, format!("condition `{expr}` is false"))
                    .with_condition(false);
                return finish(step, ctx, result).await;
            }
            Err(e) => {
                let err = ToolError::syntax(format!("invalid `when` on step '{}': {}", step.name, e.message));
                return finish(step, ctx, StepResult::failed(step, Utc::now(), 0, err)).await;
            }
        }
    }

    let tool_type = step.tool_type();
    ctx.emit(Event::StepStarted {
        run_id: ctx.run_id,
        step: step.name.clone(),
        tool: tool_type,
    })
    .await;

    let reuse = !fresh && !tool_type.is_composite();
    let instance = match ctx
        .services
        .registry
        .resolve(
            tool_type,
            DEFAULT_TOOL_NAME,
            ResolveOptions {
                reuse,
                ..Default::default()
            },
        )
        .await
    {
        Ok(i) => i,
        Err(e) => {
            let err = ToolError::resolution(e.to_string());
            return finish(step, ctx, StepResult::failed(step, Utc::now(), 0, err)).await;
        }
    };

    let opts = execute_options(step, ctx);
    debug!(step = %step.name, tool = %tool_type, reuse, ?opts.timeout, retries = opts.retries, "executing step");
    let mut result = instance.execute(step, ctx, &opts).await;

    if !reuse {
        if let Err(e) = instance.cleanup().await {
            warn!(step = %step.name, error = %e, "tool cleanup failed");
        }
    }

    if condition.is_some() {
        result.condition_result = condition;
    }
    finish(step, ctx, result).await
}

/// Effective settings: step field, then recipe settings, then executor config.
pub(crate) fn execute_options(step: &Step, ctx: &StepContext) -> ExecuteOptions {
    let config = &ctx.services.config;
    let timeout = step
        .timeout
        .or(ctx.settings.timeout)
        .map(Duration::from_millis)
        .or(config.step_timeout);
    ExecuteOptions {
        retries: ctx.settings.retries.unwrap_or(config.retry.retries),
        timeout,
        retry: config.retry.clone(),
    }
}

async fn finish(step: &Step, ctx: &StepContext, result: StepResult) -> StepResult {
    let event = match result.status {
        StepStatus::Completed => Event::StepCompleted {
            run_id: ctx.run_id,
            step: step.name.clone(),
            duration_ms: result.duration_ms,
        },
        StepStatus::Failed => Event::StepFailed {
            run_id: ctx.run_id,
            step: step.name.clone(),
            error: result.error_message().unwrap_or_default().to_string(),
        },
        StepStatus::Skipped => Event::StepSkipped {
            run_id: ctx.run_id,
            step: step.name.clone(),
            reason: result.skip_reason.clone().unwrap_or_default(),
        },
    };
    ctx.emit(event).await;
    ctx.record_result(result.clone());
    result
}
