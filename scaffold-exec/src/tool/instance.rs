use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use chrono::Utc;
use scaffold_core::types::{Step, ToolType};
use tokio::sync::{Mutex, OnceCell};
use tracing::{debug, info, warn};

use crate::executor::{Event, StepContext, StepResult};
use crate::retry::{decide_retry, RetryConfig, RetryDecision};
use crate::tool::{ResourceScope, Tool, ToolError, ToolMetrics, ToolValidation};

/// Per-call execution settings resolved by the executor.
#[derive(Debug, Clone, Default)]
pub struct ExecuteOptions {
    /// Retry budget from the run or recipe; the step's own `retries` may raise it.
    pub retries: u32,
    pub timeout: Option<Duration>,
    pub retry: RetryConfig,
}

/// A live tool plus the lifecycle bookkeeping around it.
pub struct ToolInstance {
    tool: Box<dyn Tool>,
    name: String,
    initialized: OnceCell<()>,
    exec_guard: Mutex<()>,
    resources: ResourceScope,
    metrics: std::sync::Mutex<ToolMetrics>,
    cleaned_up: AtomicBool,
}

impl ToolInstance {
    pub fn new(tool: Box<dyn Tool>, name: impl Into<String>) -> Self {
        Self {
            tool,
            name: name.into(),
            initialized: OnceCell::new(),
            exec_guard: Mutex::new(()),
            resources: ResourceScope::new(),
            metrics: std::sync::Mutex::new(ToolMetrics::new()),
            cleaned_up: AtomicBool::new(false),
        }
    }

    pub fn tool_type(&self) -> ToolType {
        self.tool.tool_type()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn metrics(&self) -> ToolMetrics {
        self.metrics.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn is_cleaned_up(&self) -> bool {
        self.cleaned_up.load(Ordering::SeqCst)
    }

    /// Instance-level resources, released by [`ToolInstance::cleanup`].
    pub fn resources(&self) -> &ResourceScope {
        &self.resources
    }

    pub async fn initialize(&self) -> Result<(), ToolError> {
        self.initialized
            .get_or_try_init(|| async {
                debug!(tool = %self.tool_type(), name = %self.name, "initializing tool");
                self.tool.initialize(&self.resources).await
            })
            .await
            .map(|_| ())
    }

    pub fn validate(&self, step: &Step, ctx: &StepContext) -> ToolValidation {
        self.tool.validate(step, ctx)
    }

    /// Run `step` with retry, timeout and per-attempt resource cleanup.
    pub async fn execute(&self, step: &Step, ctx: &StepContext, opts: &ExecuteOptions) -> StepResult {
        let _guard = self.exec_guard.lock().await;
        let start_time = Utc::now();
        let started = Instant::now();

        if self.is_cleaned_up() {
            return StepResult::failed(
                step,
                start_time,
                0,
                ToolError::configuration("tool instance was already cleaned up"),
            );
        }

        if let Err(e) = self.initialize().await {
            self.record_failure(started.elapsed());
            return StepResult::failed(step, start_time, 0, e);
        }

        let validation = self.tool.validate(step, ctx);
        for w in &validation.warnings {
            warn!(step = %step.name, warning = %w, "step validation warning");
        }
        if !validation.is_valid {
            self.record_failure(started.elapsed());
            return StepResult::failed(
                step,
                start_time,
                0,
                ToolError::configuration(validation.errors.join("; ")),
            );
        }

        let max_retries = opts.retries.max(step.retries.unwrap_or(0));
        let mut attempt: u32 = 0;
        loop {
            attempt += 1;
            ctx.emit(Event::AttemptStarted {
                run_id: ctx.run_id,
                step: step.name.clone(),
                attempt,
            })
            .await;

            let result = self.attempt(step, ctx, opts.timeout).await;
            ctx.emit(Event::AttemptFinished {
                run_id: ctx.run_id,
                step: step.name.clone(),
                attempt,
                succeeded: result.is_ok(),
            })
            .await;

            let err = match result {
                Ok(output) => {
                    self.record_success(started.elapsed());
                    return StepResult::from_output(step, start_time, attempt - 1, output);
                }
                Err(e) => e,
            };

            match decide_retry(&opts.retry, attempt, max_retries, err.kind, ctx.cancel.is_cancelled()) {
                RetryDecision::RetryAfter { delay, .. } => {
                    info!(
                        step = %step.name,
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        error = %err,
                        "retrying step"
                    );
                    self.metrics.lock().unwrap_or_else(|e| e.into_inner()).record_retry();
                    ctx.emit(Event::StepRetryScheduled {
                        run_id: ctx.run_id,
                        step: step.name.clone(),
                        attempt,
                        delay_ms: delay.as_millis() as u64,
                    })
                    .await;
                    tokio::select! {
                        _ = tokio::time::sleep(delay) => {}
                        _ = ctx.cancel.cancelled() => {
                            self.record_failure(started.elapsed());
                            return StepResult::failed(step, start_time, attempt - 1, err);
                        }
                    }
                }
                RetryDecision::Stop { reason } => {
                    debug!(step = %step.name, ?reason, "not retrying");
                    self.record_failure(started.elapsed());
                    return StepResult::failed(step, start_time, attempt - 1, err);
                }
            }
        }
    }

    async fn attempt(
        &self,
        step: &Step,
        ctx: &StepContext,
        timeout: Option<Duration>,
    ) -> Result<crate::tool::ToolOutput, ToolError> {
        let scope = ResourceScope::new();
        let result = {
            let fut = self.tool.execute(step, ctx, &scope);
            match timeout {
                Some(limit) => match tokio::time::timeout(limit, fut).await {
                    Ok(r) => r,
                    Err(_) => Err(ToolError::timeout(format!(
                        "step '{}' timed out after {}ms",
                        step.name,
                        limit.as_millis()
                    ))),
                },
                None => fut.await,
            }
        };
        let failures = scope.cleanup();
        if !failures.is_empty() {
            warn!(step = %step.name, failures = failures.len(), "per-attempt cleanup reported failures");
        }
        result
    }

    /// Release instance-level resources. Runs at most once; waits for an in-flight execution.
    pub async fn cleanup(&self) -> Result<(), ToolError> {
        let _guard = self.exec_guard.lock().await;
        if self.cleaned_up.swap(true, Ordering::SeqCst) {
            return Ok(());
        }
        let tool_result = self.tool.cleanup().await;
        let failures = self.resources.cleanup();
        debug!(tool = %self.tool_type(), name = %self.name, "tool instance cleaned up");
        tool_result?;
        if failures.is_empty() {
            Ok(())
        } else {
            Err(ToolError::execution(format!(
                "cleanup failed for {} resource(s): {}",
                failures.len(),
                failures.join("; ")
            )))
        }
    }

    fn record_success(&self, d: Duration) {
        self.metrics.lock().unwrap_or_else(|e| e.into_inner()).record_success(d);
    }

    fn record_failure(&self, d: Duration) {
        self.metrics.lock().unwrap_or_else(|e| e.into_inner()).record_failure(d);
    }
}

impl std::fmt::Debug for ToolInstance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolInstance")
            .field("tool", &self.tool_type())
            .field("name", &self.name)
            .field("cleaned_up", &self.is_cleaned_up())
            .finish()
    }
}
