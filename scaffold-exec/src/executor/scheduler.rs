use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

use futures_util::future::{join, join_all};
use scaffold_core::plan_steps;
use scaffold_core::types::Step;
use tracing::{debug, info};

use crate::executor::concurrency::ConcurrencyLimits;
use crate::executor::context::StepContext;
use crate::executor::events::Event;
use crate::executor::result::{ExecutionOutcome, FailureInfo, RunSummary, StepResult, StepStatus};
use crate::executor::step_runner::run_step;
use crate::executor::types::{ExecutorError, GroupMode};
use crate::tool::ToolErrorKind;

pub const DEPENDENCY_FAILED: &str = "dependency failed";

/// Runs a step list wave by wave.
///
/// Within a wave, steps marked `parallel` (or every step in
/// [`GroupMode::Parallel`]) run concurrently while the unmarked ones run one
/// after another in declaration order. A wave only starts once every step of
/// the previous wave is terminal.
pub struct StepExecutor;

impl StepExecutor {
    pub async fn execute(
        steps: &[Step],
        ctx: &StepContext,
        mode: GroupMode,
    ) -> Result<ExecutionOutcome, ExecutorError> {
        let started = Instant::now();
        let graph = plan_steps(steps)?;
        let by_name: HashMap<&str, (usize, &Step)> = steps
            .iter()
            .enumerate()
            .map(|(i, s)| (s.name.as_str(), (i, s)))
            .collect();

        let limit = ctx
            .settings
            .max_parallel_steps
            .unwrap_or(ctx.services.config.max_parallel);
        let limits = ConcurrencyLimits::new(limit);
        let run_continue = ctx.services.config.continue_on_error;

        let mut results: BTreeMap<usize, StepResult> = BTreeMap::new();
        // Failed steps whose failure was not absorbed, plus steps skipped because of them.
        let mut blocked: HashSet<String> = HashSet::new();
        let mut failure: Option<FailureInfo> = None;
        let mut halted = false;

        for (wave_no, wave) in graph.waves.iter().enumerate() {
            if halted || ctx.cancel.is_cancelled() {
                break;
            }
            debug!(recipe = %ctx.recipe_name, wave = wave_no, steps = wave.len(), "starting wave");

            let mut concurrent = Vec::new();
            let mut sequential = Vec::new();
            for name in wave {
                let Some(&(idx, step)) = by_name.get(name.as_str()) else {
                    continue;
                };
                let deps = graph.depends_on.get(name).map(Vec::as_slice).unwrap_or(&[]);
                if deps.iter().any(|d| blocked.contains(d)) {
                    let r = StepResult::skipped(step, DEPENDENCY_FAILED);
                    ctx.emit(Event::StepSkipped {
                        run_id: ctx.run_id,
                        step: step.name.clone(),
                        reason: DEPENDENCY_FAILED.to_string(),
                    })
                    .await;
                    ctx.record_result(r.clone());
                    blocked.insert(step.name.clone());
                    results.insert(idx, r);
                    continue;
                }
                if mode == GroupMode::Parallel || step.parallel {
                    concurrent.push((idx, step));
                } else {
                    sequential.push((idx, step));
                }
            }

            let halt = AtomicBool::new(false);
            let is_hard_failure = |step: &Step, r: &StepResult| r.is_failed() && !absorbs_failure(step, ctx);

            let concurrent_run = join_all(concurrent.iter().map(|&(idx, step)| {
                let limits = &limits;
                let halt = &halt;
                async move {
                    let _permit = limits.acquire().await;
                    if halt.load(Ordering::SeqCst) || ctx.cancel.is_cancelled() {
                        return None;
                    }
                    let r = run_step(step, ctx, true).await;
                    if is_hard_failure(step, &r) && !run_continue {
                        halt.store(true, Ordering::SeqCst);
                    }
                    Some((idx, r))
                }
            }));

            let sequential_run = async {
                let mut out = Vec::new();
                for &(idx, step) in &sequential {
                    if halt.load(Ordering::SeqCst) || ctx.cancel.is_cancelled() {
                        break;
                    }
                    let _permit = limits.acquire().await;
                    let r = run_step(step, ctx, false).await;
                    if is_hard_failure(step, &r) && !run_continue {
                        halt.store(true, Ordering::SeqCst);
                    }
                    out.push((idx, r));
                }
                out
            };

            let (concurrent_results, sequential_results) = join(concurrent_run, sequential_run).await;
            let mut finished: Vec<(usize, StepResult)> = concurrent_results
                .into_iter()
                .flatten()
                .chain(sequential_results)
                .collect();
            finished.sort_by_key(|(idx, _)| *idx);

            for (idx, r) in finished {
                let step = &steps[idx];
                if is_hard_failure(step, &r) {
                    blocked.insert(step.name.clone());
                    if failure.is_none() {
                        failure = Some(FailureInfo {
                            step: step.name.clone(),
                            tool: step.tool_type(),
                            kind: r.error.as_ref().map_or(ToolErrorKind::Execution, |e| e.kind),
                            message: r.error_message().unwrap_or("step failed").to_string(),
                        });
                    }
                    if !run_continue {
                        halted = true;
                    }
                }
                results.insert(idx, r);
            }
        }

        let not_run: Vec<String> = steps
            .iter()
            .enumerate()
            .filter(|(i, _)| !results.contains_key(i))
            .map(|(_, s)| s.name.clone())
            .collect();
        let results: Vec<StepResult> = results.into_values().collect();
        let count = |status: StepStatus| results.iter().filter(|r| r.status == status).count();
        let summary = RunSummary {
            completed: count(StepStatus::Completed),
            failed: count(StepStatus::Failed),
            skipped: count(StepStatus::Skipped),
            not_run,
            duration_ms: started.elapsed().as_millis() as u64,
        };
        let cancelled = ctx.cancel.is_cancelled();

        info!(
            recipe = %ctx.recipe_name,
            completed = summary.completed,
            failed = summary.failed,
            skipped = summary.skipped,
            not_run = summary.not_run.len(),
            halted,
            cancelled,
            "step list finished"
        );

        Ok(ExecutionOutcome {
            results,
            summary,
            failure,
            halted,
            cancelled,
        })
    }
}

/// A failure is absorbed when the step (or the recipe default) opts into continue-on-error.
fn absorbs_failure(step: &Step, ctx: &StepContext) -> bool {
    step.continue_on_error
        .or(ctx.settings.continue_on_error)
        .unwrap_or(false)
}
