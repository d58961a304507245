use async_trait::async_trait;
use scaffold_core::types::{Step, StepKind, ToolType};
use serde_json::json;

use crate::executor::{ExecutionOutcome, GroupMode, StepContext, StepExecutor};
use crate::tool::{validate_shape, ResourceScope, Tool, ToolError, ToolOutput, ToolValidation};

/// Runs nested steps, in dependency order (`sequence`) or all at once (`parallel`).
#[derive(Debug)]
pub struct GroupTool {
    tool_type: ToolType,
}

impl GroupTool {
    pub fn sequence() -> Self {
        Self {
            tool_type: ToolType::Sequence,
        }
    }

    pub fn parallel() -> Self {
        Self {
            tool_type: ToolType::Parallel,
        }
    }

    fn mode(&self) -> GroupMode {
        match self.tool_type {
            ToolType::Parallel => GroupMode::Parallel,
            _ => GroupMode::Mixed,
        }
    }
}

#[async_trait]
impl Tool for GroupTool {
    fn tool_type(&self) -> ToolType {
        self.tool_type
    }

    fn validate(&self, step: &Step, _ctx: &StepContext) -> ToolValidation {
        let mut v = validate_shape(self.tool_type, step);
        if let StepKind::Sequence(g) | StepKind::Parallel(g) = &step.kind {
            if g.steps.is_empty() {
                v.warn("group has no steps");
            }
        }
        v
    }

    async fn execute(
        &self,
        step: &Step,
        ctx: &StepContext,
        _scope: &ResourceScope,
    ) -> Result<ToolOutput, ToolError> {
        let (StepKind::Sequence(g) | StepKind::Parallel(g)) = &step.kind else {
            return Err(ToolError::configuration("not a group step"));
        };
        let outcome = StepExecutor::execute(&g.steps, &ctx.derive_group(), self.mode())
            .await
            .map_err(|e| ToolError::configuration(e.to_string()))?;
        nested_output(&outcome, json!({ "steps": outcome.results, "summary": outcome.summary }))
    }
}

/// Fold a nested run into one tool output. A nested failure fails the parent
/// with the same error kind, so non-retryable failures stay non-retryable.
pub(crate) fn nested_output(outcome: &ExecutionOutcome, data: serde_json::Value) -> Result<ToolOutput, ToolError> {
    if outcome.cancelled {
        return Err(ToolError::cancelled());
    }
    if let Some(failure) = &outcome.failure {
        return Err(ToolError::new(
            failure.kind,
            format!("step '{}' failed: {}", failure.step, failure.message),
        )
        .with_details(data));
    }
    Ok(ToolOutput {
        data,
        files_created: outcome.files_created(),
        files_modified: outcome.files_modified(),
        files_deleted: outcome.files_deleted(),
        skipped: None,
    })
}
