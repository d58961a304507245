use std::collections::BTreeMap;

use async_trait::async_trait;
use scaffold_core::types::{Step, StepKind, ToolType};
use serde_json::json;

use crate::executor::StepContext;
use crate::tool::{validate_shape, ResourceScope, Tool, ToolError, ToolOutput, ToolValidation};

#[derive(Debug, Default)]
pub struct ActionTool;

#[async_trait]
impl Tool for ActionTool {
    fn tool_type(&self) -> ToolType {
        ToolType::Action
    }

    fn validate(&self, step: &Step, ctx: &StepContext) -> ToolValidation {
        let mut v = validate_shape(ToolType::Action, step);
        if let StepKind::Action(a) = &step.kind {
            if !a.action.is_empty() && ctx.services.actions.get(&a.action).is_none() {
                let known: Vec<&str> = ctx.services.actions.ids().collect();
                v.error(format!("unknown action '{}'", a.action));
                v.suggest(format!("available actions: {}", known.join(", ")));
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
        let StepKind::Action(a) = &step.kind else {
            return Err(ToolError::configuration("not an action step"));
        };
        let action = ctx
            .services
            .actions
            .get(&a.action)
            .ok_or_else(|| ToolError::resolution(format!("unknown action '{}'", a.action)))?;

        let mut parameters = BTreeMap::new();
        for (k, v) in &a.parameters {
            parameters.insert(k.clone(), ctx.interpolate_value(v)?);
        }

        if ctx.flags.dry_run && action.has_side_effects() {
            return Ok(ToolOutput::with_data(json!({ "action": a.action, "dryRun": true })));
        }
        let result = action.run(&parameters, ctx).await?;
        Ok(ToolOutput::with_data(json!({ "action": a.action, "result": result })))
    }
}
