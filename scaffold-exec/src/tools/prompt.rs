use async_trait::async_trait;
use scaffold_core::types::{Step, StepKind, ToolType};
use serde_json::{json, Value};

use crate::executor::StepContext;
use crate::interaction::PromptRequest;
use crate::tool::{
    validate_shape, ResourceRequirements, ResourceScope, Tool, ToolError, ToolOutput,
    ToolValidation,
};

/// Asks for one variable unless it already has a value.
#[derive(Debug, Default)]
pub struct PromptTool;

#[async_trait]
impl Tool for PromptTool {
    fn tool_type(&self) -> ToolType {
        ToolType::Prompt
    }

    fn validate(&self, step: &Step, ctx: &StepContext) -> ToolValidation {
        let mut v = validate_shape(ToolType::Prompt, step).with_requirements(ResourceRequirements {
            interactive: true,
            ..Default::default()
        });
        if let StepKind::Prompt(p) = &step.kind {
            if ctx.flags.skip_prompts && p.default.is_none() && ctx.variable(&p.variable).is_none() {
                v.warn(format!(
                    "prompts are skipped and '{}' has no default",
                    p.variable
                ));
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
        let StepKind::Prompt(p) = &step.kind else {
            return Err(ToolError::configuration("not a prompt step"));
        };

        if let Some(existing) = ctx.variable(&p.variable).filter(|v| !v.is_null()) {
            return Ok(ToolOutput::with_data(json!({
                "variable": p.variable,
                "value": existing,
                "source": "existing",
            })));
        }

        let default = p.default.as_ref().map(|d| ctx.interpolate_value(d)).transpose()?;
        let (value, source) = if ctx.flags.skip_prompts || ctx.flags.dry_run {
            let value = default.ok_or_else(|| {
                ToolError::execution(format!(
                    "no value for '{}' and prompts are disabled",
                    p.variable
                ))
            })?;
            (value, "default")
        } else {
            let request = PromptRequest {
                variable: p.variable.clone(),
                message: ctx.interpolate(&p.message)?,
                kind: p.prompt_type,
                choices: p.choices.clone(),
                default,
            };
            let value: Value = ctx
                .services
                .prompter
                .ask(&request)
                .await
                .map_err(|e| ToolError::execution(e.to_string()))?;
            (value, "prompt")
        };

        ctx.set_variable(p.variable.clone(), value.clone());
        Ok(ToolOutput::with_data(json!({
            "variable": p.variable,
            "value": value,
            "source": source,
        })))
    }
}
