use async_trait::async_trait;
use scaffold_core::types::{AiOutput, Step, StepKind, ToolType};
use serde_json::{json, Value};

use crate::ai::{route_answer, ManifestEntry};
use crate::executor::StepContext;
use crate::tool::{validate_shape, ResourceScope, Tool, ToolError, ToolOutput, ToolValidation};

pub const AWAITING_ANSWER: &str = "awaiting external answer";

/// Stand-in value a collect pass stores for variable targets, so later
/// dry-run steps can still render.
pub fn placeholder(key: &str) -> String {
    format!("<ai:{key}>")
}

/// Two-pass AI step: records its prompt in collect mode, routes the
/// supplied answer in apply mode. Never calls a model itself.
#[derive(Debug, Default)]
pub struct AiTool;

fn answer_key(step: &Step) -> String {
    match &step.kind {
        StepKind::Ai(a) => a.key.clone().unwrap_or_else(|| step.name.clone()),
        _ => step.name.clone(),
    }
}

#[async_trait]
impl Tool for AiTool {
    fn tool_type(&self) -> ToolType {
        ToolType::Ai
    }

    fn validate(&self, step: &Step, ctx: &StepContext) -> ToolValidation {
        let mut v = validate_shape(ToolType::Ai, step);
        if let StepKind::Ai(a) = &step.kind {
            let key = answer_key(step);
            if !ctx.services.ai.is_collect() && a.required && ctx.services.ai.answer(&key).is_none() {
                v.warn(format!("no answer supplied for '{key}'"));
            }
        }
        v
    }

    async fn execute(
        &self,
        step: &Step,
        ctx: &StepContext,
        scope: &ResourceScope,
    ) -> Result<ToolOutput, ToolError> {
        let StepKind::Ai(a) = &step.kind else {
            return Err(ToolError::configuration("not an ai step"));
        };
        let key = answer_key(step);
        let session = &ctx.services.ai;

        if session.is_collect() {
            let prompt = ctx.interpolate(&a.prompt)?;
            let context = a
                .context
                .as_ref()
                .map(|c| ctx.interpolate_value(c))
                .transpose()?
                .unwrap_or(Value::Null);
            session.record(ManifestEntry {
                key: key.clone(),
                prompt,
                context,
                constraints: a.constraints.clone(),
                step: step.name.clone(),
                recipe: ctx.recipe_name.clone(),
                output: a.output.clone(),
            });
            match &a.output {
                None => ctx.set_variable(key.clone(), json!(placeholder(&key))),
                Some(AiOutput::Variable { variable }) => {
                    ctx.set_variable(variable.clone(), json!(placeholder(&key)))
                }
                Some(_) => {}
            }
            let mut out = ToolOutput::skipped(AWAITING_ANSWER);
            out.data = json!({ "key": key, "collected": true });
            return Ok(out);
        }

        match session.answer(&key) {
            Some(text) => {
                let text = text.to_string();
                route_answer(&key, &text, a.output.as_ref(), ctx, scope).await
            }
            None if a.required => Err(ToolError::invalid_parameter(format!(
                "no answer supplied for required key '{key}'"
            ))),
            None => Ok(ToolOutput::skipped(format!("no answer for optional key '{key}'"))),
        }
    }
}
