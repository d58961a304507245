use scaffold_core::types::AiOutput;
use serde_json::json;

use crate::executor::StepContext;
use crate::tool::{ResourceScope, ToolError, ToolOutput};
use crate::tools::fs::write_atomic;
use crate::transformer::{inject, TransformError};

/// Deliver one answer to its output target. `None` stores it under the key.
pub async fn route_answer(
    key: &str,
    text: &str,
    output: Option<&AiOutput>,
    ctx: &StepContext,
    scope: &ResourceScope,
) -> Result<ToolOutput, ToolError> {
    match output {
        None => {
            ctx.set_variable(key, json!(text));
            Ok(ToolOutput::with_data(json!({ "key": key, "variable": key })))
        }
        Some(AiOutput::Variable { variable }) => {
            ctx.set_variable(variable.clone(), json!(text));
            Ok(ToolOutput::with_data(json!({ "key": key, "variable": variable })))
        }
        Some(AiOutput::Stdout) => {
            ctx.services.ai.write_stdout(key, text);
            Ok(ToolOutput::with_data(json!({ "key": key, "stdout": true })))
        }
        Some(AiOutput::File { path }) => {
            let target = ctx.resolve_path(&ctx.interpolate(path)?);
            let shown = ctx.display_path(&target);
            let existed = target.exists();
            if existed && !ctx.flags.force {
                return Err(ToolError::execution(format!(
                    "{shown} already exists (use force to overwrite)"
                )));
            }
            if ctx.flags.dry_run {
                return Ok(ToolOutput::with_data(json!({ "key": key, "path": shown, "dryRun": true })));
            }
            write_atomic(&target, text, scope).await?;
            let out = ToolOutput::with_data(json!({ "key": key, "path": shown }));
            Ok(if existed { out.modified(shown) } else { out.created(shown) })
        }
        Some(AiOutput::Inject {
            path,
            anchor,
            position,
        }) => {
            let target = ctx.resolve_path(&ctx.interpolate(path)?);
            let shown = ctx.display_path(&target);
            let current = tokio::fs::read_to_string(&target).await.map_err(|e| {
                ToolError::resolution(format!("cannot inject into {shown}: {e}"))
            })?;
            if !text.trim().is_empty() && current.contains(text.trim()) {
                return Ok(ToolOutput::skipped(format!("answer already present in {shown}")));
            }
            let updated = inject(&current, text, anchor.as_deref(), *position).map_err(|e| match e {
                TransformError::AnchorNotFound(a) => {
                    ToolError::execution(format!("anchor '{a}' not found in {shown}"))
                }
                other => ToolError::invalid_parameter(other.to_string()),
            })?;
            if ctx.flags.dry_run {
                return Ok(ToolOutput::with_data(json!({ "key": key, "path": shown, "dryRun": true })));
            }
            write_atomic(&target, &updated, scope).await?;
            Ok(ToolOutput::with_data(json!({ "key": key, "path": shown })).modified(shown))
        }
    }
}
