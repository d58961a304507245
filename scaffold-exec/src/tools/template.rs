use std::path::PathBuf;

use async_trait::async_trait;
use scaffold_core::types::{Step, StepKind, ToolType};
use serde_json::{json, Value};

use crate::executor::StepContext;
use crate::tool::{
    validate_shape, ResourceRequirements, ResourceScope, Tool, ToolError, ToolOutput,
    ToolValidation,
};
use crate::tools::fs::write_atomic;

/// Renders a template file (or inline content) to an output path.
#[derive(Debug, Default)]
pub struct TemplateTool;

#[async_trait]
impl Tool for TemplateTool {
    fn tool_type(&self) -> ToolType {
        ToolType::Template
    }

    fn validate(&self, step: &Step, ctx: &StepContext) -> ToolValidation {
        let mut v = validate_shape(ToolType::Template, step).with_requirements(ResourceRequirements {
            filesystem: true,
            ..Default::default()
        });
        if let StepKind::Template(t) = &step.kind {
            if let Some(file) = t.template.as_deref().filter(|f| !f.contains("{{")) {
                if locate(ctx, file).is_none() {
                    v.warn(format!("template '{file}' does not exist yet"));
                }
            }
            if t.unless_exists && ctx.flags.force {
                v.suggest("`unlessExists` is ignored because the run is forced");
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
        let StepKind::Template(t) = &step.kind else {
            return Err(ToolError::configuration("not a template step"));
        };

        let output = ctx.resolve_path(&ctx.interpolate(&t.output)?);
        let shown = ctx.display_path(&output);
        let exists = tokio::fs::try_exists(&output).await.unwrap_or(false);
        if exists && t.unless_exists && !ctx.flags.force {
            return Ok(ToolOutput::skipped(format!("{shown} already exists")));
        }

        let (name, source) = match (&t.template, &t.content) {
            (Some(file), _) => {
                let file = ctx.interpolate(file)?;
                let path = locate(ctx, &file)
                    .ok_or_else(|| ToolError::resolution(format!("template '{file}' not found")))?;
                let source = tokio::fs::read_to_string(&path).await.map_err(|e| {
                    ToolError::resolution(format!("cannot read template {}: {e}", path.display()))
                })?;
                (file, source)
            }
            (None, Some(content)) => (format!("{}.inline", step.name), content.clone()),
            (None, None) => return Err(ToolError::configuration("template step needs `template` or `content`")),
        };

        let mut scope_vars = ctx.expression_scope();
        if let Value::Object(map) = &mut scope_vars {
            for (k, v) in &t.variables {
                map.insert(k.clone(), ctx.interpolate_value(v)?);
            }
        }
        let rendered = ctx
            .services
            .templates
            .render(&name, &source, &scope_vars)
            .map_err(|e| ToolError::syntax(e.to_string()))?;

        if exists {
            if let Ok(current) = tokio::fs::read_to_string(&output).await {
                if current == rendered {
                    return Ok(ToolOutput::skipped(format!("{shown} is up to date")));
                }
            }
        }

        let data = json!({ "output": shown, "template": name, "bytes": rendered.len() });
        if ctx.flags.dry_run {
            let mut data = data;
            data["dryRun"] = json!(true);
            return Ok(ToolOutput::with_data(data));
        }

        write_atomic(&output, &rendered, scope).await?;
        let out = ToolOutput::with_data(data);
        Ok(if exists { out.modified(shown) } else { out.created(shown) })
    }
}

/// Template files resolve against the recipe directory, then the project root.
fn locate(ctx: &StepContext, file: &str) -> Option<PathBuf> {
    [ctx.source_dir().join(file), ctx.project_root.join(file)]
        .into_iter()
        .find(|p| p.is_file())
}
