use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;

use async_trait::async_trait;
use scaffold_core::types::{Step, StepKind, ToolType};
use serde_json::json;

use crate::executor::StepContext;
use crate::tool::{
    validate_shape, ResourceRequirements, ResourceScope, Tool, ToolError, ToolOutput,
    ToolValidation,
};
use crate::tools::fs::write_atomic;
use crate::transformer::TransformError;

/// Rewrites every file matched by the step's globs.
#[derive(Debug, Default)]
pub struct TransformTool;

#[async_trait]
impl Tool for TransformTool {
    fn tool_type(&self) -> ToolType {
        ToolType::Transform
    }

    fn validate(&self, step: &Step, _ctx: &StepContext) -> ToolValidation {
        validate_shape(ToolType::Transform, step).with_requirements(ResourceRequirements {
            filesystem: true,
            ..Default::default()
        })
    }

    async fn execute(
        &self,
        step: &Step,
        ctx: &StepContext,
        scope: &ResourceScope,
    ) -> Result<ToolOutput, ToolError> {
        let StepKind::Transform(t) = &step.kind else {
            return Err(ToolError::configuration("not a transform step"));
        };
        let kind = t
            .kind()
            .ok_or_else(|| ToolError::configuration(format!("unknown transform '{}'", t.transform)))?;

        let mut files: BTreeSet<PathBuf> = BTreeSet::new();
        for pattern in &t.files {
            let pattern = ctx.interpolate(pattern)?;
            let full = ctx.resolve_path(&pattern);
            let matches = glob::glob(&full.to_string_lossy())
                .map_err(|e| ToolError::syntax(format!("invalid glob '{pattern}': {e}")))?;
            files.extend(matches.filter_map(Result::ok).filter(|p| p.is_file()));
        }
        if files.is_empty() {
            return Err(ToolError::resolution(format!(
                "no files match {}",
                t.files.join(", ")
            )));
        }

        let mut parameters = BTreeMap::new();
        for (k, v) in &t.parameters {
            parameters.insert(k.clone(), ctx.interpolate_value(v)?);
        }

        let mut matched = Vec::new();
        let mut changed = Vec::new();
        for path in &files {
            let shown = ctx.display_path(path);
            let content = tokio::fs::read_to_string(path).await?;
            let updated = ctx
                .services
                .transformer
                .transform(kind, &content, &parameters)
                .map_err(|e| transform_error(&shown, e))?;
            if updated != content {
                if !ctx.flags.dry_run {
                    write_atomic(path, &updated, scope).await?;
                }
                changed.push(shown.clone());
            }
            matched.push(shown);
        }

        let mut out = ToolOutput::with_data(json!({
            "transform": kind.as_str(),
            "files": matched,
            "changed": changed,
            "dryRun": ctx.flags.dry_run,
        }));
        if !ctx.flags.dry_run {
            out.files_modified = changed;
        }
        Ok(out)
    }
}

fn transform_error(file: &str, e: TransformError) -> ToolError {
    let message = format!("{file}: {e}");
    match e {
        TransformError::Pattern(_) => ToolError::syntax(message),
        TransformError::AnchorNotFound(_) => ToolError::execution(message),
        TransformError::MissingParameter(_) | TransformError::Position(_) => {
            ToolError::invalid_parameter(message)
        }
    }
}
