use async_trait::async_trait;
use scaffold_core::types::{Step, StepKind, ToolType};
use serde_json::json;

use crate::executor::StepContext;
use crate::tool::{
    validate_shape, ResourceRequirements, ResourceScope, Tool, ToolError, ToolOutput,
    ToolValidation,
};

#[derive(Debug, Default)]
pub struct DirectoryTool;

#[async_trait]
impl Tool for DirectoryTool {
    fn tool_type(&self) -> ToolType {
        ToolType::Directory
    }

    fn validate(&self, step: &Step, _ctx: &StepContext) -> ToolValidation {
        validate_shape(ToolType::Directory, step).with_requirements(ResourceRequirements {
            filesystem: true,
            ..Default::default()
        })
    }

    async fn execute(
        &self,
        step: &Step,
        ctx: &StepContext,
        _scope: &ResourceScope,
    ) -> Result<ToolOutput, ToolError> {
        let StepKind::Directory(d) = &step.kind else {
            return Err(ToolError::configuration("not a directory step"));
        };

        let mut created = Vec::new();
        let mut existing = Vec::new();
        for dir in &d.directories {
            let path = ctx.resolve_path(&ctx.interpolate(dir)?);
            let shown = ctx.display_path(&path);
            match tokio::fs::metadata(&path).await {
                Ok(meta) if meta.is_dir() => existing.push(shown),
                Ok(_) => {
                    return Err(ToolError::execution(format!(
                        "{shown} exists and is not a directory"
                    )))
                }
                Err(_) => {
                    if !ctx.flags.dry_run {
                        tokio::fs::create_dir_all(&path).await?;
                    }
                    created.push(shown);
                }
            }
        }

        let mut out = ToolOutput::with_data(json!({
            "created": created,
            "existing": existing,
            "dryRun": ctx.flags.dry_run,
        }));
        if !ctx.flags.dry_run {
            out.files_created = created;
        }
        Ok(out)
    }
}
