use async_trait::async_trait;
use scaffold_core::types::{Step, StepKind, ToolType};
use serde_json::json;
use tokio::process::Command;

use crate::executor::StepContext;
use crate::tool::{
    validate_shape, ResourceRequirements, ResourceScope, Tool, ToolError, ToolOutput,
    ToolValidation,
};
use crate::tools::process;

const DEFAULT_SHELL: &str = "sh";

#[derive(Debug, Default)]
pub struct ShellTool;

#[async_trait]
impl Tool for ShellTool {
    fn tool_type(&self) -> ToolType {
        ToolType::Shell
    }

    fn validate(&self, step: &Step, _ctx: &StepContext) -> ToolValidation {
        let mut v = validate_shape(ToolType::Shell, step).with_requirements(ResourceRequirements {
            subprocess: true,
            filesystem: true,
            ..Default::default()
        });
        if let StepKind::Shell(s) = &step.kind {
            if s.command.trim_start().starts_with("sudo ") {
                v.warn("command runs with elevated privileges");
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
        let StepKind::Shell(s) = &step.kind else {
            return Err(ToolError::configuration("not a shell step"));
        };
        let command = ctx.interpolate(&s.command)?;
        if ctx.flags.dry_run {
            return Ok(ToolOutput::with_data(json!({ "command": command, "dryRun": true })));
        }

        let cwd = match &s.cwd {
            Some(dir) => ctx.resolve_path(&ctx.interpolate(dir)?),
            None => ctx.working_dir.clone(),
        };
        let mut cmd = Command::new(s.shell.as_deref().unwrap_or(DEFAULT_SHELL));
        cmd.arg("-c").arg(&command).current_dir(&cwd);
        for (k, v) in &s.env {
            cmd.env(k, ctx.interpolate(v)?);
        }

        let out = process::run(cmd, &command, ctx).await?;
        if let Some(var) = &s.capture_as {
            ctx.set_variable(var.clone(), json!(out.stdout.trim()));
        }
        Ok(ToolOutput::with_data(json!({
            "command": command,
            "exitCode": out.code,
            "stdout": out.stdout,
            "stderr": out.stderr,
        })))
    }
}
