use std::path::Path;

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

/// Lock files that identify a project's package manager, checked in order.
const LOCK_FILES: &[(&str, &str)] = &[
    ("pnpm-lock.yaml", "pnpm"),
    ("yarn.lock", "yarn"),
    ("package-lock.json", "npm"),
    ("Cargo.toml", "cargo"),
    ("requirements.txt", "pip"),
    ("package.json", "npm"),
];

pub fn detect_manager(dir: &Path) -> Option<&'static str> {
    LOCK_FILES
        .iter()
        .find(|(file, _)| dir.join(file).is_file())
        .map(|(_, manager)| *manager)
}

/// Program and arguments installing `packages` with `manager`.
pub fn install_command(manager: &str, packages: &[String], dev: bool) -> Option<(String, Vec<String>)> {
    let mut args: Vec<String> = match manager {
        "npm" => vec!["install".into(), if dev { "--save-dev" } else { "--save" }.into()],
        "yarn" | "pnpm" => {
            let mut a = vec!["add".to_string()];
            if dev {
                a.push("-D".into());
            }
            a
        }
        "cargo" => {
            let mut a = vec!["add".to_string()];
            if dev {
                a.push("--dev".into());
            }
            a
        }
        "pip" => vec!["install".into()],
        _ => return None,
    };
    args.extend(packages.iter().cloned());
    Some((manager.to_string(), args))
}

#[derive(Debug, Default)]
pub struct InstallTool;

#[async_trait]
impl Tool for InstallTool {
    fn tool_type(&self) -> ToolType {
        ToolType::Install
    }

    fn validate(&self, step: &Step, ctx: &StepContext) -> ToolValidation {
        let mut v = validate_shape(ToolType::Install, step).with_requirements(ResourceRequirements {
            subprocess: true,
            network: true,
            filesystem: true,
            ..Default::default()
        });
        if let StepKind::Install(i) = &step.kind {
            match i.manager.as_deref() {
                Some(m) if install_command(m, &[], false).is_none() => {
                    v.error(format!("unsupported package manager '{m}'"));
                }
                None if detect_manager(&ctx.working_dir).is_none() => {
                    v.warn("no package manager detected in the working directory");
                }
                _ => {}
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
        let StepKind::Install(i) = &step.kind else {
            return Err(ToolError::configuration("not an install step"));
        };
        let manager = match &i.manager {
            Some(m) => ctx.interpolate(m)?,
            None => detect_manager(&ctx.working_dir)
                .ok_or_else(|| ToolError::configuration("cannot detect a package manager; set `manager`"))?
                .to_string(),
        };
        let packages = i
            .packages
            .iter()
            .map(|p| ctx.interpolate(p))
            .collect::<Result<Vec<_>, _>>()?;
        let (program, args) = install_command(&manager, &packages, i.dev)
            .ok_or_else(|| ToolError::configuration(format!("unsupported package manager '{manager}'")))?;
        let display = format!("{program} {}", args.join(" "));

        let data = json!({ "manager": manager, "packages": packages, "dev": i.dev, "command": display });
        if ctx.flags.dry_run {
            let mut data = data;
            data["dryRun"] = json!(true);
            return Ok(ToolOutput::with_data(data));
        }

        let mut cmd = Command::new(&program);
        cmd.args(&args).current_dir(&ctx.working_dir);
        process::run(cmd, &display, ctx).await?;
        Ok(ToolOutput::with_data(data))
    }
}
