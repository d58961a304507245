//! The lifecycle contract every step kind implements.

mod error;
mod instance;
mod metrics;
mod resources;
mod validation;

use async_trait::async_trait;
use scaffold_core::types::{Step, ToolType};

use crate::executor::StepContext;

pub use error::{ToolError, ToolErrorKind};
pub use instance::{ExecuteOptions, ToolInstance};
pub use metrics::ToolMetrics;
pub use resources::ResourceScope;
pub use validation::{ResourceRequirements, ToolValidation};

/// What a tool reports back from one successful execution.
#[derive(Debug, Clone, Default)]
pub struct ToolOutput {
    pub data: serde_json::Value,
    pub files_created: Vec<String>,
    pub files_modified: Vec<String>,
    pub files_deleted: Vec<String>,
    /// Set when the tool deliberately did nothing (guard hit, answer absent...).
    pub skipped: Option<String>,
}

impl ToolOutput {
    pub fn with_data(data: serde_json::Value) -> Self {
        Self {
            data,
            ..Default::default()
        }
    }

    pub fn skipped(reason: impl Into<String>) -> Self {
        Self {
            skipped: Some(reason.into()),
            ..Default::default()
        }
    }

    pub fn created(mut self, path: impl Into<String>) -> Self {
        self.files_created.push(path.into());
        self
    }

    pub fn modified(mut self, path: impl Into<String>) -> Self {
        self.files_modified.push(path.into());
        self
    }
}

#[async_trait]
pub trait Tool: Send + Sync {
    fn tool_type(&self) -> ToolType;

    /// One-time setup, run lazily before the first execution.
    /// Resources registered on `resources` live until the instance is cleaned up.
    async fn initialize(&self, _resources: &ResourceScope) -> Result<(), ToolError> {
        Ok(())
    }

    /// Pure check of a step against this tool. Must not touch the context.
    fn validate(&self, step: &Step, _ctx: &StepContext) -> ToolValidation {
        validate_shape(self.tool_type(), step)
    }

    /// Perform the side effect. Per-attempt resources go on `scope`, which is
    /// always cleaned up when the attempt ends.
    async fn execute(
        &self,
        step: &Step,
        ctx: &StepContext,
        scope: &ResourceScope,
    ) -> Result<ToolOutput, ToolError>;

    async fn cleanup(&self) -> Result<(), ToolError> {
        Ok(())
    }
}

/// Shared shape check: the step's tool must match and its fields must be well formed.
pub fn validate_shape(expected: ToolType, step: &Step) -> ToolValidation {
    let mut v = ToolValidation::ok();
    if step.tool_type() != expected {
        v.error(format!(
            "step '{}' is a {} step, not {expected}",
            step.name,
            step.tool_type()
        ));
        return v;
    }
    if let Err(e) = scaffold_core::validate_step(step) {
        for msg in e.messages() {
            v.error(msg);
        }
    }
    v
}
