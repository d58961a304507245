//! Built-in tools, one per step kind.

mod action;
mod ai;
mod directory;
pub(crate) mod fs;
mod group;
mod install;
mod process;
mod prompt;
mod query;
mod recipe;
mod shell;
mod template;
mod transform;

use std::sync::Arc;

use scaffold_core::types::ToolType;
use serde_json::Value;

use crate::registry::{ToolFactory, ToolMetadata};
use crate::tool::{Tool, ToolError};

pub use action::ActionTool;
pub use ai::{placeholder, AiTool, AWAITING_ANSWER};
pub use directory::DirectoryTool;
pub use group::GroupTool;
pub use install::{detect_manager, install_command, InstallTool};
pub use prompt::PromptTool;
pub use query::QueryTool;
pub use recipe::RecipeTool;
pub use shell::ShellTool;
pub use template::TemplateTool;
pub use transform::TransformTool;

fn factory<F>(make: F) -> ToolFactory
where
    F: Fn() -> Box<dyn Tool> + Send + Sync + 'static,
{
    Arc::new(move |_options: &Value| -> Result<Box<dyn Tool>, ToolError> { Ok(make()) })
}

/// Registrations for every built-in tool type.
pub fn builtin_registrations() -> Vec<(ToolType, ToolMetadata, ToolFactory)> {
    vec![
        (
            ToolType::Template,
            ToolMetadata::new("render a template to a file").tag("filesystem"),
            factory(|| Box::new(TemplateTool)),
        ),
        (
            ToolType::Action,
            ToolMetadata::new("run a registered action"),
            factory(|| Box::new(ActionTool)),
        ),
        (
            ToolType::Transform,
            ToolMetadata::new("edit existing files in place").tag("filesystem"),
            factory(|| Box::new(TransformTool)),
        ),
        (
            ToolType::Recipe,
            ToolMetadata::new("run another recipe").tag("composition"),
            factory(|| Box::new(RecipeTool)),
        ),
        (
            ToolType::Shell,
            ToolMetadata::new("run a shell command").tag("process"),
            factory(|| Box::new(ShellTool)),
        ),
        (
            ToolType::Query,
            ToolMetadata::new("check and patch JSON or YAML documents").tag("filesystem"),
            factory(|| Box::new(QueryTool)),
        ),
        (
            ToolType::Directory,
            ToolMetadata::new("create directories").tag("filesystem"),
            factory(|| Box::new(DirectoryTool)),
        ),
        (
            ToolType::Install,
            ToolMetadata::new("install packages").tag("process"),
            factory(|| Box::new(InstallTool)),
        ),
        (
            ToolType::Prompt,
            ToolMetadata::new("ask for a variable").tag("interactive"),
            factory(|| Box::new(PromptTool)),
        ),
        (
            ToolType::Ai,
            ToolMetadata::new("collect prompts or apply generated answers").tag("ai"),
            factory(|| Box::new(AiTool)),
        ),
        (
            ToolType::Sequence,
            ToolMetadata::new("run nested steps in order").tag("composition"),
            factory(|| Box::new(GroupTool::sequence())),
        ),
        (
            ToolType::Parallel,
            ToolMetadata::new("run nested steps concurrently").tag("composition"),
            factory(|| Box::new(GroupTool::parallel())),
        ),
    ]
    .into_iter()
    .map(|(t, meta, f)| (t, meta.builtin(), f))
    .collect()
}
