#![forbid(unsafe_code)]

//! Runtime for scaffold recipes.
//!
//! Parsing, validation and planning live in `scaffold-core`; this crate runs
//! steps through pluggable tools, composes recipes and drives the two-pass AI
//! protocol.

pub mod actions;
pub mod ai;
pub mod composition;
pub mod engine;
pub mod executor;
pub mod interaction;
pub mod registry;
pub mod retry;
pub mod templating;
pub mod tool;
pub mod tools;
pub mod transformer;

pub use crate::engine::{
    EngineConfig, EngineError, ExecutionReport, LoadedRecipe, RecipeEngine, RunOptions,
};
pub use crate::executor::{RunStatus, StepExecutor, StepResult, StepStatus};
pub use crate::registry::ToolRegistry;
pub use crate::tool::{Tool, ToolError, ToolErrorKind, ToolOutput};
