#![forbid(unsafe_code)]

pub mod error;
pub mod expressions;
pub mod parser;
pub mod planner;
pub mod types;
pub mod validate;
pub mod variables;

pub use crate::error::{ParseError, ValidationError, Violation};
pub use crate::parser::{infer_tool, parse_recipe_str, recipe_from_value, DocumentFormat, ParsedRecipe};
pub use crate::planner::{
    format_cycle, plan_from_str, plan_recipe, plan_steps, DependencyGraph, ExecutionPlan,
    PlanError, PlanFormat, PlannedStep, PlanningOutcome, ValidationSummary,
};
pub use crate::types::{Recipe, Step, StepKind, ToolType};
pub use crate::validate::{validate_recipe, validate_step, Validate};
