mod common;
mod recipe;
mod step;
mod tools;
mod variable;

pub use common::{AnyValue, Variables};
pub use recipe::{Recipe, RecipeSettings};
pub use step::{Step, StepKind, ToolType};
pub use tools::{
    ActionStep, AiOutput, AiStep, DirectoryStep, GroupStep, InjectPosition, InstallStep,
    PatchOp, PromptStep, PromptType, QueryCheck, QueryPatch, QueryStep, RecipeStep, ShellStep,
    TemplateStep, TransformKind, TransformStep,
};
pub use variable::{VariableSpec, VariableType};
