use scaffold_core::types::{RecipeStep, Variables};

use crate::executor::StepContext;
use crate::tool::ToolError;

/// Variables handed to a sub-recipe.
///
/// Start from the parent's values when `inherit` is set, copy renamed parent
/// values per `variableMapping`, then apply the interpolated overrides.
pub fn build_sub_variables(step: &RecipeStep, ctx: &StepContext) -> Result<Variables, ToolError> {
    let parent = ctx.variables();
    let mut vars = if step.inherit {
        parent.clone()
    } else {
        Variables::new()
    };
    for (from, to) in &step.variable_mapping {
        if let Some(v) = parent.get(from) {
            vars.insert(to.clone(), v.clone());
        }
    }
    for (name, value) in &step.variables {
        vars.insert(name.clone(), ctx.interpolate_value(value)?);
    }
    Ok(vars)
}
