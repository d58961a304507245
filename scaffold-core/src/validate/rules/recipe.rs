use crate::types::Recipe;
use crate::validate::rules::step;
use crate::validate::validator::{Validator, VARIABLE_NAME_RE};
use crate::variables::check_spec;

pub(crate) fn validate_recipe(v: &mut Validator, recipe: &Recipe) {
    v.require_non_empty("name", &recipe.name);

    if recipe.steps.is_empty() {
        v.push("steps", "must have at least one entry");
    }

    for (name, spec) in &recipe.variables {
        if !VARIABLE_NAME_RE.is_match(name) {
            v.push(
                format!("variables.{name}"),
                "variable name must match regex ^[A-Za-z_][A-Za-z0-9_]*$",
            );
        }
        if name == crate::planner::STEPS_SCOPE {
            v.push(
                format!("variables.{name}"),
                "'steps' is reserved for step outcomes in expressions",
            );
        }
        v.extend(check_spec(name, spec));
    }

    if let Some(settings) = &recipe.settings {
        if settings.max_parallel_steps == Some(0) {
            v.push("settings.maxParallelSteps", "must be at least 1");
        }
        if settings.timeout == Some(0) {
            v.push("settings.timeout", "must be greater than 0");
        }
        if let Some(dir) = &settings.working_dir {
            v.require_non_empty("settings.workingDir", dir);
        }
    }

    step::validate_step_list(v, &recipe.steps, "steps");
}
