use scaffold_core::types::{Recipe, Variables};
use scaffold_core::variables::{check_value, coerce_value};
use scaffold_core::{ValidationError, Violation};
use serde_json::Value;

use crate::interaction::{PromptRequest, Prompter};

/// Resolve a recipe's declared variables.
///
/// Override, then declared default, then (when `interactive`) a prompt for
/// required values. Every problem is collected; undeclared overrides pass
/// through unchanged.
pub async fn resolve_variables(
    recipe: &Recipe,
    mut provided: Variables,
    prompter: &dyn Prompter,
    interactive: bool,
) -> Result<Variables, ValidationError> {
    let mut resolved = Variables::new();
    let mut violations = Vec::new();

    for (name, spec) in &recipe.variables {
        let path = format!("variables.{name}");
        let candidate = match provided.remove(name).filter(|v| !v.is_null()) {
            Some(v) => Some(v),
            None => spec.default.clone(),
        };

        let value = match candidate {
            Some(v) => v,
            None if !spec.required => continue,
            None if interactive => {
                let message = spec
                    .prompt
                    .clone()
                    .or_else(|| spec.description.clone())
                    .unwrap_or_else(|| name.clone());
                match prompter.ask(&PromptRequest::input(name.clone(), message)).await {
                    Ok(v) => v,
                    Err(e) => {
                        violations.push(Violation::new(path, e.to_string()));
                        continue;
                    }
                }
            }
            None => {
                violations.push(Violation::new(path, "required variable has no value"));
                continue;
            }
        };

        match coerce_value(spec, value) {
            Ok(v) => {
                let problems = check_value(name, spec, &v);
                if problems.is_empty() {
                    resolved.insert(name.clone(), v);
                } else {
                    violations.extend(problems);
                }
            }
            Err(message) => violations.push(Violation::new(path, message)),
        }
    }

    for (name, value) in provided {
        resolved.entry(name).or_insert(value);
    }

    if violations.is_empty() {
        Ok(resolved)
    } else {
        Err(ValidationError::new(violations))
    }
}

/// Parse `k=v` pairs from the command line into string overrides.
pub fn parse_overrides<'a, I>(pairs: I) -> Result<Variables, String>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut vars = Variables::new();
    for pair in pairs {
        let (k, v) = pair
            .split_once('=')
            .ok_or_else(|| format!("expected key=value, got '{pair}'"))?;
        let k = k.trim();
        if k.is_empty() {
            return Err(format!("empty variable name in '{pair}'"));
        }
        vars.insert(k.to_string(), Value::String(v.to_string()));
    }
    Ok(vars)
}
