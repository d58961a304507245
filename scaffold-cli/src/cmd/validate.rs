use std::path::Path;

use scaffold_exec::RecipeEngine;
use serde::Serialize;

use crate::exit_codes;
use crate::output::{error_details, print_engine_error, print_result, OutputFormat};
use crate::OutputArgs;

#[derive(Serialize)]
struct ValidateResult {
    valid: bool,
    recipe: String,
    location: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    errors: Vec<String>,
}

pub async fn validate_cmd(
    engine: &RecipeEngine,
    recipe: &str,
    project_root: &Path,
    output: &OutputArgs,
) -> i32 {
    let loaded = match engine.load(recipe, project_root).await {
        Ok(l) => l,
        Err(e) => {
            print_engine_error(output.format, output.quiet, &e);
            return exit_codes::for_error(&e);
        }
    };

    match engine.validate(&loaded.recipe) {
        Ok(()) => {
            if output.format == OutputFormat::Text && !output.quiet {
                println!(
                    "ok: {} is a valid recipe ({} steps)",
                    loaded.recipe.name,
                    loaded.recipe.steps.len()
                );
            } else {
                print_result(
                    output.format,
                    output.quiet,
                    &ValidateResult {
                        valid: true,
                        recipe: loaded.recipe.name,
                        location: loaded.location,
                        errors: vec![],
                    },
                );
            }
            exit_codes::SUCCESS
        }
        Err(err) => {
            let mut errors = error_details(&err);
            if errors.is_empty() {
                errors.push(err.to_string());
            }
            if output.format == OutputFormat::Text && !output.quiet {
                eprintln!("error: validation failed");
                for e in &errors {
                    eprintln!("- {e}");
                }
            } else {
                print_result(
                    output.format,
                    output.quiet,
                    &ValidateResult {
                        valid: false,
                        recipe: loaded.recipe.name,
                        location: loaded.location,
                        errors,
                    },
                );
            }
            exit_codes::for_error(&err)
        }
    }
}
