use std::path::Path;

use scaffold_exec::RecipeEngine;

use crate::exit_codes;
use crate::output::{print_engine_error, print_result, OutputFormat};
use crate::OutputArgs;

pub fn list_cmd(engine: &RecipeEngine, dir: &Path, output: &OutputArgs) -> i32 {
    let recipes = match engine.list(dir) {
        Ok(r) => r,
        Err(e) => {
            print_engine_error(output.format, output.quiet, &e);
            return exit_codes::for_error(&e);
        }
    };

    if output.format == OutputFormat::Text && !output.quiet {
        if recipes.is_empty() {
            println!("No recipes in {}", dir.display());
        }
        for r in &recipes {
            println!("{} ({} steps)  {}", r.name, r.steps, r.path.display());
            if let Some(d) = &r.description {
                println!("    {d}");
            }
        }
    } else {
        print_result(output.format, output.quiet, &serde_json::json!({ "recipes": recipes }));
    }
    exit_codes::SUCCESS
}
