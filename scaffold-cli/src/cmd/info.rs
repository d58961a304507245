use std::path::Path;

use scaffold_core::planner::render_plan_text;
use scaffold_exec::engine::RecipeInfo;
use scaffold_exec::RecipeEngine;

use crate::exit_codes;
use crate::output::{print_engine_error, print_result, OutputFormat};
use crate::OutputArgs;

pub async fn info_cmd(
    engine: &RecipeEngine,
    recipe: &str,
    project_root: &Path,
    output: &OutputArgs,
) -> i32 {
    let info = match engine.load(recipe, project_root).await.and_then(|l| engine.info(&l)) {
        Ok(i) => i,
        Err(e) => {
            print_engine_error(output.format, output.quiet, &e);
            return exit_codes::for_error(&e);
        }
    };

    if output.format == OutputFormat::Text && !output.quiet {
        print_text(&info);
    } else {
        print_result(output.format, output.quiet, &info);
    }

    if info.validation.is_valid {
        exit_codes::SUCCESS
    } else {
        exit_codes::VALIDATION_FAILED
    }
}

fn print_text(info: &RecipeInfo) {
    match &info.version {
        Some(v) => println!("{} {v}", info.name),
        None => println!("{}", info.name),
    }
    if let Some(d) = &info.description {
        println!("{d}");
    }
    println!("location: {}", info.location);
    if info.contains_ai_steps {
        println!("contains AI steps: answers are collected before anything is written");
    }

    if !info.variables.is_empty() {
        println!("\nVariables:");
        for v in &info.variables {
            let required = if v.required { " (required)" } else { "" };
            let default = v
                .default
                .as_ref()
                .map(|d| format!(" = {d}"))
                .unwrap_or_default();
            println!("  {}: {}{required}{default}", v.name, v.var_type);
            if let Some(d) = &v.description {
                println!("      {d}");
            }
        }
    }

    match &info.plan {
        Some(plan) => print!("\n{}", render_plan_text(plan)),
        None => {
            println!("\nSteps:");
            for s in &info.steps {
                println!("  {} [{}]", s.name, s.tool);
            }
        }
    }

    for w in &info.validation.warnings {
        println!("warning: {w}");
    }
    for e in &info.validation.errors {
        eprintln!("error: {e}");
    }
}
