use std::path::PathBuf;

use clap::Subcommand;

use crate::args::RunArgs;

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Execute a recipe.
    Run(RunArgs),
    /// Check a recipe for structural and dependency errors.
    Validate {
        recipe: String,
        #[arg(long, value_name = "DIR", default_value = ".")]
        project_root: PathBuf,
    },
    /// List recipes found under a directory.
    List {
        #[arg(default_value = ".")]
        dir: PathBuf,
    },
    /// Show variables, steps and the execution plan of a recipe.
    Info {
        recipe: String,
        #[arg(long, value_name = "DIR", default_value = ".")]
        project_root: PathBuf,
    },
}
