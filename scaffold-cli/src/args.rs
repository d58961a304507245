use std::path::PathBuf;

use clap::Args;

use crate::output::OutputFormat;

#[derive(Debug, Args, Clone)]
pub struct OutputArgs {
    #[arg(long, value_enum, default_value_t = OutputFormat::Text, global = true)]
    pub format: OutputFormat,
    #[arg(long, short, global = true)]
    pub quiet: bool,
    /// Repeat for more log output (-v info, -vv debug, -vvv trace).
    #[arg(long, short, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,
}

#[derive(Debug, Args, Clone)]
pub struct RunArgs {
    /// Recipe file, package name, `github:` reference or URL.
    pub recipe: String,
    #[arg(long = "var", value_name = "KEY=VALUE")]
    pub vars: Vec<String>,
    #[arg(long)]
    pub skip_prompts: bool,
    #[arg(long)]
    pub dry_run: bool,
    /// Overwrite files that already exist.
    #[arg(long)]
    pub force: bool,
    /// Answers document (JSON or YAML) for the apply pass of AI steps.
    #[arg(long, value_name = "PATH")]
    pub answers: Option<PathBuf>,
    /// Write the prompt manifest here instead of stdout.
    #[arg(long, value_name = "PATH")]
    pub manifest_out: Option<PathBuf>,
    #[arg(long)]
    pub continue_on_error: bool,
    #[arg(long, value_name = "N")]
    pub max_parallel: Option<usize>,
    #[arg(long, value_name = "DIR", default_value = ".")]
    pub project_root: PathBuf,
}
