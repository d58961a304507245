use clap::Parser;
use scaffold_exec::{EngineConfig, RecipeEngine};
use tracing_subscriber::EnvFilter;

mod args;
mod cmd;
mod commands;
mod exit_codes;
mod output;

pub use args::*;
use commands::Command;

/// Overrides `-v` when set, e.g. `SCAFFOLD_LOG=scaffold_exec=debug`.
const LOG_ENV: &str = "SCAFFOLD_LOG";

#[derive(Debug, Parser)]
#[command(name = "scaffold", version, about = "Recipe-driven project scaffolding")]
struct Cli {
    #[command(flatten)]
    output: OutputArgs,
    #[command(subcommand)]
    command: Command,
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.output.verbose);

    let rt = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("error: failed to create tokio runtime: {e}");
            std::process::exit(exit_codes::RUNTIME_ERROR);
        }
    };

    let exit_code = rt.block_on(run_command(cli.command, cli.output));
    std::process::exit(exit_code);
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(verbose >= 2)
        .init();
}

async fn run_command(command: Command, output: OutputArgs) -> i32 {
    let engine = RecipeEngine::new(EngineConfig::default());
    match command {
        Command::Run(args) => cmd::run::run_cmd(engine, args, &output).await,
        Command::Validate {
            recipe,
            project_root,
        } => cmd::validate::validate_cmd(&engine, &recipe, &project_root, &output).await,
        Command::List { dir } => cmd::list::list_cmd(&engine, &dir, &output),
        Command::Info {
            recipe,
            project_root,
        } => cmd::info::info_cmd(&engine, &recipe, &project_root, &output).await,
    }
}
