use std::sync::Arc;

use scaffold_exec::ai::Answers;
use scaffold_exec::engine::parse_overrides;
use scaffold_exec::executor::TracingEventSink;
use scaffold_exec::interaction::StdinPrompter;
use scaffold_exec::{ExecutionReport, RecipeEngine, RunOptions, RunStatus, StepStatus};
use tokio_util::sync::CancellationToken;
use tracing::warn;

use crate::args::RunArgs;
use crate::exit_codes;
use crate::output::{print_engine_error, print_error, print_result, OutputFormat};
use crate::OutputArgs;

pub async fn run_cmd(engine: RecipeEngine, args: RunArgs, output: &OutputArgs) -> i32 {
    let variables = match parse_overrides(args.vars.iter().map(String::as_str)) {
        Ok(v) => v,
        Err(e) => {
            print_error(output.format, output.quiet, &e);
            return exit_codes::RUNTIME_ERROR;
        }
    };

    let answers = match &args.answers {
        Some(path) => match Answers::load(path) {
            Ok(a) => Some(a),
            Err(e) => {
                print_error(
                    output.format,
                    output.quiet,
                    &format!("failed to load answers {}: {e}", path.display()),
                );
                return exit_codes::RUNTIME_ERROR;
            }
        },
        None => None,
    };

    let mut engine = engine.with_events(Arc::new(TracingEventSink));
    if !args.skip_prompts {
        engine = engine.with_prompter(Arc::new(StdinPrompter::new()));
    }

    let loaded = match engine.load(&args.recipe, &args.project_root).await {
        Ok(l) => l,
        Err(e) => {
            print_engine_error(output.format, output.quiet, &e);
            return exit_codes::for_error(&e);
        }
    };

    let cancel = CancellationToken::new();
    let interrupt = {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("interrupted; finishing in-flight steps");
                cancel.cancel();
            }
        })
    };

    let options = RunOptions {
        variables,
        project_root: args.project_root.clone(),
        dry_run: args.dry_run,
        force: args.force,
        skip_prompts: args.skip_prompts,
        answers,
        echo_stdout: output.format == OutputFormat::Text && !output.quiet,
        continue_on_error: args.continue_on_error,
        max_parallel: args.max_parallel,
        cancel,
    };
    let result = engine.run(&loaded, options).await;
    interrupt.abort();

    let report = match result {
        Ok(r) => r,
        Err(e) => {
            print_engine_error(output.format, output.quiet, &e);
            return exit_codes::for_error(&e);
        }
    };

    if let (Some(manifest), Some(path)) = (&report.manifest, &args.manifest_out) {
        if let Err(e) = manifest.write_to(path) {
            print_error(output.format, output.quiet, &format!("failed to write manifest: {e}"));
            return exit_codes::RUNTIME_ERROR;
        }
    }

    match output.format {
        OutputFormat::Json => print_result(output.format, output.quiet, &report),
        OutputFormat::Text if !output.quiet => print_text(&report, &args),
        OutputFormat::Text => {}
    }
    exit_codes::for_status(report.status)
}

fn print_text(report: &ExecutionReport, args: &RunArgs) {
    for step in &report.steps {
        let detail = match step.status {
            StepStatus::Failed => step
                .error
                .as_ref()
                .map(|e| format!(": {}", e.message))
                .unwrap_or_default(),
            StepStatus::Skipped => step
                .skip_reason
                .as_ref()
                .map(|r| format!(" ({r})"))
                .unwrap_or_default(),
            StepStatus::Completed => String::new(),
        };
        println!("  {:<9} {}{detail}", step.status.as_str(), step.name);
    }

    for f in &report.files_created {
        println!("  created   {f}");
    }
    for f in &report.files_modified {
        println!("  modified  {f}");
    }

    let s = &report.summary;
    let dry = if report.dry_run { " (dry run)" } else { "" };
    println!(
        "{}: {} {}{dry}; {} completed, {} failed, {} skipped in {}ms",
        report.recipe, report.status, report.run_id, s.completed, s.failed, s.skipped, s.duration_ms
    );
    if !s.not_run.is_empty() {
        println!("not run: {}", s.not_run.join(", "));
    }
    if let Some(failure) = &report.failure {
        eprintln!("error: step '{}' ({}) failed: {}", failure.step, failure.tool, failure.message);
    }

    if report.status == RunStatus::AwaitingAnswers {
        match (&report.manifest, &args.manifest_out) {
            (Some(_), Some(path)) => {
                eprintln!("prompt manifest written to {}", path.display());
            }
            (Some(manifest), None) => match manifest.to_json_string() {
                Ok(json) => println!("{json}"),
                Err(e) => eprintln!("error: failed to render manifest: {e}"),
            },
            (None, _) => {}
        }
        eprintln!("answer the prompts and run again with --answers <file>");
    }
}
