mod common;

use std::time::Duration;

use common::{engine, flaky_registry, read, recipe, write};
use scaffold_exec::engine::{EngineError, ExecutionReport, RunOptions};
use scaffold_exec::executor::{RunStatus, StepResult, StepStatus, DEPENDENCY_FAILED};
use scaffold_exec::tool::{ToolError, ToolErrorKind};
use tokio_util::sync::CancellationToken;

#[tokio::test]
async fn demo_recipe_renders_then_runs_shell() {
    let dir = tempfile::tempdir().unwrap();
    let loaded = recipe(
        r##"
name: demo
variables:
  title:
    type: string
    required: true
steps:
  - name: s1
    tool: template
    content: "# {{ title }}\n"
    output: README.md
  - name: s2
    tool: shell
    dependsOn: [s1]
    command: echo done
"##,
    );
    let report = engine()
        .run(
            &loaded,
            RunOptions::new(dir.path()).variable("title", "Hello").skip_prompts(),
        )
        .await
        .unwrap();

    assert_eq!(report.status, RunStatus::Succeeded);
    assert_eq!(report.steps.len(), 2);
    let s1 = report.step("s1").unwrap();
    let s2 = report.step("s2").unwrap();
    assert_eq!(s1.status, StepStatus::Completed);
    assert_eq!(s2.status, StepStatus::Completed);
    assert!(s2.start_time >= s1.end_time);
    assert_eq!(read(dir.path(), "README.md"), "# Hello\n");
    assert_eq!(report.files_created, vec!["README.md".to_string()]);
    assert_eq!(s2.tool_result["stdout"], "done\n");
}

#[tokio::test]
async fn false_condition_skips_without_blocking_dependents() {
    let dir = tempfile::tempdir().unwrap();
    let loaded = recipe(
        r#"
name: conditional
variables:
  withDocs:
    type: boolean
    default: false
steps:
  - name: docs
    when: "withDocs"
    directories: [docs]
  - name: after
    dependsOn: [docs]
    directories: [src]
"#,
    );
    let report = engine()
        .run(&loaded, RunOptions::new(dir.path()).skip_prompts())
        .await
        .unwrap();

    let docs = report.step("docs").unwrap();
    assert_eq!(docs.status, StepStatus::Skipped);
    assert_eq!(docs.condition_result, Some(false));
    assert!(!dir.path().join("docs").exists());
    assert_eq!(report.step("after").unwrap().status, StepStatus::Completed);
    assert!(dir.path().join("src").is_dir());
}

#[tokio::test]
async fn always_failing_step_is_attempted_retries_plus_one_times() {
    let (registry, attempts) = flaky_registry(u32::MAX, || ToolError::execution("boom")).await;
    let engine = engine().with_registry(registry);
    let loaded = recipe(
        r#"
name: retry
steps:
  - name: flaky
    action: flaky
    retries: 2
"#,
    );
    let report = engine
        .run(&loaded, RunOptions::new(".").skip_prompts())
        .await
        .unwrap();

    assert_eq!(attempts.load(std::sync::atomic::Ordering::SeqCst), 3);
    let step = report.step("flaky").unwrap();
    assert_eq!(step.status, StepStatus::Failed);
    assert_eq!(step.retry_count, 2);
    assert_eq!(report.status, RunStatus::Failed);
    let failure = report.failure.unwrap();
    assert_eq!(failure.step, "flaky");
    assert!(failure.message.contains("boom"));
}

#[tokio::test]
async fn recovering_step_succeeds_on_a_later_attempt() {
    let (registry, attempts) = flaky_registry(1, || ToolError::execution("transient")).await;
    let loaded = recipe("name: r\nsteps:\n  - name: a\n    action: x\n    retries: 3\n");
    let report = engine()
        .with_registry(registry)
        .run(&loaded, RunOptions::new(".").skip_prompts())
        .await
        .unwrap();
    assert_eq!(report.status, RunStatus::Succeeded);
    assert_eq!(attempts.load(std::sync::atomic::Ordering::SeqCst), 2);
    assert_eq!(report.step("a").unwrap().retry_count, 1);
}

#[tokio::test]
async fn configuration_errors_are_never_retried() {
    let (registry, attempts) = flaky_registry(u32::MAX, || ToolError::configuration("bad")).await;
    let loaded = recipe("name: r\nsteps:\n  - name: a\n    action: x\n    retries: 5\n");
    let report = engine()
        .with_registry(registry)
        .run(&loaded, RunOptions::new(".").skip_prompts())
        .await
        .unwrap();
    assert_eq!(attempts.load(std::sync::atomic::Ordering::SeqCst), 1);
    let step = report.step("a").unwrap();
    assert_eq!(step.error.as_ref().unwrap().kind, ToolErrorKind::Configuration);
}

#[tokio::test]
async fn failure_halts_the_run_and_lists_unstarted_steps() {
    let dir = tempfile::tempdir().unwrap();
    let loaded = recipe(
        r#"
name: halt
steps:
  - name: broken
    command: exit 3
  - name: later
    dependsOn: [broken]
    directories: [never]
"#,
    );
    let report = engine()
        .run(&loaded, RunOptions::new(dir.path()).skip_prompts())
        .await
        .unwrap();

    assert_eq!(report.status, RunStatus::Failed);
    assert_eq!(report.step("broken").unwrap().status, StepStatus::Failed);
    assert!(report.step("later").is_none());
    assert_eq!(report.summary.not_run, vec!["later".to_string()]);
    assert!(!dir.path().join("never").exists());
}

#[tokio::test]
async fn continue_on_error_skips_dependents_and_runs_independent_steps() {
    let dir = tempfile::tempdir().unwrap();
    let loaded = recipe(
        r#"
name: keep-going
steps:
  - name: broken
    command: exit 1
  - name: dependent
    dependsOn: [broken]
    directories: [blocked]
  - name: independent
    directories: [fine]
"#,
    );
    let mut options = RunOptions::new(dir.path()).skip_prompts();
    options.continue_on_error = true;
    let report = engine().run(&loaded, options).await.unwrap();

    assert_eq!(report.status, RunStatus::Failed);
    let dependent = report.step("dependent").unwrap();
    assert_eq!(dependent.status, StepStatus::Skipped);
    assert_eq!(dependent.skip_reason.as_deref(), Some(DEPENDENCY_FAILED));
    assert_eq!(report.step("independent").unwrap().status, StepStatus::Completed);
    assert!(dir.path().join("fine").is_dir());
    assert!(report.summary.not_run.is_empty());
}

#[tokio::test]
async fn step_level_continue_on_error_lets_dependents_run() {
    let dir = tempfile::tempdir().unwrap();
    let loaded = recipe(
        r#"
name: tolerant
steps:
  - name: optional
    command: exit 1
    continueOnError: true
  - name: next
    dependsOn: [optional]
    directories: [out]
"#,
    );
    let report = engine()
        .run(&loaded, RunOptions::new(dir.path()).skip_prompts())
        .await
        .unwrap();
    assert_eq!(report.step("optional").unwrap().status, StepStatus::Failed);
    assert_eq!(report.step("next").unwrap().status, StepStatus::Completed);
    assert_eq!(report.status, RunStatus::Succeeded);
}

#[tokio::test]
async fn dependency_order_holds_for_parallel_steps() {
    let dir = tempfile::tempdir().unwrap();
    let loaded = recipe(
        r#"
name: fan
steps:
  - name: base
    directories: [pkg]
  - name: a
    parallel: true
    dependsOn: [base]
    command: sleep 0.05 && touch pkg/a
  - name: b
    parallel: true
    dependsOn: [base]
    command: sleep 0.05 && touch pkg/b
  - name: join
    dependsOn: [a, b]
    command: test -f pkg/a && test -f pkg/b
"#,
    );
    let report = engine()
        .run(&loaded, RunOptions::new(dir.path()).skip_prompts())
        .await
        .unwrap();

    assert_eq!(report.status, RunStatus::Succeeded, "{:?}", report.failure);
    let base = report.step("base").unwrap();
    let join = report.step("join").unwrap();
    for name in ["a", "b"] {
        let s = report.step(name).unwrap();
        assert!(s.start_time >= base.end_time);
        assert!(join.start_time >= s.end_time);
    }
    let names: Vec<&str> = report.steps.iter().map(|s| s.name.as_str()).collect();
    assert_eq!(names, ["base", "a", "b", "join"]);
}

#[tokio::test]
async fn step_timeout_fails_the_attempt() {
    let loaded = recipe("name: slow\nsteps:\n  - name: wait\n    command: sleep 5\n    timeout: 50\n");
    let report = engine()
        .run(&loaded, RunOptions::new(".").skip_prompts())
        .await
        .unwrap();
    let step = report.step("wait").unwrap();
    assert_eq!(step.status, StepStatus::Failed);
    assert_eq!(step.error.as_ref().unwrap().kind, ToolErrorKind::Timeout);
}

#[tokio::test]
async fn cancellation_stops_scheduling() {
    let dir = tempfile::tempdir().unwrap();
    let loaded = recipe(
        r#"
name: cancel
steps:
  - name: long
    command: sleep 5
  - name: after
    dependsOn: [long]
    directories: [after]
"#,
    );
    let cancel = CancellationToken::new();
    let mut options = RunOptions::new(dir.path()).skip_prompts();
    options.cancel = cancel.clone();

    let trigger = tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(100)).await;
        cancel.cancel();
    });
    let report = engine().run(&loaded, options).await.unwrap();
    trigger.await.unwrap();

    assert_eq!(report.status, RunStatus::Cancelled);
    assert!(!dir.path().join("after").exists());
    assert_eq!(report.summary.not_run, vec!["after".to_string()]);
}

#[tokio::test]
async fn step_results_are_visible_to_later_conditions() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "marker", "");
    let loaded = recipe(
        r#"
name: chain
steps:
  - name: probe
    command: test -f marker
    continueOnError: true
  - name: onSuccess
    when: "steps.probe.status == 'completed'"
    directories: [ok]
"#,
    );
    let report = engine()
        .run(&loaded, RunOptions::new(dir.path()).skip_prompts())
        .await
        .unwrap();
    assert_eq!(report.step("onSuccess").unwrap().status, StepStatus::Completed);
    assert!(dir.path().join("ok").is_dir());
}

#[tokio::test]
async fn invalid_recipe_is_rejected_before_any_step_runs() {
    let dir = tempfile::tempdir().unwrap();
    let loaded = recipe(
        r#"
name: bad
steps:
  - name: a
    dependsOn: [b]
    directories: [a]
  - name: b
    dependsOn: [a]
    directories: [b]
"#,
    );
    let err = engine()
        .run(&loaded, RunOptions::new(dir.path()).skip_prompts())
        .await
        .unwrap_err();
    let EngineError::Validation(e) = err else {
        panic!("expected a validation error, got {err}");
    };
    assert!(e
        .messages()
        .iter()
        .any(|m| m.contains("circular step dependency")));
    assert!(!dir.path().join("a").exists());
}

fn peak_concurrency(report: &ExecutionReport, names: &[&str]) -> usize {
    let steps: Vec<&StepResult> = names.iter().map(|n| report.step(n).unwrap()).collect();
    steps
        .iter()
        .map(|s| {
            steps
                .iter()
                .filter(|o| o.start_time <= s.start_time && s.start_time < o.end_time)
                .count()
        })
        .max()
        .unwrap_or(0)
}

const FAN_OUT: &str = r#"
name: fan-out
steps:
  - name: a
    parallel: true
    command: sleep 0.2
  - name: b
    parallel: true
    command: sleep 0.2
  - name: c
    parallel: true
    command: sleep 0.2
  - name: d
    parallel: true
    command: sleep 0.2
"#;

#[tokio::test]
async fn max_parallel_bounds_concurrent_steps() {
    let loaded = recipe(FAN_OUT);
    let mut options = RunOptions::new(".").skip_prompts();
    options.max_parallel = Some(2);
    let report = engine().run(&loaded, options).await.unwrap();

    assert_eq!(report.status, RunStatus::Succeeded, "{:?}", report.failure);
    assert_eq!(peak_concurrency(&report, &["a", "b", "c", "d"]), 2);
}

#[tokio::test]
async fn recipe_max_parallel_steps_of_one_serialises_the_wave() {
    let loaded = recipe(&FAN_OUT.replace(
        "name: fan-out\n",
        "name: fan-out\nsettings:\n  maxParallelSteps: 1\n",
    ));
    let report = engine()
        .run(&loaded, RunOptions::new(".").skip_prompts())
        .await
        .unwrap();

    assert_eq!(report.status, RunStatus::Succeeded, "{:?}", report.failure);
    assert_eq!(peak_concurrency(&report, &["a", "b", "c", "d"]), 1);
}

#[tokio::test]
async fn non_parallel_siblings_run_in_declaration_order() {
    let loaded = recipe(
        r#"
name: ordered
steps:
  - name: first
    command: sleep 0.1
  - name: second
    command: sleep 0.05
  - name: third
    command: "true"
"#,
    );
    let report = engine()
        .run(&loaded, RunOptions::new(".").skip_prompts())
        .await
        .unwrap();

    assert_eq!(report.status, RunStatus::Succeeded, "{:?}", report.failure);
    let first = report.step("first").unwrap();
    let second = report.step("second").unwrap();
    let third = report.step("third").unwrap();
    assert!(second.start_time >= first.end_time);
    assert!(third.start_time >= second.end_time);
}
