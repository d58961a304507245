mod common;

use std::sync::Arc;

use common::{engine, recipe, ScriptedPrompter};
use scaffold_exec::engine::{EngineError, RunOptions};
use scaffold_exec::executor::RunStatus;
use serde_json::json;

const RECIPE: &str = r#"
name: vars
variables:
  name:
    type: string
    required: true
    pattern: "^[a-z]+$"
  port:
    type: number
    default: 8080
    min: 1
    max: 65535
  features:
    type: array
    default: []
  flavour:
    type: enum
    values: [sweet, sour]
    default: sweet
steps:
  - name: noop
    action: log
    parameters:
      message: "{{ name }}"
"#;

#[tokio::test]
async fn overrides_beat_defaults_and_are_coerced() {
    let loaded = recipe(RECIPE);
    let report = engine()
        .run(
            &loaded,
            RunOptions::new(".")
                .skip_prompts()
                .variable("name", "svc")
                .variable("port", "3000")
                .variable("features", "auth, billing")
                .variable("extra", "passthrough"),
        )
        .await
        .unwrap();
    assert_eq!(report.status, RunStatus::Succeeded);
    assert_eq!(report.variables["name"], "svc");
    assert_eq!(report.variables["port"], 3000);
    assert_eq!(report.variables["features"], json!(["auth", "billing"]));
    assert_eq!(report.variables["flavour"], "sweet");
    assert_eq!(report.variables["extra"], "passthrough");
}

#[tokio::test]
async fn missing_required_with_prompts_skipped_is_an_error() {
    let loaded = recipe(RECIPE);
    let err = engine()
        .run(&loaded, RunOptions::new(".").skip_prompts())
        .await
        .unwrap_err();
    let EngineError::Validation(e) = err else {
        panic!("expected validation error, got {err}");
    };
    assert!(e.messages().iter().any(|m| m.starts_with("variables.name")));
}

#[tokio::test]
async fn missing_required_is_prompted_for_when_allowed() {
    let prompter = Arc::new(ScriptedPrompter::new(vec![json!("prompted")]));
    let loaded = recipe(RECIPE);
    let report = engine()
        .with_prompter(prompter.clone())
        .run(&loaded, RunOptions::new("."))
        .await
        .unwrap();
    assert_eq!(prompter.asked(), vec!["name".to_string()]);
    assert_eq!(report.variables["name"], "prompted");
}

#[tokio::test]
async fn constraint_violations_are_collected_together() {
    let loaded = recipe(RECIPE);
    let err = engine()
        .run(
            &loaded,
            RunOptions::new(".")
                .skip_prompts()
                .variable("name", "Not Valid")
                .variable("port", "70000")
                .variable("flavour", "bitter"),
        )
        .await
        .unwrap_err();
    let EngineError::Validation(e) = err else {
        panic!("expected validation error, got {err}");
    };
    let paths: Vec<&str> = e.violations.iter().map(|v| v.path.as_str()).collect();
    for expected in ["variables.name", "variables.port", "variables.flavour"] {
        assert!(paths.contains(&expected), "{paths:?}");
    }
}

#[tokio::test]
async fn dry_run_never_prompts() {
    let prompter = Arc::new(ScriptedPrompter::new(vec![json!("prompted")]));
    let loaded = recipe(RECIPE);
    let err = engine()
        .with_prompter(prompter.clone())
        .run(&loaded, RunOptions::new(".").dry_run())
        .await
        .unwrap_err();
    assert!(prompter.asked().is_empty());
    let EngineError::Validation(e) = err else {
        panic!("expected validation error, got {err}");
    };
    assert!(e.messages().iter().any(|m| m.starts_with("variables.name")));
}
