mod common;

use std::sync::Arc;

use async_trait::async_trait;
use common::{engine, read, write};
use scaffold_exec::ai::Answers;
use scaffold_exec::composition::{FetchError, RecipeFetcher};
use scaffold_exec::engine::RunOptions;
use scaffold_exec::executor::{RunStatus, StepStatus};
use scaffold_exec::tool::ToolErrorKind;
use url::Url;

#[tokio::test]
async fn sub_recipe_inherits_overrides_and_maps_variables() {
    let dir = tempfile::tempdir().unwrap();
    write(
        dir.path(),
        "recipes/component.yml",
        r#"
name: component
variables:
  name:
    type: string
    required: true
  owner:
    type: string
    default: nobody
steps:
  - name: render
    content: "{{ name }} by {{ owner }} for {{ project }}\n"
    output: "{{ name }}.txt"
"#,
    );
    write(
        dir.path(),
        "main.yml",
        r#"
name: main
variables:
  project:
    type: string
    default: acme
  author:
    type: string
    default: ada
steps:
  - name: button
    recipe: ./recipes/component.yml
    variables:
      name: button
    variableMapping:
      author: owner
"#,
    );

    let engine = engine();
    let loaded = engine
        .load(&dir.path().join("main.yml").to_string_lossy(), dir.path())
        .await
        .unwrap();
    let report = engine
        .run(&loaded, RunOptions::new(dir.path()).skip_prompts())
        .await
        .unwrap();

    assert_eq!(report.status, RunStatus::Succeeded, "{:?}", report.failure);
    assert_eq!(read(dir.path(), "button.txt"), "button by ada for acme\n");
    assert_eq!(report.files_created, vec!["button.txt".to_string()]);
    let nested = &report.step("button").unwrap().tool_result;
    assert_eq!(nested["recipe"], "component");
    assert_eq!(nested["steps"][0]["name"], "render");
}

#[tokio::test]
async fn without_inherit_parent_variables_are_hidden() {
    let dir = tempfile::tempdir().unwrap();
    write(
        dir.path(),
        "child.yml",
        "name: child\nsteps:\n  - name: check\n    command: test -z \"{{ secret }}\"\n",
    );
    write(
        dir.path(),
        "parent.yml",
        r#"
name: parent
variables:
  secret:
    type: string
    default: hunter2
steps:
  - name: child
    recipe: child.yml
    inherit: false
"#,
    );
    let engine = engine();
    let loaded = engine
        .load(&dir.path().join("parent.yml").to_string_lossy(), dir.path())
        .await
        .unwrap();
    let report = engine
        .run(&loaded, RunOptions::new(dir.path()).skip_prompts())
        .await
        .unwrap();
    assert_eq!(report.status, RunStatus::Succeeded, "{:?}", report.failure);
    assert_eq!(report.step("child").unwrap().status, StepStatus::Completed);
}

#[tokio::test]
async fn self_reference_fails_with_the_cycle_chain() {
    let dir = tempfile::tempdir().unwrap();
    write(
        dir.path(),
        "x.yml",
        "name: x\nsteps:\n  - name: again\n    recipe: ./x.yml\n",
    );
    let engine = engine();
    let loaded = engine
        .load(&dir.path().join("x.yml").to_string_lossy(), dir.path())
        .await
        .unwrap();
    let report = engine
        .run(&loaded, RunOptions::new(dir.path()).skip_prompts())
        .await
        .unwrap();

    assert_eq!(report.status, RunStatus::Failed);
    let err = report.step("again").unwrap().error.clone().unwrap();
    assert_eq!(err.kind, ToolErrorKind::Circular);
    assert!(err.message.contains("x -> x"), "{}", err.message);
}

#[tokio::test]
async fn indirect_cycle_is_detected_through_the_call_stack() {
    let dir = tempfile::tempdir().unwrap();
    write(
        dir.path(),
        "x.yml",
        "name: x\nsettings:\n  retries: 2\nsteps:\n  - name: to-y\n    recipe: ./y.yml\n",
    );
    write(dir.path(), "y.yml", "name: y\nsteps:\n  - name: to-x\n    recipe: ./x.yml\n");
    let engine = engine();
    let loaded = engine
        .load(&dir.path().join("x.yml").to_string_lossy(), dir.path())
        .await
        .unwrap();
    let report = engine
        .run(&loaded, RunOptions::new(dir.path()).skip_prompts())
        .await
        .unwrap();

    assert_eq!(report.status, RunStatus::Failed);
    let failure = report.failure.as_ref().unwrap();
    assert_eq!(failure.step, "to-y");
    assert_eq!(failure.kind, ToolErrorKind::Circular);
    assert!(failure.message.contains("x -> y -> x"), "{}", failure.message);

    let step = report.step("to-y").unwrap();
    assert_eq!(step.error.as_ref().unwrap().kind, ToolErrorKind::Circular);
    assert_eq!(step.retry_count, 0);
}

#[tokio::test]
async fn cycle_behind_a_false_condition_is_not_reported() {
    let dir = tempfile::tempdir().unwrap();
    write(
        dir.path(),
        "x.yml",
        "name: x\nsteps:\n  - name: again\n    when: \"false\"\n    recipe: ./x.yml\n",
    );
    let engine = engine();
    let loaded = engine
        .load(&dir.path().join("x.yml").to_string_lossy(), dir.path())
        .await
        .unwrap();
    let report = engine
        .run(&loaded, RunOptions::new(dir.path()).skip_prompts())
        .await
        .unwrap();
    assert_eq!(report.status, RunStatus::Succeeded);
    assert_eq!(report.step("again").unwrap().status, StepStatus::Skipped);
}

#[tokio::test]
async fn invalid_sub_recipe_is_a_configuration_failure() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "empty.yml", "name: empty\nsteps: []\n");
    write(dir.path(), "main.yml", "name: main\nsteps:\n  - name: use\n    recipe: ./empty.yml\n");
    let engine = engine();
    let loaded = engine
        .load(&dir.path().join("main.yml").to_string_lossy(), dir.path())
        .await
        .unwrap();
    let report = engine
        .run(&loaded, RunOptions::new(dir.path()).skip_prompts())
        .await
        .unwrap();
    let err = report.step("use").unwrap().error.clone().unwrap();
    assert_eq!(err.kind, ToolErrorKind::Configuration);
    assert!(err.message.contains("empty"));
}

#[tokio::test]
async fn missing_sub_recipe_is_a_resolution_failure() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "main.yml", "name: main\nsteps:\n  - name: use\n    recipe: ./nope.yml\n");
    let engine = engine();
    let loaded = engine
        .load(&dir.path().join("main.yml").to_string_lossy(), dir.path())
        .await
        .unwrap();
    let report = engine
        .run(&loaded, RunOptions::new(dir.path()).skip_prompts())
        .await
        .unwrap();
    let err = report.step("use").unwrap().error.clone().unwrap();
    assert_eq!(err.kind, ToolErrorKind::Resolution);
}

struct StaticFetcher(&'static str);

#[async_trait]
impl RecipeFetcher for StaticFetcher {
    async fn fetch(&self, _url: &Url) -> Result<String, FetchError> {
        Ok(self.0.to_string())
    }
}

#[tokio::test]
async fn remote_recipes_come_from_the_fetcher() {
    let dir = tempfile::tempdir().unwrap();
    write(
        dir.path(),
        "main.yml",
        "name: main\nsteps:\n  - name: remote\n    recipe: https://example.com/r/recipe.yml\n",
    );
    let engine = engine().with_fetcher(Arc::new(StaticFetcher(
        "name: remote\nsteps:\n  - name: mk\n    directories: [from-remote]\n",
    )));
    let loaded = engine
        .load(&dir.path().join("main.yml").to_string_lossy(), dir.path())
        .await
        .unwrap();
    let report = engine
        .run(&loaded, RunOptions::new(dir.path()).skip_prompts())
        .await
        .unwrap();
    assert_eq!(report.status, RunStatus::Succeeded, "{:?}", report.failure);
    assert!(dir.path().join("from-remote").is_dir());
}

#[tokio::test]
async fn working_dir_is_relative_to_the_project_root() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "lib/make.yml", "name: make\nsteps:\n  - name: mk\n    directories: [generated]\n");
    write(
        dir.path(),
        "main.yml",
        "name: main\nsteps:\n  - name: nested\n    recipe: ./lib/make.yml\n    workingDir: packages/app\n",
    );
    let engine = engine();
    let loaded = engine
        .load(&dir.path().join("main.yml").to_string_lossy(), dir.path())
        .await
        .unwrap();
    let report = engine
        .run(&loaded, RunOptions::new(dir.path()).skip_prompts())
        .await
        .unwrap();
    assert_eq!(report.status, RunStatus::Succeeded, "{:?}", report.failure);
    assert!(dir.path().join("packages/app/generated").is_dir());
    assert_eq!(report.files_created, vec!["packages/app/generated".to_string()]);
}

#[tokio::test]
async fn resolutions_are_cached_within_a_run_but_not_across_runs() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "child.yml", "name: child\nsteps:\n  - name: hi\n    action: log\n    parameters:\n      message: hi\n");
    write(
        dir.path(),
        "parent.yml",
        "name: parent\nsteps:\n  - name: once\n    recipe: ./child.yml\n  - name: twice\n    dependsOn: [once]\n    recipe: ./child.yml\n",
    );
    let engine = engine();
    let loaded = engine
        .load(&dir.path().join("parent.yml").to_string_lossy(), dir.path())
        .await
        .unwrap();
    let options = || RunOptions::new(dir.path()).skip_prompts().answers(Answers::new());

    let first = engine.run(&loaded, options()).await.unwrap();
    assert_eq!(first.status, RunStatus::Succeeded, "{:?}", first.failure);
    assert_eq!(first.step("once").unwrap().tool_result["cacheHit"], false);
    assert_eq!(first.step("twice").unwrap().tool_result["cacheHit"], true);

    let second = engine.run(&loaded, options()).await.unwrap();
    assert_eq!(second.step("once").unwrap().tool_result["cacheHit"], false);
}
