mod common;

use common::{engine, read, recipe, write};
use scaffold_core::types::InjectPosition;
use scaffold_exec::ai::{Answers, PromptManifest};
use scaffold_exec::engine::RunOptions;
use scaffold_exec::executor::{RunStatus, StepStatus};
use scaffold_exec::tool::ToolErrorKind;
use scaffold_exec::transformer::inject;

const AI_RECIPE: &str = r#"
name: ai-demo
variables:
  name:
    type: string
    default: widget
steps:
  - name: base
    content: "fn main() {\n    // body\n}\n"
    output: src/main.rs
  - name: summary
    dependsOn: [base]
    prompt: "Summarise {{ name }}"
    constraints: [markdown]
    output:
      type: file
      path: SUMMARY.md
  - name: body
    dependsOn: [base]
    prompt: Write the body of main
    context:
      file: src/main.rs
    output:
      type: inject
      path: src/main.rs
      anchor: "// body"
      position: after
  - name: title
    dependsOn: [body]
    key: project-title
    prompt: "Name {{ name }}"
    output:
      type: variable
      variable: title
  - name: use-title
    dependsOn: [title]
    content: "{{ title }}\n"
    output: TITLE.txt
"#;

const BASE: &str = "fn main() {\n    // body\n}\n";

#[tokio::test]
async fn collect_then_apply_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let loaded = recipe(AI_RECIPE);
    let engine = engine();

    let collected = engine
        .run(&loaded, RunOptions::new(dir.path()).skip_prompts())
        .await
        .unwrap();
    assert_eq!(collected.status, RunStatus::AwaitingAnswers);
    assert!(collected.dry_run);
    assert!(!dir.path().join("src/main.rs").exists());
    let manifest: PromptManifest = collected.manifest.clone().unwrap();
    let keys: Vec<&str> = manifest.keys().collect();
    assert_eq!(keys, ["summary", "body", "project-title"]);
    let summary = manifest.get("summary").unwrap();
    assert_eq!(summary.prompt, "Summarise widget");
    assert_eq!(summary.constraints, vec!["markdown".to_string()]);
    assert_eq!(manifest.get("body").unwrap().context["file"], "src/main.rs");
    assert_eq!(collected.step("use-title").unwrap().status, StepStatus::Completed);

    let mut answers = Answers::new();
    for entry in &manifest.entries {
        let text = match entry.key.as_str() {
            "summary" => "# Widget\n\nDoes widget things.\n",
            "body" => "    println!(\"hello\");",
            _ => "Widget Pro",
        };
        answers.insert(entry.key.clone(), text);
    }

    let applied = engine
        .run(&loaded, RunOptions::new(dir.path()).skip_prompts().answers(answers))
        .await
        .unwrap();
    assert_eq!(applied.status, RunStatus::Succeeded, "{:?}", applied.failure);
    assert!(applied.manifest.is_none());

    assert_eq!(read(dir.path(), "SUMMARY.md"), "# Widget\n\nDoes widget things.\n");
    let expected_main = inject(
        BASE,
        "    println!(\"hello\");",
        Some("// body"),
        Some(InjectPosition::After),
    )
    .unwrap();
    assert_eq!(read(dir.path(), "src/main.rs"), expected_main);
    assert_eq!(read(dir.path(), "TITLE.txt"), "Widget Pro\n");
    assert_eq!(applied.variables["title"], "Widget Pro");
}

#[tokio::test]
async fn missing_answer_for_required_step_fails() {
    let dir = tempfile::tempdir().unwrap();
    let loaded = recipe("name: r\nsettings:\n  retries: 3\nsteps:\n  - name: gen\n    prompt: hi\n");
    let report = engine()
        .run(
            &loaded,
            RunOptions::new(dir.path()).skip_prompts().answers(Answers::new()),
        )
        .await
        .unwrap();
    assert_eq!(report.status, RunStatus::Failed);
    let step = report.step("gen").unwrap();
    let err = step.error.clone().unwrap();
    assert_eq!(err.kind, ToolErrorKind::InvalidParameter);
    assert!(err.message.contains("gen"));
    assert_eq!(step.retry_count, 0);
}

#[tokio::test]
async fn missing_answer_for_optional_step_is_skipped() {
    let loaded = recipe("name: r\nsteps:\n  - name: gen\n    prompt: hi\n    required: false\n");
    let report = engine()
        .run(&loaded, RunOptions::new(".").skip_prompts().answers(Answers::new()))
        .await
        .unwrap();
    assert_eq!(report.status, RunStatus::Succeeded);
    assert_eq!(report.step("gen").unwrap().status, StepStatus::Skipped);
}

#[tokio::test]
async fn file_target_refuses_to_overwrite_without_force() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "out.md", "original\n");
    let loaded = recipe(
        "name: r\nsteps:\n  - name: gen\n    prompt: hi\n    output:\n      type: file\n      path: out.md\n",
    );
    let answers = Answers::new().with("gen", "generated\n");

    let report = engine()
        .run(&loaded, RunOptions::new(dir.path()).skip_prompts().answers(answers.clone()))
        .await
        .unwrap();
    assert_eq!(report.status, RunStatus::Failed);
    assert_eq!(read(dir.path(), "out.md"), "original\n");

    let report = engine()
        .run(&loaded, RunOptions::new(dir.path()).skip_prompts().answers(answers).force())
        .await
        .unwrap();
    assert_eq!(report.status, RunStatus::Succeeded);
    assert_eq!(read(dir.path(), "out.md"), "generated\n");
    assert_eq!(report.files_modified, vec!["out.md".to_string()]);
}

#[tokio::test]
async fn injection_is_skipped_when_text_is_already_present() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "notes.txt", "a\nmarker\nb\n");
    let loaded = recipe(
        r#"
name: r
steps:
  - name: gen
    prompt: hi
    output:
      type: inject
      path: notes.txt
      anchor: marker
      position: before
"#,
    );
    let (loaded, root) = (&loaded, dir.path());
    let run = || async move {
        engine()
            .run(
                loaded,
                RunOptions::new(root)
                    .skip_prompts()
                    .answers(Answers::new().with("gen", "inserted")),
            )
            .await
    };

    let first = run().await.unwrap();
    assert_eq!(first.step("gen").unwrap().status, StepStatus::Completed);
    assert_eq!(read(dir.path(), "notes.txt"), "a\ninserted\nmarker\nb\n");

    let second = run().await.unwrap();
    assert_eq!(second.step("gen").unwrap().status, StepStatus::Skipped);
    assert_eq!(read(dir.path(), "notes.txt"), "a\ninserted\nmarker\nb\n");
}

#[tokio::test]
async fn missing_anchor_is_an_execution_failure() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "notes.txt", "nothing here\n");
    let loaded = recipe(
        "name: r\nsteps:\n  - name: gen\n    prompt: hi\n    output:\n      type: inject\n      path: notes.txt\n      anchor: \"// missing\"\n",
    );
    let report = engine()
        .run(
            &loaded,
            RunOptions::new(dir.path()).skip_prompts().answers(Answers::new().with("gen", "x")),
        )
        .await
        .unwrap();
    let err = report.step("gen").unwrap().error.clone().unwrap();
    assert_eq!(err.kind, ToolErrorKind::Execution);
    assert!(err.message.contains("// missing"));
}

#[tokio::test]
async fn stdout_answers_are_reported() {
    let loaded = recipe(
        "name: r\nsteps:\n  - name: gen\n    prompt: hi\n    output:\n      type: stdout\n",
    );
    let report = engine()
        .run(
            &loaded,
            RunOptions::new(".").skip_prompts().answers(Answers::new().with("gen", "printed")),
        )
        .await
        .unwrap();
    assert_eq!(report.stdout.len(), 1);
    assert_eq!(report.stdout[0].key, "gen");
    assert_eq!(report.stdout[0].text, "printed");
}

#[tokio::test]
async fn ai_step_inside_a_sub_recipe_suspends_the_whole_run() {
    let dir = tempfile::tempdir().unwrap();
    write(
        dir.path(),
        "child.yml",
        "name: child\nsteps:\n  - name: notes\n    prompt: Write release notes\n    output:\n      type: file\n      path: NOTES.md\n",
    );
    write(
        dir.path(),
        "parent.yml",
        "name: parent\nsteps:\n  - name: base\n    content: \"base\\n\"\n    output: BASE.txt\n  - name: child\n    dependsOn: [base]\n    recipe: ./child.yml\n",
    );
    let engine = engine();
    let loaded = engine
        .load(&dir.path().join("parent.yml").to_string_lossy(), dir.path())
        .await
        .unwrap();

    let collected = engine
        .run(&loaded, RunOptions::new(dir.path()).skip_prompts())
        .await
        .unwrap();
    assert_eq!(collected.status, RunStatus::AwaitingAnswers);
    assert!(collected.dry_run);
    assert!(!dir.path().join("BASE.txt").exists());
    let manifest = collected.manifest.clone().unwrap();
    let entry = manifest.get("notes").unwrap();
    assert_eq!(entry.recipe, "child");

    let applied = engine
        .run(
            &loaded,
            RunOptions::new(dir.path())
                .skip_prompts()
                .answers(Answers::new().with("notes", "# Notes\n")),
        )
        .await
        .unwrap();
    assert_eq!(applied.status, RunStatus::Succeeded, "{:?}", applied.failure);
    assert_eq!(read(dir.path(), "BASE.txt"), "base\n");
    assert_eq!(read(dir.path(), "NOTES.md"), "# Notes\n");
}
