use std::fs;
use std::path::Path;

use assert_cmd::Command;
use tempfile::TempDir;

fn scaffold() -> Command {
    let mut cmd = Command::cargo_bin("scaffold").unwrap();
    cmd.env_remove("SCAFFOLD_LOG");
    cmd
}

fn write(dir: &Path, name: &str, contents: &str) -> String {
    let path = dir.join(name);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(&path, contents).unwrap();
    path.to_string_lossy().into_owned()
}

const SIMPLE: &str = r##"
name: simple
description: Makes a folder and a readme
variables:
  project:
    type: string
    default: demo
steps:
  - name: dirs
    directories: [src]
  - name: readme
    content: "# {{ project }}\n"
    output: README.md
    dependsOn: [dirs]
"##;

const WITH_AI: &str = r#"
name: ai
steps:
  - name: summary
    prompt: Summarise the project
    output:
      type: file
      path: SUMMARY.md
"#;

#[test]
fn validate_accepts_a_valid_recipe() {
    let tmp = TempDir::new().unwrap();
    let recipe = write(tmp.path(), "simple.yml", SIMPLE);

    scaffold().args(["validate", &recipe]).assert().success();
}

#[test]
fn validate_reports_cycles_with_exit_code_2() {
    let tmp = TempDir::new().unwrap();
    let recipe = write(
        tmp.path(),
        "cycle.yml",
        "name: cycle\nsteps:\n  - name: a\n    directories: [a]\n    dependsOn: [b]\n  - name: b\n    directories: [b]\n    dependsOn: [a]\n",
    );

    let out = scaffold()
        .args(["validate", &recipe, "--format", "json"])
        .assert()
        .code(2)
        .get_output()
        .stdout
        .clone();
    let body: serde_json::Value = serde_json::from_slice(&out).unwrap();
    assert_eq!(body["valid"], false);
    assert!(body["errors"].to_string().contains("circular step dependency"));
}

#[test]
fn validate_rejects_unparseable_input() {
    let tmp = TempDir::new().unwrap();
    let recipe = write(tmp.path(), "broken.yml", "steps: [unterminated");

    scaffold().args(["validate", &recipe]).assert().code(2);
}

#[test]
fn missing_recipe_is_a_runtime_error() {
    let tmp = TempDir::new().unwrap();
    let missing = tmp.path().join("nope.yml");

    scaffold()
        .args(["validate", missing.to_str().unwrap()])
        .assert()
        .code(4);
}

#[test]
fn run_writes_files_and_applies_vars() {
    let tmp = TempDir::new().unwrap();
    let recipe = write(tmp.path(), "simple.yml", SIMPLE);

    scaffold()
        .args(["run", &recipe, "--skip-prompts", "--var", "project=widget", "--project-root"])
        .arg(tmp.path())
        .assert()
        .success();

    assert!(tmp.path().join("src").is_dir());
    assert_eq!(fs::read_to_string(tmp.path().join("README.md")).unwrap(), "# widget\n");
}

#[test]
fn run_json_report_and_dry_run() {
    let tmp = TempDir::new().unwrap();
    let recipe = write(tmp.path(), "simple.yml", SIMPLE);

    let out = scaffold()
        .args(["--format", "json", "run", &recipe, "--skip-prompts", "--dry-run", "--project-root"])
        .arg(tmp.path())
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let report: serde_json::Value = serde_json::from_slice(&out).unwrap();
    assert_eq!(report["status"], "succeeded");
    assert_eq!(report["dryRun"], true);
    assert_eq!(report["summary"]["completed"], 2);
    assert!(!tmp.path().join("README.md").exists());
}

#[test]
fn failing_step_exits_with_3() {
    let tmp = TempDir::new().unwrap();
    let recipe = write(
        tmp.path(),
        "fail.yml",
        "name: fail\nsteps:\n  - name: boom\n    command: exit 7\n",
    );

    scaffold()
        .args(["run", &recipe, "--skip-prompts", "--project-root"])
        .arg(tmp.path())
        .assert()
        .code(3);
}

#[test]
fn bad_var_syntax_is_rejected() {
    let tmp = TempDir::new().unwrap();
    let recipe = write(tmp.path(), "simple.yml", SIMPLE);

    scaffold()
        .args(["run", &recipe, "--skip-prompts", "--var", "no-equals-sign"])
        .assert()
        .code(4);
}

#[test]
fn ai_collect_then_apply() {
    let tmp = TempDir::new().unwrap();
    let recipe = write(tmp.path(), "ai.yml", WITH_AI);
    let manifest = tmp.path().join("manifest.json");

    scaffold()
        .args(["run", &recipe, "--skip-prompts", "--manifest-out"])
        .arg(&manifest)
        .arg("--project-root")
        .arg(tmp.path())
        .assert()
        .code(5);
    assert!(!tmp.path().join("SUMMARY.md").exists());
    let body: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&manifest).unwrap()).unwrap();
    assert!(body.to_string().contains("Summarise the project"));

    let answers = write(tmp.path(), "answers.yml", "summary: A tiny project.\n");
    scaffold()
        .args(["run", &recipe, "--skip-prompts", "--answers", &answers, "--project-root"])
        .arg(tmp.path())
        .assert()
        .success();
    assert_eq!(
        fs::read_to_string(tmp.path().join("SUMMARY.md")).unwrap(),
        "A tiny project."
    );
}

#[test]
fn list_finds_recipes_and_skips_hidden_dirs() {
    let tmp = TempDir::new().unwrap();
    write(tmp.path(), "simple.yml", SIMPLE);
    write(tmp.path(), "nested/ai.yml", WITH_AI);
    write(tmp.path(), ".hidden/secret.yml", SIMPLE);
    write(tmp.path(), "notes.yml", "title: not a recipe\n");

    let out = scaffold()
        .args(["--format", "json", "list"])
        .arg(tmp.path())
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let body: serde_json::Value = serde_json::from_slice(&out).unwrap();
    let names: Vec<&str> = body["recipes"]
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, ["ai", "simple"]);
}

#[test]
fn info_shows_plan() {
    let tmp = TempDir::new().unwrap();
    let recipe = write(tmp.path(), "simple.yml", SIMPLE);

    let out = scaffold()
        .args(["info", &recipe, "--format", "json"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let info: serde_json::Value = serde_json::from_slice(&out).unwrap();
    assert_eq!(info["name"], "simple");
    assert_eq!(info["steps"][1]["dependsOn"][0], "dirs");
    assert_eq!(info["plan"]["graph"]["waves"].as_array().unwrap().len(), 2);
    assert_eq!(info["variables"][0]["name"], "project");
}
