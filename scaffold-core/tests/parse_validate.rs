use scaffold_core::{
    parse_recipe_str, validate_recipe, DocumentFormat, ParseError, StepKind, ToolType,
};

fn minimal_valid_yaml() -> &'static str {
    r##"
name: demo
variables:
  title:
    type: string
    required: true
steps:
  - name: s1
    tool: template
    content: "# {{ title }}"
    output: README.md
  - name: s2
    tool: shell
    dependsOn: [s1]
    command: echo done
"##
}

#[test]
fn parse_yaml_and_validate_ok() {
    let parsed = parse_recipe_str(minimal_valid_yaml(), DocumentFormat::Yaml).unwrap();
    validate_recipe(&parsed.recipe).unwrap();
    assert_eq!(parsed.recipe.steps.len(), 2);
    assert_eq!(parsed.recipe.steps[1].depends_on, vec!["s1".to_string()]);
}

#[test]
fn parse_auto_detects_yaml() {
    let parsed = parse_recipe_str(minimal_valid_yaml(), DocumentFormat::Auto).unwrap();
    assert_eq!(parsed.format, DocumentFormat::Yaml);
}

#[test]
fn parse_json_and_validate_ok() {
    let json = r#"
{
  "name": "demo",
  "steps": [
    { "name": "mk", "tool": "directory", "directories": ["src", "tests"] },
    { "name": "hello", "command": "echo hi", "dependsOn": ["mk"] }
  ]
}
"#;
    let parsed = parse_recipe_str(json, DocumentFormat::Auto).unwrap();
    assert_eq!(parsed.format, DocumentFormat::Json);
    validate_recipe(&parsed.recipe).unwrap();
}

#[test]
fn parse_garbage_is_rejected() {
    let err = parse_recipe_str("not: [valid", DocumentFormat::Auto).unwrap_err();
    assert!(format!("{err}").contains("YAML"));
}

#[test]
fn top_level_must_be_a_mapping() {
    let err = parse_recipe_str("- a\n- b\n", DocumentFormat::Yaml).unwrap_err();
    assert!(matches!(err, ParseError::NotAMapping));
}

#[test]
fn tool_is_inferred_from_fields() {
    let yaml = r#"
name: infer
steps:
  - name: a
    command: ls
  - name: b
    template: tpl/readme.tera
    output: README.md
  - name: c
    recipe: ./child.yml
  - name: d
    variable: answer
    message: "What?"
  - name: e
    prompt: "Write a docstring"
  - name: f
    file: package.json
    checks:
      - path: name
  - name: g
    packages: [serde]
    manager: cargo
  - name: h
    steps:
      - name: inner
        directories: [out]
"#;
    let parsed = parse_recipe_str(yaml, DocumentFormat::Yaml).unwrap();
    let tools: Vec<ToolType> = parsed.recipe.steps.iter().map(|s| s.tool_type()).collect();
    assert_eq!(
        tools,
        vec![
            ToolType::Shell,
            ToolType::Template,
            ToolType::Recipe,
            ToolType::Prompt,
            ToolType::Ai,
            ToolType::Query,
            ToolType::Install,
            ToolType::Sequence,
        ]
    );
    let StepKind::Sequence(group) = &parsed.recipe.steps[7].kind else {
        panic!("expected a sequence");
    };
    assert_eq!(group.steps[0].tool_type(), ToolType::Directory);
}

#[test]
fn uninferable_step_is_a_collected_violation() {
    let yaml = r#"
name: bad
steps:
  - name: a
    something: else
  - name: b
    tool: teleport
"#;
    let err = parse_recipe_str(yaml, DocumentFormat::Yaml).unwrap_err();
    let ParseError::StepShape(v) = err else {
        panic!("expected step shape error, got {err:?}");
    };
    assert_eq!(v.violations.len(), 2);
    assert!(v.violations.iter().any(|x| x.message.contains("cannot infer")));
    assert!(v.violations.iter().any(|x| x.message.contains("unknown tool 'teleport'")));
}

#[test]
fn empty_name_and_no_steps_are_reported_together() {
    let parsed = parse_recipe_str("name: \"\"\nsteps: []\n", DocumentFormat::Yaml).unwrap();
    let err = validate_recipe(&parsed.recipe).unwrap_err();
    assert!(err.violations.iter().any(|v| v.path == "name"));
    assert!(err.violations.iter().any(|v| v.path == "steps"));
}

#[test]
fn duplicate_step_names_are_rejected() {
    let yaml = r#"
name: dup
steps:
  - name: s1
    command: echo one
  - name: s1
    command: echo two
"#;
    let parsed = parse_recipe_str(yaml, DocumentFormat::Yaml).unwrap();
    let err = validate_recipe(&parsed.recipe).unwrap_err();
    assert!(err
        .violations
        .iter()
        .any(|v| v.message.contains("duplicate step name 's1'")));
}

#[test]
fn unknown_dependency_is_rejected() {
    let yaml = r#"
name: deps
steps:
  - name: s1
    command: echo one
    dependsOn: [ghost]
"#;
    let parsed = parse_recipe_str(yaml, DocumentFormat::Yaml).unwrap();
    let err = validate_recipe(&parsed.recipe).unwrap_err();
    assert!(err
        .violations
        .iter()
        .any(|v| v.path == "steps[0].dependsOn[0]" && v.message.contains("ghost")));
}

#[test]
fn dependency_cycle_reports_full_path() {
    let yaml = r#"
name: loop
steps:
  - name: a
    command: echo a
    dependsOn: [c]
  - name: b
    command: echo b
    dependsOn: [a]
  - name: c
    command: echo c
    dependsOn: [b]
"#;
    let parsed = parse_recipe_str(yaml, DocumentFormat::Yaml).unwrap();
    let err = validate_recipe(&parsed.recipe).unwrap_err();
    let msg = err.messages().join("\n");
    assert!(msg.contains("circular step dependency: a -> c -> b -> a"), "{msg}");
}

#[test]
fn invalid_variable_specs_are_collected() {
    let yaml = r#"
name: vars
variables:
  a: { type: integer }
  b: { type: string, pattern: "(" }
  c: { type: number, min: 5, max: 1 }
  d: { type: enum }
  e: { type: number, default: "x" }
steps:
  - name: s1
    command: echo
"#;
    let parsed = parse_recipe_str(yaml, DocumentFormat::Yaml).unwrap();
    let err = validate_recipe(&parsed.recipe).unwrap_err();
    for name in ["a", "b", "c", "d", "e"] {
        assert!(
            err.violations
                .iter()
                .any(|v| v.path.starts_with(&format!("variables.{name}"))),
            "missing violation for {name}: {:?}",
            err.messages()
        );
    }
}

#[test]
fn tool_specific_shapes_are_checked() {
    let yaml = r#"
name: shapes
steps:
  - name: t
    tool: template
    output: ""
  - name: q
    tool: query
    file: package.json
  - name: x
    tool: transform
    transform: explode
    files: []
  - name: p
    tool: prompt
    variable: choice
    message: Pick one
    promptType: select
  - name: ai
    tool: ai
    prompt: write it
    output: { type: inject, path: src/lib.rs, position: after }
"#;
    let parsed = parse_recipe_str(yaml, DocumentFormat::Yaml).unwrap();
    let err = validate_recipe(&parsed.recipe).unwrap_err();
    let paths: Vec<&str> = err.violations.iter().map(|v| v.path.as_str()).collect();
    assert!(paths.contains(&"steps[0]"));
    assert!(paths.contains(&"steps[0].output"));
    assert!(paths.contains(&"steps[1]"));
    assert!(paths.contains(&"steps[2].transform"));
    assert!(paths.contains(&"steps[2].files"));
    assert!(paths.contains(&"steps[3].choices"));
    assert!(paths.contains(&"steps[4].output.anchor"));
}

#[test]
fn bad_when_expression_is_rejected() {
    let yaml = r#"
name: cond
steps:
  - name: s1
    command: echo
    when: "flag &&"
"#;
    let parsed = parse_recipe_str(yaml, DocumentFormat::Yaml).unwrap();
    let err = validate_recipe(&parsed.recipe).unwrap_err();
    assert!(err.violations.iter().any(|v| v.path == "steps[0].when"));
}

#[test]
fn nested_group_steps_are_validated() {
    let yaml = r#"
name: groups
steps:
  - name: both
    tool: parallel
    steps:
      - name: x
        command: echo x
      - name: x
        command: echo y
"#;
    let parsed = parse_recipe_str(yaml, DocumentFormat::Yaml).unwrap();
    let err = validate_recipe(&parsed.recipe).unwrap_err();
    assert!(err
        .violations
        .iter()
        .any(|v| v.path == "steps[0].steps[1].name"));
}

#[test]
fn ai_step_detection_sees_nested_groups() {
    let yaml = r#"
name: ai
steps:
  - name: group
    steps:
      - name: gen
        prompt: "Describe {{ name }}"
"#;
    let parsed = parse_recipe_str(yaml, DocumentFormat::Yaml).unwrap();
    assert!(parsed.recipe.contains_ai_steps());
}

#[test]
fn recipe_references_include_groups_and_skip_templates() {
    let yaml = r#"
name: refs
steps:
  - name: base
    recipe: ./base.yml
  - name: group
    steps:
      - name: api
        recipe: "pkg:web/api"
      - name: chosen
        recipe: "./{{ flavour }}.yml"
"#;
    let parsed = parse_recipe_str(yaml, DocumentFormat::Yaml).unwrap();
    assert_eq!(parsed.recipe.recipe_references(), vec!["./base.yml", "pkg:web/api"]);
}
