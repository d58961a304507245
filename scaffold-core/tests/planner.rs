use scaffold_core::{
    parse_recipe_str, plan_from_str, plan_recipe, plan_steps, DocumentFormat, PlanError,
    PlanFormat,
};

fn names(v: &[&str]) -> Vec<String> {
    v.iter().map(|s| s.to_string()).collect()
}

#[test]
fn planner_builds_waves_from_dependencies() {
    let doc = r#"
name: waves
steps:
  - name: scaffold
    directories: [src]
  - name: readme
    content: "hi"
    output: README.md
  - name: lib
    content: "pub fn f() {}"
    output: src/lib.rs
    dependsOn: [scaffold]
  - name: fmt
    command: cargo fmt
    dependsOn: [lib, readme]
"#;

    let outcome = plan_from_str(doc, DocumentFormat::Yaml).unwrap();
    assert!(outcome.validation.is_valid);
    let plan = outcome.plan.unwrap();
    assert_eq!(
        plan.graph.waves,
        vec![names(&["scaffold", "readme"]), names(&["lib"]), names(&["fmt"])]
    );
    assert_eq!(plan.graph.topo_order, names(&["scaffold", "readme", "lib", "fmt"]));
    let fmt = plan.steps.iter().find(|s| s.name == "fmt").unwrap();
    assert_eq!(fmt.wave, 2);
    assert_eq!(fmt.depends_on, names(&["lib", "readme"]));
}

#[test]
fn every_dependency_lands_in_an_earlier_wave() {
    let doc = r#"
name: diamond
steps:
  - { name: d, command: "echo d", dependsOn: [b, c] }
  - { name: b, command: "echo b", dependsOn: [a] }
  - { name: c, command: "echo c", dependsOn: [a] }
  - { name: a, command: "echo a" }
"#;
    let parsed = parse_recipe_str(doc, DocumentFormat::Yaml).unwrap();
    let graph = plan_steps(&parsed.recipe.steps).unwrap();
    for (step, deps) in &graph.depends_on {
        let w = graph.wave_of(step).unwrap();
        for dep in deps {
            assert!(graph.wave_of(dep).unwrap() < w, "{dep} must precede {step}");
        }
    }
    assert_eq!(graph.waves[1], names(&["b", "c"]));
}

#[test]
fn when_references_add_implicit_ordering() {
    let doc = r#"
name: implicit
steps:
  - name: check
    command: "echo {{ steps.probe.status }}"
  - name: probe
    command: test -f Cargo.toml
"#;
    let parsed = parse_recipe_str(doc, DocumentFormat::Yaml).unwrap();
    let graph = plan_steps(&parsed.recipe.steps).unwrap();
    assert_eq!(graph.waves, vec![names(&["probe"]), names(&["check"])]);
}

#[test]
fn cycle_is_reported_with_its_path() {
    let doc = r#"
name: cyc
steps:
  - { name: a, command: "echo", dependsOn: [b] }
  - { name: b, command: "echo", dependsOn: [a] }
"#;
    let parsed = parse_recipe_str(doc, DocumentFormat::Yaml).unwrap();
    let err = plan_steps(&parsed.recipe.steps).unwrap_err();
    assert_eq!(err, PlanError::Cycle(names(&["a", "b", "a"])));
    assert_eq!(err.to_string(), "circular step dependency: a -> b -> a");

    let outcome = plan_recipe(&parsed.recipe).unwrap();
    assert!(!outcome.validation.is_valid);
    assert!(outcome.plan.is_none());
}

#[test]
fn self_dependency_is_a_cycle() {
    let doc = r#"
name: me
steps:
  - { name: a, command: "echo", dependsOn: [a] }
"#;
    let parsed = parse_recipe_str(doc, DocumentFormat::Yaml).unwrap();
    assert_eq!(
        plan_steps(&parsed.recipe.steps).unwrap_err(),
        PlanError::Cycle(names(&["a", "a"]))
    );
}

#[test]
fn undeclared_variables_become_warnings() {
    let doc = r#"
name: warn
variables:
  name: { type: string, default: x }
steps:
  - name: ask
    variable: color
    message: Favourite colour?
  - name: out
    command: "echo {{ name }} {{ color }} {{ missing }}"
    dependsOn: [ask]
"#;
    let outcome = plan_from_str(doc, DocumentFormat::Yaml).unwrap();
    assert!(outcome.validation.is_valid);
    assert_eq!(outcome.validation.warnings.len(), 1);
    assert!(outcome.validation.warnings[0].contains("missing"));
    let plan = outcome.plan.unwrap();
    assert!(plan.undeclared_variables.contains("missing"));
    assert!(!plan.undeclared_variables.contains("color"));
}

#[test]
fn dot_output_lists_edges() {
    let doc = r#"
name: dot
steps:
  - { name: a, command: "echo" }
  - { name: b, command: "echo", dependsOn: [a] }
"#;
    let outcome = plan_from_str(doc, DocumentFormat::Yaml).unwrap();
    let dot = scaffold_core::planner::render_outcome(&outcome, PlanFormat::Dot).unwrap();
    assert!(dot.contains("\"a\" -> \"b\";"));
    let text = scaffold_core::planner::render_outcome(&outcome, PlanFormat::Text).unwrap();
    assert!(text.contains("wave 2:"));
    assert!(text.contains("- b [shell] after a"));
}
