mod dependency;
mod format;
mod model;
mod scan;

use std::collections::{BTreeMap, BTreeSet};

use crate::error::ParseError;
use crate::parser::{parse_recipe_str, DocumentFormat};
use crate::types::{Recipe, Step};
use crate::validate::validate_recipe;

pub use format::{render_outcome, render_plan_text, PlanFormat};
pub use model::{DependencyGraph, ExecutionPlan, PlannedStep, PlanningOutcome, ValidationSummary};
pub use scan::STEPS_SCOPE;

/// Dependency edges among `steps`, declared and implicit, limited to known names.
pub(crate) fn dependency_edges(steps: &[Step]) -> (Vec<String>, BTreeMap<String, Vec<String>>) {
    let scan = scan::scan_steps(steps);
    let names: Vec<String> = steps.iter().map(|s| s.name.clone()).collect();
    let mut edges = BTreeMap::new();
    for step in steps {
        let mut deps: Vec<String> = Vec::new();
        let implicit = scan
            .step_references
            .get(&step.name)
            .into_iter()
            .flatten()
            .filter(|d| **d != step.name);
        for dep in step.depends_on.iter().chain(implicit) {
            if names.contains(dep) && !deps.contains(dep) {
                deps.push(dep.clone());
            }
        }
        edges.insert(step.name.clone(), deps);
    }
    (names, edges)
}

pub(crate) fn find_step_cycle(steps: &[Step]) -> Option<Vec<String>> {
    let (names, edges) = dependency_edges(steps);
    dependency::find_cycle(&names, &edges)
}

/// Build the wave graph for one step list (a recipe's steps or a group's children).
pub fn plan_steps(steps: &[Step]) -> Result<DependencyGraph, PlanError> {
    let scan = scan::scan_steps(steps);
    dependency::build_step_dependency_graph(steps, &scan.step_references)
}

pub fn plan_from_str(input: &str, format: DocumentFormat) -> Result<PlanningOutcome, PlanError> {
    let parsed = parse_recipe_str(input, format)?;
    plan_recipe(&parsed.recipe)
}

/// Validate `recipe` and, when valid, produce its execution plan.
pub fn plan_recipe(recipe: &Recipe) -> Result<PlanningOutcome, PlanError> {
    let mut validation = match validate_recipe(recipe) {
        Ok(()) => ValidationSummary::valid(),
        Err(e) => ValidationSummary::invalid_from(e),
    };

    if !validation.is_valid {
        return Ok(PlanningOutcome {
            validation,
            plan: None,
        });
    }

    let scan = scan::scan_steps(&recipe.steps);
    let graph = dependency::build_step_dependency_graph(&recipe.steps, &scan.step_references)?;
    let undeclared_by_step = scan::undeclared_variables(recipe, &scan);

    for (step, vars) in &undeclared_by_step {
        let names: Vec<&str> = vars.iter().map(String::as_str).collect();
        validation.warnings.push(format!(
            "step '{step}' reads undeclared variables: {}",
            names.join(", ")
        ));
    }

    let steps = recipe
        .steps
        .iter()
        .map(|s| PlannedStep {
            name: s.name.clone(),
            tool: s.tool_type(),
            wave: graph.wave_of(&s.name).unwrap_or(0),
            depends_on: graph.depends_on.get(&s.name).cloned().unwrap_or_default(),
            parallel: s.parallel,
            when: s.when.clone(),
            referenced_variables: scan
                .referenced_variables_by_step
                .get(&s.name)
                .cloned()
                .unwrap_or_default(),
            children: s.children().map(<[Step]>::len),
        })
        .collect();

    let undeclared_variables: BTreeSet<String> =
        undeclared_by_step.into_values().flatten().collect();

    Ok(PlanningOutcome {
        validation,
        plan: Some(ExecutionPlan {
            recipe: recipe.name.clone(),
            graph,
            steps,
            undeclared_variables,
        }),
    })
}

/// Render a cycle path as `a -> b -> a`.
pub fn format_cycle(path: &[String]) -> String {
    path.join(" -> ")
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PlanError {
    #[error("{0}")]
    Parse(String),

    #[error("duplicate step name '{0}'")]
    DuplicateStep(String),

    #[error("step '{step}' depends on unknown step '{dependency}'")]
    UnknownDependency { step: String, dependency: String },

    #[error("circular step dependency: {}", format_cycle(.0))]
    Cycle(Vec<String>),
}

impl From<ParseError> for PlanError {
    fn from(e: ParseError) -> Self {
        PlanError::Parse(e.to_string())
    }
}
