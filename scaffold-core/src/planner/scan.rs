use std::collections::{BTreeMap, BTreeSet};

use serde_json::Value;

use crate::expressions::{parse_expression, parse_template, Expr, PathSegment, Segment};
use crate::types::{AiOutput, Recipe, Step, StepKind};

/// Name under which prior step outcomes are exposed to expressions.
pub const STEPS_SCOPE: &str = "steps";

#[derive(Debug, Default)]
pub(crate) struct ScanResult {
    /// Steps read through `steps.<name>` in a step's `when` or interpolations.
    pub step_references: BTreeMap<String, Vec<String>>,
    pub referenced_variables_by_step: BTreeMap<String, BTreeSet<String>>,
    /// Variables written by steps at run time (prompts, captures, AI answers...).
    pub produced_variables: BTreeSet<String>,
}

pub(crate) fn scan_steps(steps: &[Step]) -> ScanResult {
    let mut out = ScanResult::default();
    for step in steps {
        let mut step_refs = BTreeSet::new();
        let mut vars = BTreeSet::new();
        scan_step(step, &mut step_refs, &mut vars, &mut out.produced_variables);
        out.step_references
            .insert(step.name.clone(), step_refs.into_iter().collect());
        out.referenced_variables_by_step.insert(step.name.clone(), vars);
    }
    out
}

/// Referenced variables that are neither declared by the recipe nor written by a step.
pub(crate) fn undeclared_variables(recipe: &Recipe, scan: &ScanResult) -> BTreeMap<String, BTreeSet<String>> {
    scan.referenced_variables_by_step
        .iter()
        .filter_map(|(step, vars)| {
            let missing: BTreeSet<String> = vars
                .iter()
                .filter(|v| !recipe.variables.contains_key(*v) && !scan.produced_variables.contains(*v))
                .cloned()
                .collect();
            (!missing.is_empty()).then(|| (step.clone(), missing))
        })
        .collect()
}

fn scan_step(
    step: &Step,
    step_refs: &mut BTreeSet<String>,
    vars: &mut BTreeSet<String>,
    produced: &mut BTreeSet<String>,
) {
    if let Some(when) = &step.when {
        if let Ok(expr) = parse_expression(when) {
            scan_expr(&expr, step_refs, vars);
        }
    }

    match &step.kind {
        StepKind::Sequence(g) | StepKind::Parallel(g) => {
            for child in &g.steps {
                scan_step(child, step_refs, vars, produced);
            }
            return;
        }
        StepKind::Prompt(p) => {
            produced.insert(p.variable.clone());
        }
        StepKind::Shell(s) => {
            if let Some(v) = &s.capture_as {
                produced.insert(v.clone());
            }
        }
        StepKind::Ai(a) => {
            if let Some(AiOutput::Variable { variable }) = &a.output {
                produced.insert(variable.clone());
            }
        }
        StepKind::Query(q) => {
            produced.extend(q.checks.iter().filter_map(|c| c.variable.clone()));
        }
        StepKind::Action(a) if a.action == "set-variables" => {
            produced.extend(a.parameters.keys().cloned());
        }
        _ => {}
    }

    // Tool payloads are walked generically; every string may carry `{{ }}`.
    if let Ok(payload) = serde_json::to_value(&step.kind) {
        scan_value(&payload, step_refs, vars);
    }
}

fn scan_value(value: &Value, step_refs: &mut BTreeSet<String>, vars: &mut BTreeSet<String>) {
    match value {
        Value::String(s) if s.contains("{{") => {
            if let Ok(tpl) = parse_template(s) {
                for seg in &tpl.segments {
                    if let Segment::Expr { expr, .. } = seg {
                        scan_expr(expr, step_refs, vars);
                    }
                }
            }
        }
        Value::Array(arr) => arr.iter().for_each(|v| scan_value(v, step_refs, vars)),
        Value::Object(map) => map.values().for_each(|v| scan_value(v, step_refs, vars)),
        _ => {}
    }
}

fn scan_expr(expr: &Expr, step_refs: &mut BTreeSet<String>, vars: &mut BTreeSet<String>) {
    for path in expr.paths() {
        match path {
            [PathSegment::Key(root), PathSegment::Key(step), ..] if root == STEPS_SCOPE => {
                step_refs.insert(step.clone());
            }
            [PathSegment::Key(root), ..] if root != STEPS_SCOPE => {
                vars.insert(root.clone());
            }
            _ => {}
        }
    }
}
