use std::collections::HashSet;

use crate::planner::{find_step_cycle, format_cycle};
use crate::types::Step;
use crate::validate::rules::{common::validate_condition, tools};
use crate::validate::validator::{Validator, STEP_NAME_RE};

/// Check a sibling list: unique names, known dependencies, no cycles, then each step.
pub(crate) fn validate_step_list(v: &mut Validator, steps: &[Step], path: &str) {
    let mut names = HashSet::<&str>::new();
    for (idx, s) in steps.iter().enumerate() {
        let spath = format!("{path}[{idx}]");
        if s.name.trim().is_empty() {
            v.push(format!("{spath}.name"), "must not be empty");
        } else if !STEP_NAME_RE.is_match(&s.name) {
            v.push(format!("{spath}.name"), "must match regex [A-Za-z0-9_\\-\\.]+");
        }
        if !s.name.is_empty() && !names.insert(s.name.as_str()) {
            v.push(
                format!("{spath}.name"),
                format!("duplicate step name '{}'", s.name),
            );
        }
    }

    for (idx, s) in steps.iter().enumerate() {
        let spath = format!("{path}[{idx}]");
        for (didx, dep) in s.depends_on.iter().enumerate() {
            if !names.contains(dep.as_str()) {
                v.push(
                    format!("{spath}.dependsOn[{didx}]"),
                    format!("references unknown step '{dep}'"),
                );
            }
        }
        validate_step(v, s, &spath);
    }

    if let Some(cycle) = find_step_cycle(steps) {
        v.push(
            path,
            format!("circular step dependency: {}", format_cycle(&cycle)),
        );
    }
}

pub(crate) fn validate_step(v: &mut Validator, step: &Step, path: &str) {
    if let Some(when) = &step.when {
        validate_condition(v, &format!("{path}.when"), when);
    }
    if step.timeout == Some(0) {
        v.push(format!("{path}.timeout"), "must be greater than 0");
    }

    tools::validate_tool_fields(v, step, path);
}
