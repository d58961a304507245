use crate::types::{
    AiOutput, InjectPosition, PatchOp, PromptType, Step, StepKind, TransformKind,
};
use crate::validate::rules::common::{
    validate_doc_path, validate_regex, validate_template_string, validate_value_exprs,
};
use crate::validate::rules::step::validate_step_list;
use crate::validate::validator::Validator;

const PACKAGE_MANAGERS: [&str; 5] = ["npm", "yarn", "pnpm", "cargo", "pip"];

pub(crate) fn validate_tool_fields(v: &mut Validator, step: &Step, path: &str) {
    match &step.kind {
        StepKind::Template(t) => {
            match (&t.template, &t.content) {
                (None, None) => v.push(path, "template step needs `template` or `content`"),
                (Some(_), Some(_)) => {
                    v.push(path, "template step takes `template` or `content`, not both")
                }
                (Some(file), None) => v.require_non_empty(&format!("{path}.template"), file),
                (None, Some(_)) => {}
            }
            v.require_non_empty(&format!("{path}.output"), &t.output);
            validate_template_string(v, &format!("{path}.output"), &t.output);
            for (k, val) in &t.variables {
                validate_value_exprs(v, &format!("{path}.variables.{k}"), val);
            }
        }
        StepKind::Action(a) => {
            v.require_non_empty(&format!("{path}.action"), &a.action);
            for (k, val) in &a.parameters {
                validate_value_exprs(v, &format!("{path}.parameters.{k}"), val);
            }
        }
        StepKind::Transform(t) => {
            let ppath = format!("{path}.parameters");
            match t.kind() {
                None => v.push(
                    format!("{path}.transform"),
                    format!(
                        "unknown transform '{}' (expected replace, insert, append, prepend or delete)",
                        t.transform
                    ),
                ),
                Some(TransformKind::Replace) => {
                    require_param(v, &ppath, &t.parameters, "pattern");
                    require_param(v, &ppath, &t.parameters, "replacement");
                }
                Some(TransformKind::Insert) => {
                    require_param(v, &ppath, &t.parameters, "content");
                    match t.parameters.get("position").and_then(|p| p.as_str()) {
                        Some("before") | Some("after") => require_param(v, &ppath, &t.parameters, "anchor"),
                        Some("start") | Some("end") | None => {}
                        Some(other) => v.push(
                            format!("{ppath}.position"),
                            format!("unknown position '{other}'"),
                        ),
                    }
                }
                Some(TransformKind::Append) | Some(TransformKind::Prepend) => {
                    require_param(v, &ppath, &t.parameters, "content");
                }
                Some(TransformKind::Delete) => require_param(v, &ppath, &t.parameters, "pattern"),
            }
            if let Some(pattern) = t.parameters.get("pattern").and_then(|p| p.as_str()) {
                validate_regex(v, &format!("{ppath}.pattern"), pattern);
            }
            if t.files.is_empty() {
                v.push(format!("{path}.files"), "must have at least one entry");
            }
            for (i, f) in t.files.iter().enumerate() {
                validate_template_string(v, &format!("{path}.files[{i}]"), f);
            }
        }
        StepKind::Recipe(r) => {
            v.require_non_empty(&format!("{path}.recipe"), &r.recipe);
            validate_template_string(v, &format!("{path}.recipe"), &r.recipe);
            for (k, val) in &r.variables {
                validate_value_exprs(v, &format!("{path}.variables.{k}"), val);
            }
            for (from, to) in &r.variable_mapping {
                if from.trim().is_empty() || to.trim().is_empty() {
                    v.push(
                        format!("{path}.variableMapping"),
                        "mapping entries need non-empty parent and child names",
                    );
                }
            }
        }
        StepKind::Shell(s) => {
            v.require_non_empty(&format!("{path}.command"), &s.command);
            validate_template_string(v, &format!("{path}.command"), &s.command);
            if let Some(c) = &s.capture_as {
                v.require_non_empty(&format!("{path}.captureAs"), c);
            }
        }
        StepKind::Query(q) => {
            v.require_non_empty(&format!("{path}.file"), &q.file);
            if q.checks.is_empty() && q.patch.is_empty() {
                v.push(path, "query step needs `checks` or `patch`");
            }
            for (i, c) in q.checks.iter().enumerate() {
                let cpath = format!("{path}.checks[{i}]");
                validate_doc_path(v, &format!("{cpath}.path"), &c.path);
                if let Some(m) = &c.matches {
                    validate_regex(v, &format!("{cpath}.matches"), m);
                }
            }
            for (i, p) in q.patch.iter().enumerate() {
                let ppath = format!("{path}.patch[{i}]");
                validate_doc_path(v, &format!("{ppath}.path"), &p.path);
                match (p.op, &p.value) {
                    (PatchOp::Set, None) => v.push(format!("{ppath}.value"), "`set` needs a value"),
                    (PatchOp::Merge, Some(val)) if !val.is_object() => {
                        v.push(format!("{ppath}.value"), "`merge` needs an object value")
                    }
                    (PatchOp::Merge, None) => v.push(format!("{ppath}.value"), "`merge` needs a value"),
                    _ => {}
                }
            }
        }
        StepKind::Directory(d) => {
            if d.directories.is_empty() {
                v.push(format!("{path}.directories"), "must have at least one entry");
            }
            for (i, dir) in d.directories.iter().enumerate() {
                v.require_non_empty(&format!("{path}.directories[{i}]"), dir);
            }
        }
        StepKind::Install(i) => {
            if i.packages.is_empty() {
                v.push(format!("{path}.packages"), "must have at least one entry");
            }
            if let Some(m) = &i.manager {
                if !PACKAGE_MANAGERS.contains(&m.as_str()) {
                    v.push(
                        format!("{path}.manager"),
                        format!("unknown package manager '{m}' (expected {})", PACKAGE_MANAGERS.join(", ")),
                    );
                }
            }
        }
        StepKind::Prompt(p) => {
            v.require_non_empty(&format!("{path}.variable"), &p.variable);
            v.require_non_empty(&format!("{path}.message"), &p.message);
            if p.prompt_type == PromptType::Select && p.choices.is_empty() {
                v.push(format!("{path}.choices"), "select prompts need at least one choice");
            }
        }
        StepKind::Ai(a) => {
            v.require_non_empty(&format!("{path}.prompt"), &a.prompt);
            validate_template_string(v, &format!("{path}.prompt"), &a.prompt);
            if let Some(key) = &a.key {
                v.require_non_empty(&format!("{path}.key"), key);
            }
            let opath = format!("{path}.output");
            match &a.output {
                Some(AiOutput::Variable { variable }) => {
                    v.require_non_empty(&format!("{opath}.variable"), variable)
                }
                Some(AiOutput::File { path: p }) => v.require_non_empty(&format!("{opath}.path"), p),
                Some(AiOutput::Inject {
                    path: p,
                    anchor,
                    position,
                }) => {
                    v.require_non_empty(&format!("{opath}.path"), p);
                    if matches!(position, Some(InjectPosition::Before | InjectPosition::After))
                        && anchor.as_deref().map_or(true, |a| a.is_empty())
                    {
                        v.push(format!("{opath}.anchor"), "before/after injection needs an anchor");
                    }
                }
                Some(AiOutput::Stdout) | None => {}
            }
        }
        StepKind::Sequence(g) | StepKind::Parallel(g) => {
            if g.steps.is_empty() {
                v.push(format!("{path}.steps"), "must have at least one entry");
            }
            validate_step_list(v, &g.steps, &format!("{path}.steps"));
        }
    }
}

fn require_param(
    v: &mut Validator,
    path: &str,
    params: &std::collections::BTreeMap<String, serde_json::Value>,
    key: &str,
) {
    match params.get(key) {
        Some(serde_json::Value::String(_)) => {}
        Some(_) => v.push(format!("{path}.{key}"), "must be a string"),
        None => v.push(format!("{path}.{key}"), "is required"),
    }
}
