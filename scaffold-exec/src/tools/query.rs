use std::path::Path;

use async_trait::async_trait;
use regex::Regex;
use scaffold_core::expressions::{value_to_string, DocPath};
use scaffold_core::types::{PatchOp, QueryStep, Step, StepKind, ToolType};
use serde_json::{json, Value};

use crate::executor::StepContext;
use crate::tool::{
    validate_shape, ResourceRequirements, ResourceScope, Tool, ToolError, ToolOutput,
    ToolValidation,
};
use crate::tools::fs::write_atomic;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Format {
    Json,
    Yaml,
}

impl Format {
    fn from_path(path: &Path) -> Option<Self> {
        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Some(Self::Json),
            Some("yml" | "yaml") => Some(Self::Yaml),
            _ => None,
        }
    }
}

fn parse(content: &str, hint: Option<Format>) -> Result<(Value, Format), ToolError> {
    let as_json = || serde_json::from_str::<Value>(content).map(|v| (v, Format::Json));
    let as_yaml = || serde_yaml::from_str::<Value>(content).map(|v| (v, Format::Yaml));
    match hint {
        Some(Format::Json) => as_json().map_err(|e| ToolError::syntax(e.to_string())),
        Some(Format::Yaml) => as_yaml().map_err(|e| ToolError::syntax(e.to_string())),
        None => as_json()
            .or_else(|_| as_yaml())
            .map_err(|e| ToolError::syntax(e.to_string())),
    }
}

fn serialize(doc: &Value, format: Format) -> Result<String, ToolError> {
    match format {
        Format::Json => serde_json::to_string_pretty(doc)
            .map(|s| s + "\n")
            .map_err(|e| ToolError::execution(e.to_string())),
        Format::Yaml => serde_yaml::to_string(doc).map_err(|e| ToolError::execution(e.to_string())),
    }
}

/// Reads a JSON or YAML document, checks values in it and optionally patches it.
#[derive(Debug, Default)]
pub struct QueryTool;

#[async_trait]
impl Tool for QueryTool {
    fn tool_type(&self) -> ToolType {
        ToolType::Query
    }

    fn validate(&self, step: &Step, _ctx: &StepContext) -> ToolValidation {
        let mut v = validate_shape(ToolType::Query, step).with_requirements(ResourceRequirements {
            filesystem: true,
            ..Default::default()
        });
        if let StepKind::Query(q) = &step.kind {
            for check in &q.checks {
                if let Some(pattern) = &check.matches {
                    if let Err(e) = Regex::new(pattern) {
                        v.error(format!("check on '{}': invalid pattern: {e}", check.path));
                    }
                }
            }
            if q.checks.is_empty() && q.patch.is_empty() {
                v.warn("query step has neither checks nor patches");
            }
        }
        v
    }

    async fn execute(
        &self,
        step: &Step,
        ctx: &StepContext,
        scope: &ResourceScope,
    ) -> Result<ToolOutput, ToolError> {
        let StepKind::Query(q) = &step.kind else {
            return Err(ToolError::configuration("not a query step"));
        };
        let path = ctx.resolve_path(&ctx.interpolate(&q.file)?);
        let shown = ctx.display_path(&path);
        let hint = Format::from_path(&path);

        let existed = tokio::fs::try_exists(&path).await.unwrap_or(false);
        let (mut doc, format) = if existed {
            let content = tokio::fs::read_to_string(&path).await?;
            parse(&content, hint).map_err(|e| ToolError::syntax(format!("{shown}: {}", e.message)))?
        } else if q.checks.is_empty() {
            (json!({}), hint.unwrap_or(Format::Json))
        } else {
            return Err(ToolError::resolution(format!("{shown} does not exist")));
        };

        let checks = run_checks(q, &doc, ctx)?;
        let failed: Vec<&Value> = checks
            .iter()
            .filter(|c| c["passed"] == json!(false) && c["required"] == json!(true))
            .collect();
        if !failed.is_empty() {
            let paths: Vec<String> = failed.iter().map(|c| value_to_string(&c["path"])).collect();
            return Err(ToolError::execution(format!(
                "{shown}: checks failed for {}",
                paths.join(", ")
            ))
            .with_details(json!({ "checks": checks })));
        }

        let original = doc.clone();
        for patch in &q.patch {
            apply_patch(&mut doc, patch.op, &patch.path, patch.value.as_ref(), ctx)?;
        }
        let changed = doc != original || (!existed && !q.patch.is_empty());

        let mut out = ToolOutput::with_data(json!({
            "file": shown,
            "checks": checks,
            "patched": q.patch.len(),
            "changed": changed,
        }));
        if changed && !ctx.flags.dry_run {
            write_atomic(&path, &serialize(&doc, format)?, scope).await?;
            out = if existed { out.modified(shown) } else { out.created(shown) };
        }
        Ok(out)
    }
}

fn run_checks(q: &QueryStep, doc: &Value, ctx: &StepContext) -> Result<Vec<Value>, ToolError> {
    let mut results = Vec::with_capacity(q.checks.len());
    for check in &q.checks {
        let path = DocPath::parse(&ctx.interpolate(&check.path)?)
            .map_err(|e| ToolError::syntax(e.to_string()))?;
        let found = path.get(doc);

        let mut passed = true;
        if let Some(expected) = check.exists {
            passed &= found.is_some() == expected;
        }
        if let Some(expected) = &check.equals {
            passed &= found == Some(&ctx.interpolate_value(expected)?);
        }
        if let Some(pattern) = &check.matches {
            let re = Regex::new(pattern).map_err(|e| ToolError::syntax(e.to_string()))?;
            passed &= found.is_some_and(|v| re.is_match(&value_to_string(v)));
        }
        if let Some(var) = &check.variable {
            ctx.set_variable(var.clone(), found.cloned().unwrap_or(Value::Null));
        }

        results.push(json!({
            "path": check.path,
            "passed": passed,
            "required": check.required,
            "value": found,
        }));
    }
    Ok(results)
}

fn apply_patch(
    doc: &mut Value,
    op: PatchOp,
    path: &str,
    value: Option<&Value>,
    ctx: &StepContext,
) -> Result<(), ToolError> {
    let path = DocPath::parse(&ctx.interpolate(path)?).map_err(|e| ToolError::syntax(e.to_string()))?;
    let value = value.map(|v| ctx.interpolate_value(v)).transpose()?;
    let invalid = |e: scaffold_core::expressions::DocPathError| ToolError::invalid_parameter(e.to_string());

    match op {
        PatchOp::Remove => {
            path.remove(doc);
        }
        PatchOp::Set => path.set(doc, value.unwrap_or(Value::Null)).map_err(invalid)?,
        PatchOp::Merge => {
            let Some(Value::Object(incoming)) = value else {
                return Err(ToolError::invalid_parameter(format!(
                    "merge at '{}' needs an object value",
                    path.to_pointer()
                )));
            };
            match path.get(doc).cloned() {
                Some(Value::Object(mut existing)) => {
                    existing.extend(incoming);
                    path.set(doc, Value::Object(existing)).map_err(invalid)?;
                }
                _ => path.set(doc, Value::Object(incoming)).map_err(invalid)?,
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_follows_extension_then_content() {
        let (v, f) = parse("name: demo\n", None).unwrap();
        assert_eq!(f, Format::Yaml);
        assert_eq!(v["name"], "demo");

        let (_, f) = parse("{\"a\": 1}", None).unwrap();
        assert_eq!(f, Format::Json);

        assert!(parse("a: [", Some(Format::Yaml)).is_err());
    }

    #[test]
    fn json_output_ends_with_newline() {
        let s = serialize(&json!({"a": 1}), Format::Json).unwrap();
        assert!(s.ends_with("}\n"));
    }
}
