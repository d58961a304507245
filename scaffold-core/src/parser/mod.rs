use std::path::Path;

use serde_json::{Map, Value};

use crate::error::{ParseError, ValidationError, Violation};
use crate::types::{Recipe, ToolType};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    Json,
    Yaml,
    Auto,
}

impl DocumentFormat {
    /// Pick a format from a file extension, falling back to auto-detection.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Self::Json,
            Some("yml") | Some("yaml") => Self::Yaml,
            _ => Self::Auto,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ParsedRecipe {
    pub recipe: Recipe,
    pub format: DocumentFormat,
}

pub fn parse_recipe_str(input: &str, format: DocumentFormat) -> Result<ParsedRecipe, ParseError> {
    let (raw, format) = match format {
        DocumentFormat::Json => (serde_json::from_str::<Value>(input)?, format),
        DocumentFormat::Yaml => (serde_yaml::from_str::<Value>(input)?, format),
        DocumentFormat::Auto => parse_value_auto(input)?,
    };
    let recipe = recipe_from_value(raw)?;
    Ok(ParsedRecipe { recipe, format })
}

/// Build a recipe from an already-decoded document, inferring missing `tool` fields.
pub fn recipe_from_value(mut raw: Value) -> Result<Recipe, ParseError> {
    let Some(root) = raw.as_object_mut() else {
        return Err(ParseError::NotAMapping);
    };

    let mut violations = Vec::new();
    if let Some(steps) = root.get_mut("steps") {
        normalize_steps(steps, "steps", &mut violations);
    }
    if !violations.is_empty() {
        return Err(ParseError::StepShape(ValidationError::new(violations)));
    }

    Ok(serde_json::from_value::<Recipe>(raw)?)
}

fn parse_value_auto(input: &str) -> Result<(Value, DocumentFormat), ParseError> {
    // JSON always starts with `{` or `[` after trimming.
    let trimmed = input.trim_start();
    if trimmed.starts_with('{') || trimmed.starts_with('[') {
        return match serde_json::from_str::<Value>(input) {
            Ok(v) => Ok((v, DocumentFormat::Json)),
            Err(e) => match serde_yaml::from_str::<Value>(input) {
                Ok(v) => Ok((v, DocumentFormat::Yaml)),
                Err(_) => Err(ParseError::Json(e)),
            },
        };
    }

    match serde_yaml::from_str::<Value>(input) {
        Ok(v) => Ok((v, DocumentFormat::Yaml)),
        Err(e) => {
            if let Ok(v) = serde_json::from_str::<Value>(input) {
                return Ok((v, DocumentFormat::Json));
            }
            Err(ParseError::Yaml(e))
        }
    }
}

fn normalize_steps(steps: &mut Value, path: &str, violations: &mut Vec<Violation>) {
    let Some(list) = steps.as_array_mut() else {
        violations.push(Violation::new(path, "must be a list of steps"));
        return;
    };

    for (idx, step) in list.iter_mut().enumerate() {
        let spath = format!("{path}[{idx}]");
        let Some(obj) = step.as_object_mut() else {
            violations.push(Violation::new(spath, "step must be a mapping"));
            continue;
        };

        let tool = match obj.get("tool") {
            Some(Value::String(t)) => match ToolType::parse(t) {
                Some(tool) => tool,
                None => {
                    violations.push(Violation::new(
                        format!("{spath}.tool"),
                        format!("unknown tool '{t}'"),
                    ));
                    continue;
                }
            },
            Some(_) => {
                violations.push(Violation::new(format!("{spath}.tool"), "must be a string"));
                continue;
            }
            None => match infer_tool(obj) {
                Some(tool) => {
                    obj.insert("tool".to_string(), Value::String(tool.as_str().to_string()));
                    tool
                }
                None => {
                    violations.push(Violation::new(
                        spath,
                        "cannot infer the tool for this step; set `tool` explicitly",
                    ));
                    continue;
                }
            },
        };

        if matches!(tool, ToolType::Sequence | ToolType::Parallel) {
            if let Some(nested) = obj.get_mut("steps") {
                normalize_steps(nested, &format!("{spath}.steps"), violations);
            }
        }
    }
}

/// Infer a step's tool from the tool-specific fields it carries.
pub fn infer_tool(step: &Map<String, Value>) -> Option<ToolType> {
    let has = |k: &str| step.contains_key(k);

    if has("recipe") {
        Some(ToolType::Recipe)
    } else if has("template") || has("content") {
        Some(ToolType::Template)
    } else if has("action") {
        Some(ToolType::Action)
    } else if has("transform") {
        Some(ToolType::Transform)
    } else if has("command") {
        Some(ToolType::Shell)
    } else if has("query") || has("checks") || has("patch") {
        Some(ToolType::Query)
    } else if has("directories") {
        Some(ToolType::Directory)
    } else if has("packages") {
        Some(ToolType::Install)
    } else if has("variable") && has("message") {
        Some(ToolType::Prompt)
    } else if has("prompt") {
        Some(ToolType::Ai)
    } else if has("steps") {
        Some(ToolType::Sequence)
    } else {
        None
    }
}
