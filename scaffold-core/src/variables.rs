//! Coercion and constraint checking for declared recipe variables.

use regex::Regex;
use serde_json::Value;

use crate::error::Violation;
use crate::types::{VariableSpec, VariableType};

/// Coerce a raw override to the variable's declared type.
///
/// Only strings are coerced; other JSON values pass through and are caught by
/// [`check_value`] if they have the wrong type.
pub fn coerce_value(spec: &VariableSpec, value: Value) -> Result<Value, String> {
    let Value::String(raw) = &value else {
        return Ok(value);
    };
    match spec.kind() {
        Some(VariableType::Number) => {
            let n = raw
                .trim()
                .parse::<f64>()
                .map_err(|_| format!("'{raw}' is not a number"))?;
            Ok(if n.fract() == 0.0 && n.abs() < 9.0e15 {
                Value::from(n as i64)
            } else {
                serde_json::Number::from_f64(n)
                    .map(Value::Number)
                    .ok_or_else(|| format!("'{raw}' is not a finite number"))?
            })
        }
        Some(VariableType::Boolean) => match raw.trim().to_ascii_lowercase().as_str() {
            "true" | "yes" | "y" | "1" | "on" => Ok(Value::Bool(true)),
            "false" | "no" | "n" | "0" | "off" => Ok(Value::Bool(false)),
            _ => Err(format!("'{raw}' is not a boolean")),
        },
        Some(VariableType::Array) => {
            let trimmed = raw.trim();
            if trimmed.starts_with('[') {
                if let Ok(v @ Value::Array(_)) = serde_json::from_str::<Value>(trimmed) {
                    return Ok(v);
                }
            }
            if trimmed.is_empty() {
                return Ok(Value::Array(Vec::new()));
            }
            Ok(Value::Array(
                trimmed
                    .split(',')
                    .map(|s| Value::String(s.trim().to_string()))
                    .collect(),
            ))
        }
        _ => Ok(value),
    }
}

/// Check a resolved value against every constraint the variable declares.
pub fn check_value(name: &str, spec: &VariableSpec, value: &Value) -> Vec<Violation> {
    let path = format!("variables.{name}");
    let mut out = Vec::new();

    let Some(kind) = spec.kind() else {
        out.push(Violation::new(&path, format!("unknown variable type '{}'", spec.var_type)));
        return out;
    };

    match (kind, value) {
        (VariableType::String, Value::String(s)) => {
            if let Some(pattern) = &spec.pattern {
                match Regex::new(pattern) {
                    Ok(re) if !re.is_match(s) => out.push(Violation::new(
                        &path,
                        format!("value '{s}' does not match pattern '{pattern}'"),
                    )),
                    Ok(_) => {}
                    Err(e) => out.push(Violation::new(&path, format!("invalid pattern: {e}"))),
                }
            }
            check_range(&path, spec, s.chars().count() as f64, "length", &mut out);
        }
        (VariableType::Number, Value::Number(n)) => {
            if let Some(f) = n.as_f64() {
                check_range(&path, spec, f, "value", &mut out);
            }
        }
        (VariableType::Boolean, Value::Bool(_)) => {}
        (VariableType::Enum, Value::String(s)) => {
            if !spec.values.iter().any(|v| v == s) {
                out.push(Violation::new(
                    &path,
                    format!("'{s}' is not one of [{}]", spec.values.join(", ")),
                ));
            }
        }
        (VariableType::Array, Value::Array(items)) => {
            check_range(&path, spec, items.len() as f64, "length", &mut out);
        }
        (kind, other) => out.push(Violation::new(
            &path,
            format!("expected {}, got {}", kind.as_str(), json_type(other)),
        )),
    }

    out
}

/// Check the declaration itself: known type, compilable pattern, sane bounds,
/// enum values present and a default that satisfies the constraints.
pub fn check_spec(name: &str, spec: &VariableSpec) -> Vec<Violation> {
    let path = format!("variables.{name}");
    let mut out = Vec::new();

    if name.trim().is_empty() {
        out.push(Violation::new("variables", "variable name must not be empty"));
    }

    let Some(kind) = spec.kind() else {
        out.push(Violation::new(
            format!("{path}.type"),
            format!(
                "unknown variable type '{}' (expected string, number, boolean, enum or array)",
                spec.var_type
            ),
        ));
        return out;
    };

    if let Some(pattern) = &spec.pattern {
        if let Err(e) = Regex::new(pattern) {
            out.push(Violation::new(format!("{path}.pattern"), format!("invalid regex: {e}")));
        }
        if kind != VariableType::String {
            out.push(Violation::new(
                format!("{path}.pattern"),
                "pattern only applies to string variables",
            ));
        }
    }

    if let (Some(min), Some(max)) = (spec.min, spec.max) {
        if min > max {
            out.push(Violation::new(&path, format!("min ({min}) is greater than max ({max})")));
        }
    }

    if kind == VariableType::Enum && spec.values.is_empty() {
        out.push(Violation::new(format!("{path}.values"), "enum variables need at least one value"));
    }

    if let Some(default) = &spec.default {
        // Pattern errors were reported above.
        if out.is_empty() {
            for v in check_value(name, spec, default) {
                out.push(Violation::new(format!("{path}.default"), v.message));
            }
        }
    }

    out
}

fn check_range(path: &str, spec: &VariableSpec, n: f64, what: &str, out: &mut Vec<Violation>) {
    if let Some(min) = spec.min {
        if n < min {
            out.push(Violation::new(path, format!("{what} {n} is below minimum {min}")));
        }
    }
    if let Some(max) = spec.max {
        if n > max {
            out.push(Violation::new(path, format!("{what} {n} is above maximum {max}")));
        }
    }
}

fn json_type(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn coerces_strings_to_declared_types() {
        let num = VariableSpec::of_type(VariableType::Number);
        assert_eq!(coerce_value(&num, json!("3")).unwrap(), json!(3));
        let flag = VariableSpec::of_type(VariableType::Boolean);
        assert_eq!(coerce_value(&flag, json!("true")).unwrap(), json!(true));
        let list = VariableSpec::of_type(VariableType::Array);
        assert_eq!(coerce_value(&list, json!("a, b")).unwrap(), json!(["a", "b"]));
        assert!(coerce_value(&num, json!("abc")).is_err());
    }

    #[test]
    fn enforces_pattern_and_bounds() {
        let mut s = VariableSpec::of_type(VariableType::String);
        s.pattern = Some("^[A-Z]".into());
        assert!(check_value("title", &s, &json!("Hello")).is_empty());
        assert_eq!(check_value("title", &s, &json!("hello")).len(), 1);

        let mut n = VariableSpec::of_type(VariableType::Number);
        n.min = Some(1.0);
        n.max = Some(10.0);
        assert!(check_value("count", &n, &json!(5)).is_empty());
        assert_eq!(check_value("count", &n, &json!(11)).len(), 1);
        assert_eq!(check_value("count", &n, &json!("5")).len(), 1);
    }

    #[test]
    fn spec_check_flags_bad_declarations() {
        let mut bad = VariableSpec::of_type(VariableType::String);
        bad.var_type = "integer".into();
        assert_eq!(check_spec("x", &bad).len(), 1);

        let mut pat = VariableSpec::of_type(VariableType::String);
        pat.pattern = Some("(".into());
        assert!(!check_spec("x", &pat).is_empty());

        let e = VariableSpec::of_type(VariableType::Enum);
        assert!(!check_spec("x", &e).is_empty());
    }
}
