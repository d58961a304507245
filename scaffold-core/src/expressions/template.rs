use serde_json::Value;

use super::ast::{parse_expression, Expr};
use super::eval::{evaluate, value_to_string};
use super::ExpressionError;

#[derive(Debug, Clone, PartialEq)]
pub enum Segment {
    Literal(String),
    Expr { source: String, expr: Expr },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Template {
    pub segments: Vec<Segment>,
}

impl Template {
    /// The single expression when the whole input is exactly one `{{ expr }}`.
    pub fn as_single_expr(&self) -> Option<&Expr> {
        match self.segments.as_slice() {
            [Segment::Expr { expr, .. }] => Some(expr),
            _ => None,
        }
    }

    pub fn has_expressions(&self) -> bool {
        self.segments.iter().any(|s| matches!(s, Segment::Expr { .. }))
    }

    pub fn render(&self, scope: &Value) -> Result<String, ExpressionError> {
        let mut out = String::new();
        for seg in &self.segments {
            match seg {
                Segment::Literal(s) => out.push_str(s),
                Segment::Expr { expr, .. } => out.push_str(&value_to_string(&evaluate(expr, scope)?)),
            }
        }
        Ok(out)
    }
}

pub fn parse_template(input: &str) -> Result<Template, ExpressionError> {
    let mut segments = Vec::new();
    let mut rest = input;

    while let Some(start) = rest.find("{{") {
        if start > 0 {
            segments.push(Segment::Literal(rest[..start].to_string()));
        }
        let after = &rest[start + 2..];
        let Some(end) = after.find("}}") else {
            return Err(ExpressionError::UnclosedInterpolation);
        };
        let source = after[..end].trim().to_string();
        let expr = parse_expression(&source)?;
        segments.push(Segment::Expr { source, expr });
        rest = &after[end + 2..];
    }

    if !rest.is_empty() {
        segments.push(Segment::Literal(rest.to_string()));
    }

    Ok(Template { segments })
}

/// Replace every `{{ expr }}` in `input` with its stringified value.
pub fn interpolate(input: &str, scope: &Value) -> Result<String, ExpressionError> {
    if !input.contains("{{") {
        return Ok(input.to_string());
    }
    parse_template(input)?.render(scope)
}

/// Interpolate every string inside `value`. A string that is exactly one
/// `{{ expr }}` is replaced by the expression's value with its type intact.
pub fn interpolate_value(value: &Value, scope: &Value) -> Result<Value, ExpressionError> {
    match value {
        Value::String(s) => {
            if !s.contains("{{") {
                return Ok(value.clone());
            }
            let template = parse_template(s)?;
            match template.as_single_expr() {
                Some(expr) => evaluate(expr, scope),
                None => Ok(Value::String(template.render(scope)?)),
            }
        }
        Value::Array(arr) => arr
            .iter()
            .map(|v| interpolate_value(v, scope))
            .collect::<Result<Vec<_>, _>>()
            .map(Value::Array),
        Value::Object(map) => {
            let mut out = serde_json::Map::with_capacity(map.len());
            for (k, v) in map {
                out.insert(k.clone(), interpolate_value(v, scope)?);
            }
            Ok(Value::Object(out))
        }
        other => Ok(other.clone()),
    }
}

/// Check that every embedded `{{ }}` expression inside `value` parses.
pub fn validate_value_expressions(value: &Value) -> Result<(), ExpressionError> {
    match value {
        Value::String(s) if s.contains("{{") => parse_template(s).map(|_| ()),
        Value::Array(arr) => arr.iter().try_for_each(validate_value_expressions),
        Value::Object(map) => map.values().try_for_each(validate_value_expressions),
        _ => Ok(()),
    }
}
