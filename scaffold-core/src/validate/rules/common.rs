use regex::Regex;

use crate::expressions::{parse_expression, parse_template, validate_value_expressions, DocPath};
use crate::validate::validator::Validator;

pub(crate) fn validate_condition(v: &mut Validator, path: &str, expr: &str) {
    if let Err(e) = parse_expression(expr) {
        v.push(path, format!("invalid condition: {e}"));
    }
}

pub(crate) fn validate_template_string(v: &mut Validator, path: &str, s: &str) {
    if let Err(e) = parse_template(s) {
        v.push(path, format!("invalid interpolation: {e}"));
    }
}

pub(crate) fn validate_value_exprs(v: &mut Validator, path: &str, value: &serde_json::Value) {
    if let Err(e) = validate_value_expressions(value) {
        v.push(path, format!("invalid interpolation inside value: {e}"));
    }
}

/// Interpolated patterns are only known at run time; literal ones must compile now.
pub(crate) fn validate_regex(v: &mut Validator, path: &str, pattern: &str) {
    if pattern.contains("{{") {
        return;
    }
    if let Err(e) = Regex::new(pattern) {
        v.push(path, format!("invalid regex: {e}"));
    }
}

pub(crate) fn validate_doc_path(v: &mut Validator, path: &str, doc_path: &str) {
    if let Err(e) = DocPath::parse(doc_path) {
        v.push(path, format!("invalid document path: {e}"));
    }
}
