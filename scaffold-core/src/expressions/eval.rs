use serde_json::Value;

use super::ast::{number_value, parse_expression, BinaryOp, Expr, PathSegment, UnaryOp};
use super::ExpressionError;

/// Evaluate an expression against a scope object. Unknown names yield `null`.
pub fn evaluate(expr: &Expr, scope: &Value) -> Result<Value, ExpressionError> {
    match expr {
        Expr::Literal(v) => Ok(v.clone()),
        Expr::Path(segments) => Ok(lookup(scope, segments).cloned().unwrap_or(Value::Null)),
        Expr::Unary(UnaryOp::Not, inner) => Ok(Value::Bool(!is_truthy(&evaluate(inner, scope)?))),
        Expr::Unary(UnaryOp::Neg, inner) => {
            let v = evaluate(inner, scope)?;
            let n = as_number(&v).ok_or_else(|| ExpressionError::Type {
                op: "-",
                detail: type_name(&v).to_string(),
            })?;
            Ok(number_value(-n))
        }
        Expr::Binary(BinaryOp::Or, l, r) => {
            let lv = evaluate(l, scope)?;
            if is_truthy(&lv) {
                Ok(lv)
            } else {
                evaluate(r, scope)
            }
        }
        Expr::Binary(BinaryOp::And, l, r) => {
            let lv = evaluate(l, scope)?;
            if is_truthy(&lv) {
                evaluate(r, scope)
            } else {
                Ok(lv)
            }
        }
        Expr::Binary(op, l, r) => {
            let lv = evaluate(l, scope)?;
            let rv = evaluate(r, scope)?;
            binary(*op, &lv, &rv)
        }
    }
}

/// Parse and evaluate `input`, reducing the result to a boolean.
pub fn evaluate_bool(input: &str, scope: &Value) -> Result<bool, ExpressionError> {
    let expr = parse_expression(input)?;
    Ok(is_truthy(&evaluate(&expr, scope)?))
}

pub fn is_truthy(v: &Value) -> bool {
    match v {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}

/// Stringify a value the way interpolation inserts it.
pub fn value_to_string(v: &Value) -> String {
    match v {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        other => other.to_string(),
    }
}

fn lookup<'a>(scope: &'a Value, segments: &[PathSegment]) -> Option<&'a Value> {
    let mut cur = scope;
    for seg in segments {
        cur = match (seg, cur) {
            (PathSegment::Key(k), Value::Object(map)) => map.get(k)?,
            (PathSegment::Index(i), Value::Array(arr)) => arr.get(*i)?,
            (PathSegment::Index(i), Value::Object(map)) => map.get(&i.to_string())?,
            _ => return None,
        };
    }
    Some(cur)
}

fn binary(op: BinaryOp, l: &Value, r: &Value) -> Result<Value, ExpressionError> {
    match op {
        BinaryOp::Eq => Ok(Value::Bool(loose_eq(l, r))),
        BinaryOp::Ne => Ok(Value::Bool(!loose_eq(l, r))),
        BinaryOp::Lt | BinaryOp::Le | BinaryOp::Gt | BinaryOp::Ge => compare(op, l, r),
        BinaryOp::Add if l.is_string() || r.is_string() => Ok(Value::String(format!(
            "{}{}",
            value_to_string(l),
            value_to_string(r)
        ))),
        BinaryOp::Add | BinaryOp::Sub | BinaryOp::Mul | BinaryOp::Div | BinaryOp::Rem => {
            arithmetic(op, l, r)
        }
        BinaryOp::Or => Ok(Value::Bool(is_truthy(l) || is_truthy(r))),
        BinaryOp::And => Ok(Value::Bool(is_truthy(l) && is_truthy(r))),
    }
}

fn loose_eq(l: &Value, r: &Value) -> bool {
    match (as_number_strict(l), as_number_strict(r)) {
        (Some(a), Some(b)) => a == b,
        _ => l == r,
    }
}

fn compare(op: BinaryOp, l: &Value, r: &Value) -> Result<Value, ExpressionError> {
    let ord = match (l, r) {
        (Value::String(a), Value::String(b)) => a.partial_cmp(b),
        _ => match (as_number(l), as_number(r)) {
            (Some(a), Some(b)) => a.partial_cmp(&b),
            _ => {
                return Err(ExpressionError::Type {
                    op: op_symbol(op),
                    detail: format!("{} and {}", type_name(l), type_name(r)),
                })
            }
        },
    };
    let Some(ord) = ord else {
        return Ok(Value::Bool(false));
    };
    Ok(Value::Bool(match op {
        BinaryOp::Lt => ord.is_lt(),
        BinaryOp::Le => ord.is_le(),
        BinaryOp::Gt => ord.is_gt(),
        _ => ord.is_ge(),
    }))
}

fn arithmetic(op: BinaryOp, l: &Value, r: &Value) -> Result<Value, ExpressionError> {
    let (Some(a), Some(b)) = (as_number(l), as_number(r)) else {
        return Err(ExpressionError::Type {
            op: op_symbol(op),
            detail: format!("{} and {}", type_name(l), type_name(r)),
        });
    };
    let n = match op {
        BinaryOp::Add => a + b,
        BinaryOp::Sub => a - b,
        BinaryOp::Mul => a * b,
        BinaryOp::Div | BinaryOp::Rem if b == 0.0 => return Err(ExpressionError::DivisionByZero),
        BinaryOp::Div => a / b,
        _ => a % b,
    };
    Ok(number_value(n))
}

fn as_number_strict(v: &Value) -> Option<f64> {
    v.as_f64()
}

// Numeric strings compare as numbers so coerced and raw overrides behave alike.
fn as_number(v: &Value) -> Option<f64> {
    match v {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        _ => None,
    }
}

fn type_name(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn op_symbol(op: BinaryOp) -> &'static str {
    match op {
        BinaryOp::Or => "||",
        BinaryOp::And => "&&",
        BinaryOp::Eq => "==",
        BinaryOp::Ne => "!=",
        BinaryOp::Lt => "<",
        BinaryOp::Le => "<=",
        BinaryOp::Gt => ">",
        BinaryOp::Ge => ">=",
        BinaryOp::Add => "+",
        BinaryOp::Sub => "-",
        BinaryOp::Mul => "*",
        BinaryOp::Div => "/",
        BinaryOp::Rem => "%",
    }
}
