//! The small expression language used by `when` conditions and `{{ }}`
//! interpolation. Expressions only see the scope they are handed: resolved
//! variables plus a `steps` object of prior step outcomes.

mod ast;
mod doc_path;
mod eval;
mod lexer;
mod template;

pub use ast::{parse_expression, BinaryOp, Expr, PathSegment, UnaryOp};
pub use doc_path::{DocPath, DocPathError};
pub use eval::{evaluate, evaluate_bool, is_truthy, value_to_string};
pub use template::{
    interpolate, interpolate_value, parse_template, validate_value_expressions, Segment, Template,
};

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ExpressionError {
    #[error("empty expression")]
    Empty,
    #[error("unexpected character '{0}' at offset {1}")]
    UnexpectedChar(char, usize),
    #[error("invalid number literal '{0}'")]
    InvalidNumber(String),
    #[error("unterminated string literal")]
    UnterminatedString,
    #[error("unexpected token {0}")]
    Unexpected(String),
    #[error("unexpected end of expression")]
    UnexpectedEnd,
    #[error("unexpected trailing token {0}")]
    Trailing(String),
    #[error("unclosed interpolation (missing '}}}}')")]
    UnclosedInterpolation,
    #[error("operator '{op}' cannot be applied to {detail}")]
    Type { op: &'static str, detail: String },
    #[error("division by zero")]
    DivisionByZero,
}
