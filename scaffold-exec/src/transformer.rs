//! Line-oriented rewrites of existing files.

use std::collections::BTreeMap;

use regex::Regex;
use scaffold_core::types::{InjectPosition, TransformKind};
use serde_json::Value;

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum TransformError {
    #[error("parameter `{0}` is required")]
    MissingParameter(&'static str),
    #[error("invalid pattern: {0}")]
    Pattern(String),
    #[error("anchor '{0}' not found")]
    AnchorNotFound(String),
    #[error("unknown position '{0}'")]
    Position(String),
}

pub trait Transformer: Send + Sync {
    /// Apply one transform to `content`; returns the new content.
    fn transform(
        &self,
        kind: TransformKind,
        content: &str,
        parameters: &BTreeMap<String, Value>,
    ) -> Result<String, TransformError>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct TextTransformer;

impl Transformer for TextTransformer {
    fn transform(
        &self,
        kind: TransformKind,
        content: &str,
        parameters: &BTreeMap<String, Value>,
    ) -> Result<String, TransformError> {
        let param = |key: &'static str| {
            parameters
                .get(key)
                .and_then(Value::as_str)
                .ok_or(TransformError::MissingParameter(key))
        };
        match kind {
            TransformKind::Replace => {
                let re = Regex::new(param("pattern")?).map_err(|e| TransformError::Pattern(e.to_string()))?;
                Ok(re.replace_all(content, param("replacement")?).into_owned())
            }
            TransformKind::Insert => {
                let text = param("content")?;
                let anchor = parameters.get("anchor").and_then(Value::as_str);
                let position = match parameters.get("position").and_then(Value::as_str) {
                    None => None,
                    Some("before") => Some(InjectPosition::Before),
                    Some("after") => Some(InjectPosition::After),
                    Some("start") => Some(InjectPosition::Start),
                    Some("end") => Some(InjectPosition::End),
                    Some(other) => return Err(TransformError::Position(other.to_string())),
                };
                inject(content, text, anchor, position)
            }
            TransformKind::Append => inject(content, param("content")?, None, Some(InjectPosition::End)),
            TransformKind::Prepend => inject(content, param("content")?, None, Some(InjectPosition::Start)),
            TransformKind::Delete => {
                let re = Regex::new(param("pattern")?).map_err(|e| TransformError::Pattern(e.to_string()))?;
                let mut out: String = content
                    .lines()
                    .filter(|line| !re.is_match(line))
                    .collect::<Vec<_>>()
                    .join("\n");
                if content.ends_with('\n') && !out.is_empty() {
                    out.push('\n');
                }
                Ok(out)
            }
        }
    }
}

/// Insert `text` into `content` as a whole line.
///
/// With an anchor and no position the text goes after the anchor's line;
/// without either it is appended.
pub fn inject(
    content: &str,
    text: &str,
    anchor: Option<&str>,
    position: Option<InjectPosition>,
) -> Result<String, TransformError> {
    let position = position.unwrap_or(if anchor.is_some() {
        InjectPosition::After
    } else {
        InjectPosition::End
    });
    let block = if text.ends_with('\n') {
        text.to_string()
    } else {
        format!("{text}\n")
    };

    match position {
        InjectPosition::Start => Ok(format!("{block}{content}")),
        InjectPosition::End => {
            let mut out = content.to_string();
            if !out.is_empty() && !out.ends_with('\n') {
                out.push('\n');
            }
            out.push_str(&block);
            Ok(out)
        }
        InjectPosition::Before | InjectPosition::After => {
            let anchor = anchor.ok_or(TransformError::MissingParameter("anchor"))?;
            let at = content
                .find(anchor)
                .ok_or_else(|| TransformError::AnchorNotFound(anchor.to_string()))?;
            let line_start = content[..at].rfind('\n').map_or(0, |i| i + 1);
            let split = if position == InjectPosition::Before {
                line_start
            } else {
                content[at..]
                    .find('\n')
                    .map_or(content.len(), |i| at + i + 1)
            };
            let (head, tail) = content.split_at(split);
            let mut out = head.to_string();
            if !out.is_empty() && !out.ends_with('\n') {
                out.push('\n');
            }
            out.push_str(&block);
            out.push_str(tail);
            Ok(out)
        }
    }
}
