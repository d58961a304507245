//! Asking the operator for variable values.

use async_trait::async_trait;
use scaffold_core::expressions::value_to_string;
use scaffold_core::types::PromptType;
use serde_json::Value;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Stdin};
use tokio::sync::Mutex;

#[derive(Debug, Clone, PartialEq)]
pub struct PromptRequest {
    pub variable: String,
    pub message: String,
    pub kind: PromptType,
    pub choices: Vec<String>,
    pub default: Option<Value>,
}

impl PromptRequest {
    pub fn input(variable: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            variable: variable.into(),
            message: message.into(),
            kind: PromptType::Input,
            choices: Vec::new(),
            default: None,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum PromptError {
    #[error("no value for '{0}' and prompting is disabled")]
    NoDefault(String),
    #[error("invalid answer for '{variable}': {message}")]
    Invalid { variable: String, message: String },
    #[error("input closed before '{0}' was answered")]
    Closed(String),
    #[error("prompt I/O failed: {0}")]
    Io(#[from] std::io::Error),
}

#[async_trait]
pub trait Prompter: Send + Sync {
    async fn ask(&self, request: &PromptRequest) -> Result<Value, PromptError>;
}

/// Answers every prompt with its default.
#[derive(Debug, Default, Clone, Copy)]
pub struct NonInteractivePrompter;

#[async_trait]
impl Prompter for NonInteractivePrompter {
    async fn ask(&self, request: &PromptRequest) -> Result<Value, PromptError> {
        request
            .default
            .clone()
            .ok_or_else(|| PromptError::NoDefault(request.variable.clone()))
    }
}

/// Reads answers line by line from stdin; questions go to stderr.
pub struct StdinPrompter {
    // One question at a time, even when steps run concurrently.
    reader: Mutex<BufReader<Stdin>>,
}

impl StdinPrompter {
    pub fn new() -> Self {
        Self {
            reader: Mutex::new(BufReader::new(tokio::io::stdin())),
        }
    }
}

impl Default for StdinPrompter {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Prompter for StdinPrompter {
    async fn ask(&self, request: &PromptRequest) -> Result<Value, PromptError> {
        let mut reader = self.reader.lock().await;
        let mut stderr = tokio::io::stderr();
        stderr.write_all(render_question(request).as_bytes()).await?;
        stderr.flush().await?;

        let mut line = String::new();
        let n = reader.read_line(&mut line).await?;
        if n == 0 {
            return match &request.default {
                Some(d) => Ok(d.clone()),
                None => Err(PromptError::Closed(request.variable.clone())),
            };
        }
        parse_answer(request, &line)
    }
}

fn render_question(request: &PromptRequest) -> String {
    let mut q = request.message.clone();
    if !request.choices.is_empty() {
        for (i, c) in request.choices.iter().enumerate() {
            q.push_str(&format!("\n  {}) {c}", i + 1));
        }
        q.push('\n');
    }
    match (&request.kind, &request.default) {
        (PromptType::Confirm, Some(Value::Bool(true))) => q.push_str(" [Y/n]"),
        (PromptType::Confirm, _) => q.push_str(" [y/N]"),
        (_, Some(d)) => q.push_str(&format!(" [{}]", value_to_string(d))),
        _ => {}
    }
    q.push_str(": ");
    q
}

/// Turn a raw answer line into a typed value. Empty input takes the default.
pub fn parse_answer(request: &PromptRequest, raw: &str) -> Result<Value, PromptError> {
    let raw = raw.trim();
    let invalid = |message: String| PromptError::Invalid {
        variable: request.variable.clone(),
        message,
    };
    if raw.is_empty() {
        if let Some(d) = &request.default {
            return Ok(d.clone());
        }
        if request.kind == PromptType::Confirm {
            return Ok(Value::Bool(false));
        }
    }
    match request.kind {
        PromptType::Input => Ok(Value::String(raw.to_string())),
        PromptType::Confirm => match raw.to_ascii_lowercase().as_str() {
            "y" | "yes" | "true" => Ok(Value::Bool(true)),
            "n" | "no" | "false" => Ok(Value::Bool(false)),
            other => Err(invalid(format!("expected yes or no, got '{other}'"))),
        },
        PromptType::Number => raw
            .parse::<f64>()
            .ok()
            .and_then(serde_json::Number::from_f64)
            .map(|n| {
                n.as_f64()
                    .filter(|f| f.fract() == 0.0 && f.abs() < i64::MAX as f64)
                    .map(|f| Value::from(f as i64))
                    .unwrap_or(Value::Number(n))
            })
            .ok_or_else(|| invalid(format!("'{raw}' is not a number"))),
        PromptType::Select => {
            if let Ok(i) = raw.parse::<usize>() {
                if let Some(c) = i.checked_sub(1).and_then(|i| request.choices.get(i)) {
                    return Ok(Value::String(c.clone()));
                }
            }
            request
                .choices
                .iter()
                .find(|c| c.as_str() == raw)
                .map(|c| Value::String(c.clone()))
                .ok_or_else(|| invalid(format!("'{raw}' is not one of {}", request.choices.join(", "))))
        }
    }
}
