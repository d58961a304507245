//! Template rendering behind a trait so the engine can be swapped in tests.

use serde_json::Value;
use tera::{Context, Tera};

#[derive(Debug, thiserror::Error)]
pub enum TemplateError {
    #[error("template variables must be a mapping")]
    Context,
    #[error("failed to render template '{name}': {message}")]
    Render { name: String, message: String },
}

pub trait TemplateEngine: Send + Sync {
    /// Render `source` with `variables` (a JSON object). `name` is only used in errors.
    fn render(&self, name: &str, source: &str, variables: &Value) -> Result<String, TemplateError>;
}

/// Tera with autoescaping off; generated code must not be HTML-escaped.
#[derive(Debug, Default, Clone, Copy)]
pub struct TeraEngine;

impl TeraEngine {
    pub fn new() -> Self {
        Self
    }
}

impl TemplateEngine for TeraEngine {
    fn render(&self, name: &str, source: &str, variables: &Value) -> Result<String, TemplateError> {
        let context = Context::from_value(variables.clone()).map_err(|_| TemplateError::Context)?;
        let mut tera = Tera::default();
        tera.autoescape_on(vec![]);
        tera.add_raw_template(name, source)
            .map_err(|e| render_error(name, &e))?;
        tera.render(name, &context).map_err(|e| render_error(name, &e))
    }
}

fn render_error(name: &str, e: &tera::Error) -> TemplateError {
    // Tera keeps the useful detail in the source chain.
    let mut message = e.to_string();
    let mut source = std::error::Error::source(e);
    while let Some(inner) = source {
        message.push_str(": ");
        message.push_str(&inner.to_string());
        source = inner.source();
    }
    TemplateError::Render {
        name: name.to_string(),
        message,
    }
}
