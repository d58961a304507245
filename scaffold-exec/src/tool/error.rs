use scaffold_core::expressions::ExpressionError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ToolErrorKind {
    /// Malformed step or tool configuration.
    Configuration,
    /// An expression or pattern that does not parse.
    Syntax,
    InvalidParameter,
    /// A template, action, recipe or file could not be located.
    Resolution,
    Execution,
    Timeout,
    Cancelled,
    /// Circular recipe composition.
    Circular,
}

impl ToolErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Configuration => "configuration",
            Self::Syntax => "syntax",
            Self::InvalidParameter => "invalidParameter",
            Self::Resolution => "resolution",
            Self::Execution => "execution",
            Self::Timeout => "timeout",
            Self::Cancelled => "cancelled",
            Self::Circular => "circular",
        }
    }

    /// Deterministic failures that another attempt cannot fix.
    pub fn is_retryable(self) -> bool {
        !matches!(
            self,
            Self::Configuration
                | Self::Syntax
                | Self::InvalidParameter
                | Self::Circular
                | Self::Cancelled
        )
    }
}

impl std::fmt::Display for ToolErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, thiserror::Error)]
#[error("{kind} error: {message}")]
pub struct ToolError {
    pub kind: ToolErrorKind,
    pub message: String,
    /// Structured payload kept on the step result (e.g. nested step results).
    pub details: Option<serde_json::Value>,
}

impl ToolError {
    pub fn new(kind: ToolErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::new(ToolErrorKind::Configuration, message)
    }

    pub fn syntax(message: impl Into<String>) -> Self {
        Self::new(ToolErrorKind::Syntax, message)
    }

    pub fn invalid_parameter(message: impl Into<String>) -> Self {
        Self::new(ToolErrorKind::InvalidParameter, message)
    }

    pub fn resolution(message: impl Into<String>) -> Self {
        Self::new(ToolErrorKind::Resolution, message)
    }

    pub fn execution(message: impl Into<String>) -> Self {
        Self::new(ToolErrorKind::Execution, message)
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        Self::new(ToolErrorKind::Timeout, message)
    }

    pub fn cancelled() -> Self {
        Self::new(ToolErrorKind::Cancelled, "run cancelled")
    }

    pub fn circular(message: impl Into<String>) -> Self {
        Self::new(ToolErrorKind::Circular, message)
    }

    pub fn is_retryable(&self) -> bool {
        self.kind.is_retryable()
    }
}

impl From<ExpressionError> for ToolError {
    fn from(e: ExpressionError) -> Self {
        ToolError::syntax(e.to_string())
    }
}

impl From<std::io::Error> for ToolError {
    fn from(e: std::io::Error) -> Self {
        ToolError::execution(e.to_string())
    }
}
