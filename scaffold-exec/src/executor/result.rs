use chrono::{DateTime, Utc};
use scaffold_core::types::{Step, ToolType};
use serde::Serialize;
use serde_json::Value;

use crate::tool::{ToolError, ToolErrorKind, ToolOutput};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StepStatus {
    Completed,
    Failed,
    Skipped,
}

impl StepStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::Skipped => "skipped",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StepError {
    pub kind: ToolErrorKind,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}

impl From<ToolError> for StepError {
    fn from(e: ToolError) -> Self {
        Self {
            kind: e.kind,
            message: e.message,
            details: e.details,
        }
    }
}

/// Outcome of one step. Immutable once recorded.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StepResult {
    pub name: String,
    pub status: StepStatus,
    pub tool_type: ToolType,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub duration_ms: u64,
    pub retry_count: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<StepError>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skip_reason: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub files_created: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub files_modified: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub files_deleted: Vec<String>,
    #[serde(skip_serializing_if = "Value::is_null")]
    pub tool_result: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub condition_result: Option<bool>,
}

impl StepResult {
    fn base(step: &Step, status: StepStatus, start_time: DateTime<Utc>) -> Self {
        let end_time = Utc::now();
        let duration_ms = (end_time - start_time).num_milliseconds().max(0) as u64;
        Self {
            name: step.name.clone(),
            status,
            tool_type: step.tool_type(),
            start_time,
            end_time,
            duration_ms,
            retry_count: 0,
            error: None,
            skip_reason: None,
            files_created: Vec::new(),
            files_modified: Vec::new(),
            files_deleted: Vec::new(),
            tool_result: Value::Null,
            condition_result: None,
        }
    }

    /// A tool output becomes `skipped` when the tool reported a no-op.
    pub fn from_output(
        step: &Step,
        start_time: DateTime<Utc>,
        retry_count: u32,
        output: ToolOutput,
    ) -> Self {
        let status = if output.skipped.is_some() {
            StepStatus::Skipped
        } else {
            StepStatus::Completed
        };
        let mut r = Self::base(step, status, start_time);
        r.retry_count = retry_count;
        r.skip_reason = output.skipped;
        r.files_created = output.files_created;
        r.files_modified = output.files_modified;
        r.files_deleted = output.files_deleted;
        r.tool_result = output.data;
        r
    }

    pub fn failed(
        step: &Step,
        start_time: DateTime<Utc>,
        retry_count: u32,
        error: ToolError,
    ) -> Self {
        let mut r = Self::base(step, StepStatus::Failed, start_time);
        r.retry_count = retry_count;
        r.error = Some(error.into());
        r
    }

    /// Skipped without invoking the tool.
    pub fn skipped(step: &Step, reason: impl Into<String>) -> Self {
        let mut r = Self::base(step, StepStatus::Skipped, Utc::now());
        r.skip_reason = Some(reason.into());
        r
    }

    pub fn with_condition(mut self, condition: bool) -> Self {
        self.condition_result = Some(condition);
        self
    }

    pub fn is_completed(&self) -> bool {
        self.status == StepStatus::Completed
    }

    pub fn is_failed(&self) -> bool {
        self.status == StepStatus::Failed
    }

    pub fn is_skipped(&self) -> bool {
        self.status == StepStatus::Skipped
    }

    pub fn error_message(&self) -> Option<&str> {
        self.error.as_ref().map(|e| e.message.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum RunStatus {
    Succeeded,
    Failed,
    /// A collect pass gathered prompts and is waiting for an answers document.
    AwaitingAnswers,
    Cancelled,
}

impl RunStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Succeeded => "succeeded",
            Self::Failed => "failed",
            Self::AwaitingAnswers => "awaitingAnswers",
            Self::Cancelled => "cancelled",
        }
    }
}

impl std::fmt::Display for RunStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunSummary {
    pub completed: usize,
    pub failed: usize,
    pub skipped: usize,
    /// Steps never started because the run halted or was cancelled.
    pub not_run: Vec<String>,
    pub duration_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FailureInfo {
    pub step: String,
    pub tool: ToolType,
    /// Kind of the failing step's error; nested runs re-raise it unchanged.
    pub kind: ToolErrorKind,
    pub message: String,
}

/// Everything one step list produced.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionOutcome {
    /// Results in declaration order.
    pub results: Vec<StepResult>,
    pub summary: RunSummary,
    /// First failure that was not absorbed by `continueOnError`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure: Option<FailureInfo>,
    pub halted: bool,
    pub cancelled: bool,
}

impl ExecutionOutcome {
    /// True when no hard failure happened and the run was not cancelled.
    pub fn succeeded(&self) -> bool {
        self.failure.is_none() && !self.cancelled
    }

    pub fn result(&self, name: &str) -> Option<&StepResult> {
        self.results.iter().find(|r| r.name == name)
    }

    pub fn files_created(&self) -> Vec<String> {
        self.results.iter().flat_map(|r| r.files_created.iter().cloned()).collect()
    }

    pub fn files_modified(&self) -> Vec<String> {
        self.results.iter().flat_map(|r| r.files_modified.iter().cloned()).collect()
    }

    pub fn files_deleted(&self) -> Vec<String> {
        self.results.iter().flat_map(|r| r.files_deleted.iter().cloned()).collect()
    }
}
