use std::path::PathBuf;

use scaffold_core::types::{Recipe, ToolType, Variables};
use scaffold_core::{ExecutionPlan, ValidationSummary};
use serde::Serialize;
use uuid::Uuid;

use crate::ai::{PromptManifest, StdoutRecord};
use crate::executor::{ExecutionOutcome, FailureInfo, RunStatus, RunSummary, StepResult};

/// Final outcome of one top-level run.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionReport {
    pub run_id: Uuid,
    pub recipe: String,
    pub status: RunStatus,
    pub dry_run: bool,
    pub steps: Vec<StepResult>,
    pub summary: RunSummary,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure: Option<FailureInfo>,
    pub variables: Variables,
    pub files_created: Vec<String>,
    pub files_modified: Vec<String>,
    pub files_deleted: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub manifest: Option<PromptManifest>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub stdout: Vec<StdoutRecord>,
}

impl ExecutionReport {
    pub(crate) fn from_outcome(
        run_id: Uuid,
        recipe: &Recipe,
        status: RunStatus,
        dry_run: bool,
        outcome: ExecutionOutcome,
        variables: Variables,
    ) -> Self {
        Self {
            run_id,
            recipe: recipe.name.clone(),
            status,
            dry_run,
            files_created: outcome.files_created(),
            files_modified: outcome.files_modified(),
            files_deleted: outcome.files_deleted(),
            steps: outcome.results,
            summary: outcome.summary,
            failure: outcome.failure,
            variables,
            manifest: None,
            stdout: Vec::new(),
        }
    }

    pub fn succeeded(&self) -> bool {
        self.status == RunStatus::Succeeded
    }

    pub fn step(&self, name: &str) -> Option<&StepResult> {
        self.steps.iter().find(|s| s.name == name)
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VariableInfo {
    pub name: String,
    #[serde(rename = "type")]
    pub var_type: String,
    pub required: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StepInfo {
    pub name: String,
    pub tool: ToolType,
    pub depends_on: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub when: Option<String>,
    pub parallel: bool,
}

/// What `info` shows about a recipe without running it.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecipeInfo {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    pub location: String,
    pub variables: Vec<VariableInfo>,
    pub steps: Vec<StepInfo>,
    pub contains_ai_steps: bool,
    pub validation: ValidationSummary,
    /// Present only when the recipe is valid.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub plan: Option<ExecutionPlan>,
}

/// One entry of `list`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecipeSummary {
    pub path: PathBuf,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    pub steps: usize,
}
