use std::collections::BTreeMap;

use crate::types::{AnyValue, Step, VariableSpec};

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Recipe {
    #[serde(default)]
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub variables: BTreeMap<String, VariableSpec>,

    #[serde(default)]
    pub steps: Vec<Step>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub settings: Option<RecipeSettings>,

    /// Usage examples. Documentation only, never executed.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub examples: Vec<AnyValue>,
}

impl Recipe {
    pub fn settings(&self) -> RecipeSettings {
        self.settings.clone().unwrap_or_default()
    }

    pub fn step(&self, name: &str) -> Option<&Step> {
        self.steps.iter().find(|s| s.name == name)
    }

    /// True when any step, including steps nested in groups, is an AI step.
    pub fn contains_ai_steps(&self) -> bool {
        self.steps.iter().any(Step::contains_ai)
    }

    /// Identifiers of the sub-recipes called by `recipe` steps, groups
    /// included. Templated identifiers are left out.
    pub fn recipe_references(&self) -> Vec<&str> {
        let mut out = Vec::new();
        for step in &self.steps {
            step.collect_recipe_refs(&mut out);
        }
        out
    }
}

#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecipeSettings {
    /// Default step timeout in milliseconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout: Option<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retries: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub continue_on_error: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_parallel_steps: Option<usize>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub working_dir: Option<String>,
}
