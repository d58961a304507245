use std::collections::{BTreeMap, BTreeSet};

use crate::error::ValidationError;
use crate::types::ToolType;

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct PlanningOutcome {
    pub validation: ValidationSummary,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub plan: Option<ExecutionPlan>,
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct ValidationSummary {
    pub is_valid: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl ValidationSummary {
    pub fn valid() -> Self {
        Self {
            is_valid: true,
            errors: Vec::new(),
            warnings: Vec::new(),
        }
    }

    pub fn invalid_from(err: ValidationError) -> Self {
        Self {
            is_valid: false,
            errors: err.messages(),
            warnings: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct ExecutionPlan {
    pub recipe: String,
    pub graph: DependencyGraph,
    pub steps: Vec<PlannedStep>,
    /// Variables read by steps that the recipe neither declares nor produces.
    pub undeclared_variables: BTreeSet<String>,
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct DependencyGraph {
    /// For each step, which steps it depends on.
    pub depends_on: BTreeMap<String, Vec<String>>,
    /// Steps grouped into waves; a wave only starts once earlier waves are terminal.
    pub waves: Vec<Vec<String>>,
    /// A deterministic topological order.
    pub topo_order: Vec<String>,
}

impl DependencyGraph {
    pub fn wave_of(&self, step: &str) -> Option<usize> {
        self.waves.iter().position(|w| w.iter().any(|s| s == step))
    }

    pub fn to_dot(&self, recipe: &str) -> String {
        let mut out = String::new();
        out.push_str("digraph scaffold {\n");
        out.push_str(&format!("  label=\"recipe: {recipe}\";\n"));
        out.push_str("  labelloc=t;\n");
        out.push_str("  rankdir=LR;\n");

        for (step, deps) in &self.depends_on {
            if deps.is_empty() {
                out.push_str(&format!("  \"{step}\";\n"));
            } else {
                for dep in deps {
                    out.push_str(&format!("  \"{dep}\" -> \"{step}\";\n"));
                }
            }
        }

        for wave in &self.waves {
            if wave.len() > 1 {
                out.push_str("  { rank=same; ");
                for s in wave {
                    out.push_str(&format!("\"{s}\"; "));
                }
                out.push_str("}\n");
            }
        }

        out.push_str("}\n");
        out
    }
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct PlannedStep {
    pub name: String,
    pub tool: ToolType,
    pub wave: usize,
    pub depends_on: Vec<String>,
    pub parallel: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub when: Option<String>,
    pub referenced_variables: BTreeSet<String>,
    /// Nested step count for `sequence`/`parallel` groups.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub children: Option<usize>,
}
