use crate::planner::model::{ExecutionPlan, PlanningOutcome};

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlanFormat {
    Text,
    Json,
    Dot,
}

/// Human-readable wave listing.
pub fn render_plan_text(plan: &ExecutionPlan) -> String {
    let mut out = String::new();
    out.push_str(&format!("recipe: {}\n", plan.recipe));
    for (idx, wave) in plan.graph.waves.iter().enumerate() {
        out.push_str(&format!("wave {}:\n", idx + 1));
        for name in wave {
            let Some(step) = plan.steps.iter().find(|s| &s.name == name) else {
                continue;
            };
            let mut line = format!("  - {} [{}]", step.name, step.tool);
            if step.parallel {
                line.push_str(" (parallel)");
            }
            if !step.depends_on.is_empty() {
                line.push_str(&format!(" after {}", step.depends_on.join(", ")));
            }
            if let Some(when) = &step.when {
                line.push_str(&format!(" when `{when}`"));
            }
            if let Some(n) = step.children {
                line.push_str(&format!(" ({n} nested)"));
            }
            out.push_str(&line);
            out.push('\n');
        }
    }
    if !plan.undeclared_variables.is_empty() {
        let names: Vec<&str> = plan.undeclared_variables.iter().map(String::as_str).collect();
        out.push_str(&format!("undeclared variables: {}\n", names.join(", ")));
    }
    out
}

pub fn render_outcome(outcome: &PlanningOutcome, format: PlanFormat) -> Result<String, serde_json::Error> {
    match format {
        PlanFormat::Json => serde_json::to_string_pretty(outcome),
        PlanFormat::Dot => Ok(outcome
            .plan
            .as_ref()
            .map(|p| p.graph.to_dot(&p.recipe))
            .unwrap_or_default()),
        PlanFormat::Text => {
            let mut out = String::new();
            if outcome.validation.is_valid {
                out.push_str("valid\n");
            } else {
                out.push_str("invalid\n");
                for e in &outcome.validation.errors {
                    out.push_str(&format!("  error: {e}\n"));
                }
            }
            for w in &outcome.validation.warnings {
                out.push_str(&format!("  warning: {w}\n"));
            }
            if let Some(plan) = &outcome.plan {
                out.push_str(&render_plan_text(plan));
            }
            Ok(out)
        }
    }
}
