//! Scripted actions callable from `action` steps.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::{debug, error, info, warn};

use crate::executor::StepContext;
use crate::tool::ToolError;

#[async_trait]
pub trait Action: Send + Sync {
    fn id(&self) -> &str;

    fn description(&self) -> &str {
        ""
    }

    /// Actions without side effects still run during dry runs.
    fn has_side_effects(&self) -> bool {
        true
    }

    /// `parameters` are already interpolated against the run variables.
    async fn run(
        &self,
        parameters: &BTreeMap<String, Value>,
        ctx: &StepContext,
    ) -> Result<Value, ToolError>;
}

#[derive(Default, Clone)]
pub struct ActionRegistry {
    actions: BTreeMap<String, Arc<dyn Action>>,
}

impl ActionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_builtins() -> Self {
        let mut r = Self::new();
        r.register(Arc::new(LogAction));
        r.register(Arc::new(SetVariablesAction));
        r
    }

    /// Register an action, replacing any previous one with the same id.
    pub fn register(&mut self, action: Arc<dyn Action>) -> Option<Arc<dyn Action>> {
        self.actions.insert(action.id().to_string(), action)
    }

    pub fn get(&self, id: &str) -> Option<Arc<dyn Action>> {
        self.actions.get(id).cloned()
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.actions.keys().map(String::as_str)
    }
}

impl std::fmt::Debug for ActionRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.actions.keys()).finish()
    }
}

/// `log`: emit `message` at `level` (info by default).
pub struct LogAction;

#[async_trait]
impl Action for LogAction {
    fn id(&self) -> &str {
        "log"
    }

    fn description(&self) -> &str {
        "write a message to the log"
    }

    fn has_side_effects(&self) -> bool {
        false
    }

    async fn run(
        &self,
        parameters: &BTreeMap<String, Value>,
        ctx: &StepContext,
    ) -> Result<Value, ToolError> {
        let message = parameters
            .get("message")
            .and_then(Value::as_str)
            .ok_or_else(|| ToolError::invalid_parameter("`log` needs a string `message`"))?;
        let recipe = ctx.recipe_name.as_str();
        match parameters.get("level").and_then(Value::as_str).unwrap_or("info") {
            "debug" => debug!(%recipe, "{message}"),
            "warn" => warn!(%recipe, "{message}"),
            "error" => error!(%recipe, "{message}"),
            _ => info!(%recipe, "{message}"),
        }
        Ok(json!({ "message": message }))
    }
}

/// `set-variables`: copy every parameter into the run variables.
pub struct SetVariablesAction;

#[async_trait]
impl Action for SetVariablesAction {
    fn id(&self) -> &str {
        "set-variables"
    }

    fn description(&self) -> &str {
        "store parameters as variables for later steps"
    }

    fn has_side_effects(&self) -> bool {
        false
    }

    async fn run(
        &self,
        parameters: &BTreeMap<String, Value>,
        ctx: &StepContext,
    ) -> Result<Value, ToolError> {
        for (name, value) in parameters {
            ctx.set_variable(name.clone(), value.clone());
        }
        Ok(json!({ "set": parameters.keys().collect::<Vec<_>>() }))
    }
}
