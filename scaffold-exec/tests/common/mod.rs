#![allow(dead_code)]

use std::path::Path;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use scaffold_core::types::{Step, ToolType};
use scaffold_core::DocumentFormat;
use scaffold_exec::engine::{EngineConfig, LoadedRecipe, RecipeEngine};
use scaffold_exec::executor::{ExecutorConfig, StepContext};
use scaffold_exec::interaction::{PromptError, PromptRequest, Prompter};
use scaffold_exec::registry::{ToolFactory, ToolMetadata, ToolRegistry, DEFAULT_TOOL_NAME};
use scaffold_exec::retry::RetryConfig;
use scaffold_exec::tool::{ResourceScope, Tool, ToolError, ToolOutput, ToolValidation};
use serde_json::{json, Value};

pub fn fast_config() -> EngineConfig {
    EngineConfig {
        executor: ExecutorConfig {
            retry: RetryConfig::immediate(),
            ..Default::default()
        },
        ..Default::default()
    }
}

pub fn engine() -> RecipeEngine {
    RecipeEngine::new(fast_config())
}

pub fn recipe(yaml: &str) -> LoadedRecipe {
    LoadedRecipe::from_str(yaml, DocumentFormat::Yaml, "<test>").expect("test recipe parses")
}

pub fn write(dir: &Path, rel: &str, content: &str) {
    let path = dir.join(rel);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(path, content).unwrap();
}

pub fn read(dir: &Path, rel: &str) -> String {
    std::fs::read_to_string(dir.join(rel)).unwrap()
}

/// Answers prompts from a fixed list, recording every request.
#[derive(Default)]
pub struct ScriptedPrompter {
    pub answers: Mutex<Vec<Value>>,
    pub asked: Mutex<Vec<String>>,
}

impl ScriptedPrompter {
    pub fn new(answers: Vec<Value>) -> Self {
        Self {
            answers: Mutex::new(answers),
            asked: Mutex::new(Vec::new()),
        }
    }

    pub fn asked(&self) -> Vec<String> {
        self.asked.lock().unwrap().clone()
    }
}

#[async_trait]
impl Prompter for ScriptedPrompter {
    async fn ask(&self, request: &PromptRequest) -> Result<Value, PromptError> {
        self.asked.lock().unwrap().push(request.variable.clone());
        let mut answers = self.answers.lock().unwrap();
        if answers.is_empty() {
            return Err(PromptError::Closed(request.variable.clone()));
        }
        Ok(answers.remove(0))
    }
}

/// A tool that fails a fixed number of times before succeeding.
pub struct FlakyTool {
    pub attempts: Arc<AtomicU32>,
    pub failures: u32,
    pub error: fn() -> ToolError,
}

#[async_trait]
impl Tool for FlakyTool {
    fn tool_type(&self) -> ToolType {
        ToolType::Action
    }

    fn validate(&self, _step: &Step, _ctx: &StepContext) -> ToolValidation {
        ToolValidation::ok()
    }

    async fn execute(
        &self,
        _step: &Step,
        _ctx: &StepContext,
        _scope: &ResourceScope,
    ) -> Result<ToolOutput, ToolError> {
        let n = self.attempts.fetch_add(1, Ordering::SeqCst) + 1;
        if n <= self.failures {
            return Err((self.error)());
        }
        Ok(ToolOutput::with_data(json!({ "attempt": n })))
    }
}

/// Registry whose `action` tool is a [`FlakyTool`]; everything else is built in
/// except `action`.
pub async fn flaky_registry(failures: u32, error: fn() -> ToolError) -> (Arc<ToolRegistry>, Arc<AtomicU32>) {
    let registry = ToolRegistry::with_builtins(Default::default());
    registry.unregister(ToolType::Action, DEFAULT_TOOL_NAME).await;
    let attempts = Arc::new(AtomicU32::new(0));
    let counter = attempts.clone();
    let factory: ToolFactory = Arc::new(move |_opts: &Value| -> Result<Box<dyn Tool>, ToolError> {
        Ok(Box::new(FlakyTool {
            attempts: counter.clone(),
            failures,
            error,
        }))
    });
    registry
        .register(ToolType::Action, DEFAULT_TOOL_NAME, factory, ToolMetadata::new("flaky"))
        .await
        .unwrap();
    (Arc::new(registry), attempts)
}
