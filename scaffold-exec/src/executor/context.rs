use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

use scaffold_core::expressions::{evaluate_bool, interpolate, interpolate_value};
use scaffold_core::types::{Recipe, RecipeSettings, Variables};
use serde_json::{json, Map, Value};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::actions::ActionRegistry;
use crate::ai::AiSession;
use crate::composition::{CallStack, ReqwestFetcher, RecipeResolver, ResolverConfig};
use crate::executor::events::{Event, EventSink, NoOpEventSink};
use crate::executor::result::StepResult;
use crate::executor::types::ExecutorConfig;
use crate::interaction::{NonInteractivePrompter, Prompter};
use crate::registry::ToolRegistry;
use crate::templating::{TemplateEngine, TeraEngine};
use crate::tool::ToolError;
use crate::transformer::{TextTransformer, Transformer};

/// Collaborators shared by every step of one top-level run.
///
/// The registry is process-wide; the resolver cache and AI session belong to
/// the run and are rebuilt for the next one.
#[derive(Clone)]
pub struct Services {
    pub registry: Arc<ToolRegistry>,
    pub resolver: Arc<RecipeResolver>,
    pub templates: Arc<dyn TemplateEngine>,
    pub transformer: Arc<dyn Transformer>,
    pub actions: Arc<ActionRegistry>,
    pub prompter: Arc<dyn Prompter>,
    pub events: Arc<dyn EventSink>,
    pub ai: Arc<AiSession>,
    pub config: ExecutorConfig,
}

impl Services {
    pub fn new(registry: Arc<ToolRegistry>) -> Self {
        Self {
            registry,
            resolver: Arc::new(RecipeResolver::new(
                ResolverConfig::default(),
                Arc::new(ReqwestFetcher::new()),
            )),
            templates: Arc::new(TeraEngine::new()),
            transformer: Arc::new(TextTransformer),
            actions: Arc::new(ActionRegistry::with_builtins()),
            prompter: Arc::new(NonInteractivePrompter),
            events: Arc::new(NoOpEventSink),
            ai: Arc::new(AiSession::collect()),
            config: ExecutorConfig::default(),
        }
    }

    pub fn with_config(mut self, config: ExecutorConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_resolver(mut self, resolver: Arc<RecipeResolver>) -> Self {
        self.resolver = resolver;
        self
    }

    pub fn with_templates(mut self, templates: Arc<dyn TemplateEngine>) -> Self {
        self.templates = templates;
        self
    }

    pub fn with_transformer(mut self, transformer: Arc<dyn Transformer>) -> Self {
        self.transformer = transformer;
        self
    }

    pub fn with_actions(mut self, actions: Arc<ActionRegistry>) -> Self {
        self.actions = actions;
        self
    }

    pub fn with_prompter(mut self, prompter: Arc<dyn Prompter>) -> Self {
        self.prompter = prompter;
        self
    }

    pub fn with_events(mut self, events: Arc<dyn EventSink>) -> Self {
        self.events = events;
        self
    }

    pub fn with_ai(mut self, ai: Arc<AiSession>) -> Self {
        self.ai = ai;
        self
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunFlags {
    pub dry_run: bool,
    pub force: bool,
    pub skip_prompts: bool,
}

/// Per-execution state handed to every tool.
///
/// `variables` is shared and mutated in place; `results` is scoped to one
/// recipe (sub-recipes start from an empty map).
#[derive(Clone)]
pub struct StepContext {
    pub run_id: Uuid,
    pub project_root: PathBuf,
    pub working_dir: PathBuf,
    /// Directory of the recipe file; relative template and recipe paths start here.
    pub recipe_dir: Option<PathBuf>,
    pub recipe_name: String,
    pub settings: RecipeSettings,
    pub variables: Arc<RwLock<Variables>>,
    pub results: Arc<RwLock<BTreeMap<String, StepResult>>>,
    pub flags: RunFlags,
    pub call_stack: CallStack,
    pub cancel: CancellationToken,
    pub services: Arc<Services>,
}

impl StepContext {
    pub fn new(services: Arc<Services>, project_root: impl Into<PathBuf>) -> Self {
        let project_root = project_root.into();
        Self {
            run_id: Uuid::new_v4(),
            working_dir: project_root.clone(),
            project_root,
            recipe_dir: None,
            recipe_name: String::new(),
            settings: RecipeSettings::default(),
            variables: Arc::new(RwLock::new(Variables::new())),
            results: Arc::new(RwLock::new(BTreeMap::new())),
            flags: RunFlags::default(),
            call_stack: CallStack::default(),
            cancel: CancellationToken::new(),
            services,
        }
    }

    /// Bind the context to a recipe: name, settings and its working directory.
    pub fn with_recipe(mut self, recipe: &Recipe, recipe_dir: Option<PathBuf>) -> Self {
        self.recipe_name = recipe.name.clone();
        self.settings = recipe.settings();
        if let Some(dir) = self.settings.working_dir.as_deref() {
            self.working_dir = self.project_root.join(dir);
        }
        self.recipe_dir = recipe_dir;
        self
    }

    pub fn with_variables(self, variables: Variables) -> Self {
        *self.variables.write().unwrap_or_else(|e| e.into_inner()) = variables;
        self
    }

    pub fn with_flags(mut self, flags: RunFlags) -> Self {
        self.flags = flags;
        self
    }

    pub fn with_cancel(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn with_call_stack(mut self, call_stack: CallStack) -> Self {
        self.call_stack = call_stack;
        self
    }

    pub fn with_run_id(mut self, run_id: Uuid) -> Self {
        self.run_id = run_id;
        self
    }

    pub fn variables(&self) -> Variables {
        self.variables.read().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn variable(&self, name: &str) -> Option<Value> {
        self.variables
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(name)
            .cloned()
    }

    pub fn set_variable(&self, name: impl Into<String>, value: Value) {
        self.variables
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .insert(name.into(), value);
    }

    pub fn record_result(&self, result: StepResult) {
        self.results
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .insert(result.name.clone(), result);
    }

    pub fn result(&self, name: &str) -> Option<StepResult> {
        self.results
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(name)
            .cloned()
    }

    /// Variables plus `steps.<name>.{status,error,toolType}`.
    pub fn expression_scope(&self) -> Value {
        let mut scope: Map<String, Value> = self
            .variables()
            .into_iter()
            .collect();
        let results = self.results.read().unwrap_or_else(|e| e.into_inner());
        let steps: Map<String, Value> = results
            .iter()
            .map(|(name, r)| {
                (
                    name.clone(),
                    json!({
                        "status": r.status.as_str(),
                        "error": r.error_message(),
                        "toolType": r.tool_type.as_str(),
                    }),
                )
            })
            .collect();
        scope.insert("steps".to_string(), Value::Object(steps));
        Value::Object(scope)
    }

    pub fn evaluate_condition(&self, expr: &str) -> Result<bool, ToolError> {
        Ok(evaluate_bool(expr, &self.expression_scope())?)
    }

    pub fn interpolate(&self, input: &str) -> Result<String, ToolError> {
        if !input.contains("{{") {
            return Ok(input.to_string());
        }
        Ok(interpolate(input, &self.expression_scope())?)
    }

    pub fn interpolate_value(&self, value: &Value) -> Result<Value, ToolError> {
        Ok(interpolate_value(value, &self.expression_scope())?)
    }

    /// Resolve a step path against the working directory.
    pub fn resolve_path(&self, path: &str) -> PathBuf {
        let p = Path::new(path);
        if p.is_absolute() {
            p.to_path_buf()
        } else {
            self.working_dir.join(p)
        }
    }

    /// Path as reported in results: relative to the project root when possible.
    pub fn display_path(&self, path: &Path) -> String {
        path.strip_prefix(&self.project_root)
            .unwrap_or(path)
            .to_string_lossy()
            .replace('\\', "/")
    }

    /// Base directory for relative template and recipe references.
    pub fn source_dir(&self) -> &Path {
        self.recipe_dir.as_deref().unwrap_or(&self.project_root)
    }

    pub async fn emit(&self, event: Event) {
        self.services.events.emit(event).await;
    }

    /// Context for a nested group: same variables, a snapshot of the results so far.
    pub fn derive_group(&self) -> Self {
        let snapshot = self.results.read().unwrap_or_else(|e| e.into_inner()).clone();
        let mut ctx = self.clone();
        ctx.results = Arc::new(RwLock::new(snapshot));
        ctx
    }

    /// Context for a sub-recipe: own variables and results, same run and flags.
    pub fn derive_sub_recipe(
        &self,
        recipe: &Recipe,
        recipe_dir: Option<PathBuf>,
        call_stack: CallStack,
        working_dir: Option<PathBuf>,
        variables: Variables,
    ) -> Self {
        let mut ctx = self.clone();
        ctx.variables = Arc::new(RwLock::new(variables));
        ctx.results = Arc::new(RwLock::new(BTreeMap::new()));
        ctx.call_stack = call_stack;
        ctx.working_dir = self.project_root.clone();
        ctx = ctx.with_recipe(recipe, recipe_dir);
        if let Some(dir) = working_dir {
            ctx.working_dir = dir;
        }
        ctx
    }
}

impl std::fmt::Debug for StepContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StepContext")
            .field("run_id", &self.run_id)
            .field("recipe", &self.recipe_name)
            .field("working_dir", &self.working_dir)
            .field("flags", &self.flags)
            .field("depth", &self.call_stack.depth())
            .finish()
    }
}
