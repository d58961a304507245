//! Top-level façade: load, validate, inspect and run recipes.

mod config;
mod report;
mod variables;

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use scaffold_core::types::Recipe;
use scaffold_core::{
    parse_recipe_str, plan_recipe, DocumentFormat, ParseError, PlanError, ValidationError,
};
use tracing::{debug, info};
use uuid::Uuid;
use walkdir::WalkDir;

use crate::ai::AiSession;
use crate::composition::{CallStack, RecipeFetcher, RecipeResolver, ReqwestFetcher, ResolveError};
use crate::executor::events::{Event, EventSink};
use crate::executor::{
    ExecutorError, GroupMode, RunFlags, RunStatus, Services, StepContext, StepExecutor,
};
use crate::interaction::Prompter;
use crate::registry::ToolRegistry;

pub use config::{EngineConfig, RunOptions};
pub use report::{ExecutionReport, RecipeInfo, RecipeSummary, StepInfo, VariableInfo};
pub use variables::{parse_overrides, resolve_variables};

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse {location}: {source}")]
    Parse {
        location: String,
        #[source]
        source: ParseError,
    },
    #[error(transparent)]
    Resolve(#[from] ResolveError),
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Plan(#[from] PlanError),
    #[error(transparent)]
    Executor(#[from] ExecutorError),
}

/// A parsed recipe plus where it came from.
#[derive(Debug, Clone)]
pub struct LoadedRecipe {
    pub recipe: Recipe,
    /// Canonical path or URL; the root frame of the composition call stack.
    pub location: String,
    /// Directory relative template and recipe references resolve against.
    pub base_dir: Option<PathBuf>,
}

impl LoadedRecipe {
    pub fn from_str(input: &str, format: DocumentFormat, location: impl Into<String>) -> Result<Self, EngineError> {
        let location = location.into();
        let parsed = parse_recipe_str(input, format).map_err(|source| EngineError::Parse {
            location: location.clone(),
            source,
        })?;
        Ok(Self {
            recipe: parsed.recipe,
            location,
            base_dir: None,
        })
    }

    pub fn with_base_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.base_dir = Some(dir.into());
        self
    }
}

pub struct RecipeEngine {
    config: EngineConfig,
    fetcher: Arc<dyn RecipeFetcher>,
    services: Services,
}

impl Default for RecipeEngine {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

impl RecipeEngine {
    pub fn new(config: EngineConfig) -> Self {
        let registry = Arc::new(ToolRegistry::with_builtins(config.registry.clone()));
        let fetcher: Arc<dyn RecipeFetcher> = Arc::new(ReqwestFetcher::new());
        let resolver = Arc::new(RecipeResolver::new(config.resolver.clone(), fetcher.clone()));
        let services = Services::new(registry)
            .with_config(config.executor.clone())
            .with_resolver(resolver);
        Self {
            config,
            fetcher,
            services,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn registry(&self) -> &Arc<ToolRegistry> {
        &self.services.registry
    }

    pub fn with_registry(mut self, registry: Arc<ToolRegistry>) -> Self {
        self.services.registry = registry;
        self
    }

    pub fn with_fetcher(mut self, fetcher: Arc<dyn RecipeFetcher>) -> Self {
        self.services.resolver = Arc::new(RecipeResolver::new(self.config.resolver.clone(), fetcher.clone()));
        self.fetcher = fetcher;
        self
    }

    /// Resolutions made during a run stay with that run.
    fn run_resolver(&self) -> Arc<RecipeResolver> {
        Arc::new(RecipeResolver::new(self.config.resolver.clone(), self.fetcher.clone()))
    }

    pub fn with_prompter(mut self, prompter: Arc<dyn Prompter>) -> Self {
        self.services.prompter = prompter;
        self
    }

    pub fn with_events(mut self, events: Arc<dyn EventSink>) -> Self {
        self.services.events = events;
        self
    }

    /// Replace any collaborator not covered by the other builders. The
    /// resolver is rebuilt for every run from the configured fetcher.
    pub fn with_services(mut self, f: impl FnOnce(Services) -> Services) -> Self {
        self.services = f(self.services);
        self
    }

    /// Load a recipe from a file path, package name, repository reference or URL.
    pub async fn load(&self, source: &str, project_root: &Path) -> Result<LoadedRecipe, EngineError> {
        let path = Path::new(source);
        if path.is_file() {
            let content = tokio::fs::read_to_string(path)
                .await
                .map_err(|e| EngineError::Io {
                    path: path.to_path_buf(),
                    source: e,
                })?;
            let canonical = tokio::fs::canonicalize(path)
                .await
                .unwrap_or_else(|_| path.to_path_buf());
            let loaded = LoadedRecipe::from_str(
                &content,
                DocumentFormat::from_path(path),
                canonical.to_string_lossy(),
            )?;
            return Ok(match canonical.parent() {
                Some(dir) => loaded.with_base_dir(dir),
                None => loaded,
            });
        }

        let resolution = self
            .services
            .resolver
            .resolve(source, project_root, project_root)
            .await?;
        Ok(LoadedRecipe {
            recipe: resolution.recipe,
            location: resolution.location,
            base_dir: resolution.base_dir,
        })
    }

    /// Structural validation plus dependency planning; all problems are collected.
    pub fn validate(&self, recipe: &Recipe) -> Result<(), EngineError> {
        scaffold_core::validate_recipe(recipe)?;
        scaffold_core::plan_steps(&recipe.steps)?;
        Ok(())
    }

    pub fn info(&self, loaded: &LoadedRecipe) -> Result<RecipeInfo, EngineError> {
        let recipe = &loaded.recipe;
        let outcome = plan_recipe(recipe)?;
        let variables = recipe
            .variables
            .iter()
            .map(|(name, spec)| VariableInfo {
                name: name.clone(),
                var_type: spec.var_type.clone(),
                required: spec.required,
                default: spec.default.clone(),
                description: spec.description.clone(),
            })
            .collect();
        let plan = outcome.plan;
        let steps = recipe
            .steps
            .iter()
            .map(|s| StepInfo {
                name: s.name.clone(),
                tool: s.tool_type(),
                depends_on: plan
                    .as_ref()
                    .and_then(|p| p.graph.depends_on.get(&s.name).cloned())
                    .unwrap_or_else(|| s.depends_on.clone()),
                when: s.when.clone(),
                parallel: s.parallel,
            })
            .collect();
        Ok(RecipeInfo {
            name: recipe.name.clone(),
            description: recipe.description.clone(),
            version: recipe.version.clone(),
            location: loaded.location.clone(),
            variables,
            steps,
            contains_ai_steps: recipe.contains_ai_steps(),
            validation: outcome.validation,
            plan,
        })
    }

    /// Recipe files under `dir`, sorted by path. Hidden directories and files
    /// that do not parse as recipes are skipped.
    pub fn list(&self, dir: &Path) -> Result<Vec<RecipeSummary>, EngineError> {
        let mut out = Vec::new();
        let walker = WalkDir::new(dir)
            .follow_links(false)
            .into_iter()
            .filter_entry(|e| e.depth() == 0 || !e.file_name().to_string_lossy().starts_with('.'));
        for entry in walker {
            let entry = entry.map_err(|e| EngineError::Io {
                path: e.path().map(Path::to_path_buf).unwrap_or_else(|| dir.to_path_buf()),
                source: e.into(),
            })?;
            let path = entry.path();
            let is_candidate = entry.file_type().is_file()
                && matches!(
                    path.extension().and_then(|e| e.to_str()),
                    Some("yml" | "yaml" | "json")
                );
            if !is_candidate {
                continue;
            }
            let Ok(content) = std::fs::read_to_string(path) else {
                continue;
            };
            match parse_recipe_str(&content, DocumentFormat::from_path(path)) {
                Ok(parsed) if !parsed.recipe.name.is_empty() && !parsed.recipe.steps.is_empty() => {
                    out.push(RecipeSummary {
                        path: path.to_path_buf(),
                        name: parsed.recipe.name,
                        description: parsed.recipe.description,
                        version: parsed.recipe.version,
                        steps: parsed.recipe.steps.len(),
                    });
                }
                Ok(_) => {}
                Err(e) => debug!(path = %path.display(), error = %e, "not a recipe"),
            }
        }
        out.sort_by(|a, b| a.path.cmp(&b.path));
        Ok(out)
    }

    pub async fn run(&self, loaded: &LoadedRecipe, options: RunOptions) -> Result<ExecutionReport, EngineError> {
        let recipe = &loaded.recipe;
        self.validate(recipe)?;

        let project_root = tokio::fs::canonicalize(&options.project_root)
            .await
            .unwrap_or(options.project_root);
        let resolver = self.run_resolver();

        let ai = match options.answers {
            Some(answers) => AiSession::apply(answers),
            None => AiSession::collect(),
        }
        .with_echo(options.echo_stdout);
        let collecting = ai.is_collect() && reaches_ai_steps(&resolver, loaded, &project_root).await;
        let flags = RunFlags {
            dry_run: options.dry_run || collecting,
            force: options.force,
            skip_prompts: options.skip_prompts,
        };

        let mut executor = self.config.executor.clone();
        if options.continue_on_error {
            executor.continue_on_error = true;
        }
        if let Some(n) = options.max_parallel {
            executor.max_parallel = n.max(1);
        }
        let services = Arc::new(
            self.services
                .clone()
                .with_config(executor)
                .with_resolver(resolver)
                .with_ai(Arc::new(ai)),
        );
        services.registry.start_eviction();

        let variables = resolve_variables(
            recipe,
            options.variables,
            services.prompter.as_ref(),
            !flags.skip_prompts && !flags.dry_run,
        )
        .await?;

        let run_id = Uuid::new_v4();
        let ctx = StepContext::new(services.clone(), project_root)
            .with_run_id(run_id)
            .with_recipe(recipe, loaded.base_dir.clone())
            .with_variables(variables)
            .with_flags(flags)
            .with_cancel(options.cancel)
            .with_call_stack(CallStack::root(loaded.location.clone(), recipe.name.clone()));

        info!(%run_id, recipe = %recipe.name, dry_run = flags.dry_run, collecting, "run started");
        ctx.emit(Event::RunStarted {
            run_id,
            recipe: recipe.name.clone(),
        })
        .await;

        let started = Instant::now();
        let outcome = StepExecutor::execute(&recipe.steps, &ctx, GroupMode::Mixed).await?;
        let manifest = services.ai.manifest();

        let status = if outcome.cancelled {
            RunStatus::Cancelled
        } else if !outcome.succeeded() {
            RunStatus::Failed
        } else if services.ai.is_collect() && !manifest.is_empty() {
            RunStatus::AwaitingAnswers
        } else {
            RunStatus::Succeeded
        };

        ctx.emit(Event::RunFinished {
            run_id,
            recipe: recipe.name.clone(),
            status,
        })
        .await;
        info!(%run_id, %status, elapsed_ms = started.elapsed().as_millis() as u64, "run finished");

        let mut report =
            ExecutionReport::from_outcome(run_id, recipe, status, flags.dry_run, outcome, ctx.variables());
        if !manifest.is_empty() {
            report.manifest = Some(manifest);
        }
        report.stdout = services.ai.stdout_records();
        Ok(report)
    }
}

/// Whether an AI step is reachable from `loaded`, following `recipe` steps
/// with literal identifiers. References that fail to resolve are left for
/// the run to report.
async fn reaches_ai_steps(resolver: &RecipeResolver, loaded: &LoadedRecipe, project_root: &Path) -> bool {
    if loaded.recipe.contains_ai_steps() {
        return true;
    }
    let root_dir = loaded.base_dir.clone().unwrap_or_else(|| project_root.to_path_buf());
    let mut seen = HashSet::from([loaded.location.clone()]);
    let mut pending: Vec<(String, PathBuf)> = loaded
        .recipe
        .recipe_references()
        .into_iter()
        .map(|id| (id.to_string(), root_dir.clone()))
        .collect();

    while let Some((identifier, base_dir)) = pending.pop() {
        let resolution = match resolver.resolve(&identifier, &base_dir, project_root).await {
            Ok(r) => r,
            Err(e) => {
                debug!(recipe = %identifier, error = %e, "skipping unresolved reference in ai scan");
                continue;
            }
        };
        if !seen.insert(resolution.location.clone()) {
            continue;
        }
        if resolution.recipe.contains_ai_steps() {
            return true;
        }
        let dir = resolution.base_dir.clone().unwrap_or_else(|| project_root.to_path_buf());
        pending.extend(
            resolution
                .recipe
                .recipe_references()
                .into_iter()
                .map(|id| (id.to_string(), dir.clone())),
        );
    }
    false
}

impl std::fmt::Debug for RecipeEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecipeEngine")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
