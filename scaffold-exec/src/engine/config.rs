use std::path::PathBuf;

use scaffold_core::types::Variables;
use tokio_util::sync::CancellationToken;

use crate::ai::Answers;
use crate::composition::ResolverConfig;
use crate::executor::ExecutorConfig;
use crate::registry::RegistryConfig;

/// Library defaults; CLI flags are applied on top per run.
#[derive(Debug, Clone, Default)]
pub struct EngineConfig {
    pub executor: ExecutorConfig,
    pub resolver: ResolverConfig,
    pub registry: RegistryConfig,
}

/// Per-run inputs.
#[derive(Debug, Clone)]
pub struct RunOptions {
    pub variables: Variables,
    pub project_root: PathBuf,
    pub dry_run: bool,
    pub force: bool,
    pub skip_prompts: bool,
    /// `None` runs AI steps in collect mode.
    pub answers: Option<Answers>,
    /// Print stdout-routed answers as they are applied.
    pub echo_stdout: bool,
    pub continue_on_error: bool,
    pub max_parallel: Option<usize>,
    pub cancel: CancellationToken,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            variables: Variables::new(),
            project_root: PathBuf::from("."),
            dry_run: false,
            force: false,
            skip_prompts: false,
            answers: None,
            echo_stdout: false,
            continue_on_error: false,
            max_parallel: None,
            cancel: CancellationToken::new(),
        }
    }
}

impl RunOptions {
    pub fn new(project_root: impl Into<PathBuf>) -> Self {
        Self {
            project_root: project_root.into(),
            ..Default::default()
        }
    }

    pub fn variable(mut self, name: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.variables.insert(name.into(), value.into());
        self
    }

    pub fn answers(mut self, answers: Answers) -> Self {
        self.answers = Some(answers);
        self
    }

    pub fn skip_prompts(mut self) -> Self {
        self.skip_prompts = true;
        self
    }

    pub fn dry_run(mut self) -> Self {
        self.dry_run = true;
        self
    }

    pub fn force(mut self) -> Self {
        self.force = true;
        self
    }
}
