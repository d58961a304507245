use std::time::Duration;

use scaffold_core::PlanError;

use crate::retry::RetryConfig;

#[derive(Debug, Clone)]
pub struct ExecutorConfig {
    /// Upper bound on concurrently running steps within one step list.
    pub max_parallel: usize,
    /// Fallback per-step timeout when neither the step nor the recipe sets one.
    pub step_timeout: Option<Duration>,
    /// Keep scheduling independent steps after a hard failure.
    pub continue_on_error: bool,
    pub retry: RetryConfig,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            max_parallel: 4,
            step_timeout: None,
            continue_on_error: false,
            retry: RetryConfig::default(),
        }
    }
}

/// How a step list is scheduled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GroupMode {
    /// Steps marked `parallel` run concurrently, the rest in declaration order.
    #[default]
    Mixed,
    /// Every step in a wave runs concurrently.
    Parallel,
}

#[derive(Debug, thiserror::Error)]
pub enum ExecutorError {
    #[error("cannot schedule steps: {0}")]
    Plan(#[from] PlanError),
}
