use std::time::Duration;

/// Exponential backoff applied between attempts of a failing step.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryConfig {
    pub base_delay: Duration,
    pub factor: f64,
    pub max_delay: Duration,
    /// Default retry budget when neither the step nor the recipe sets one.
    pub retries: u32,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            base_delay: Duration::from_millis(1000),
            factor: 2.0,
            max_delay: Duration::from_secs(30),
            retries: 0,
        }
    }
}

impl RetryConfig {
    /// No waiting between attempts. Handy for tests.
    pub fn immediate() -> Self {
        Self {
            base_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
            ..Self::default()
        }
    }
}
