use std::time::{Duration, Instant};

/// Lifecycle counters for one tool instance.
#[derive(Debug, Clone, Default)]
pub struct ToolMetrics {
    pub executions: u64,
    pub successes: u64,
    pub failures: u64,
    pub retries: u64,
    pub total_duration: Duration,
    pub created_at: Option<Instant>,
    pub last_used: Option<Instant>,
}

impl ToolMetrics {
    pub fn new() -> Self {
        Self {
            created_at: Some(Instant::now()),
            ..Default::default()
        }
    }

    pub fn record_success(&mut self, duration: Duration) {
        self.executions += 1;
        self.successes += 1;
        self.total_duration += duration;
        self.last_used = Some(Instant::now());
    }

    pub fn record_failure(&mut self, duration: Duration) {
        self.executions += 1;
        self.failures += 1;
        self.total_duration += duration;
        self.last_used = Some(Instant::now());
    }

    pub fn record_retry(&mut self) {
        self.retries += 1;
    }

    pub fn average_duration(&self) -> Option<Duration> {
        (self.executions > 0).then(|| self.total_duration / self.executions as u32)
    }

    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "executions": self.executions,
            "successes": self.successes,
            "failures": self.failures,
            "retries": self.retries,
            "total_duration_ms": self.total_duration.as_millis() as u64,
            "average_duration_ms": self.average_duration().map(|d| d.as_millis() as u64),
            "idle_ms": self.last_used.map(|t| t.elapsed().as_millis() as u64),
        })
    }
}
