use async_trait::async_trait;
use scaffold_core::ToolType;
use serde::Serialize;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::executor::RunStatus;

/// Lifecycle notifications emitted while a run progresses.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type")]
pub enum Event {
    #[serde(rename = "run.started")]
    RunStarted { run_id: Uuid, recipe: String },
    #[serde(rename = "run.finished")]
    RunFinished {
        run_id: Uuid,
        recipe: String,
        status: RunStatus,
    },
    #[serde(rename = "recipe.entered")]
    RecipeEntered {
        run_id: Uuid,
        recipe: String,
        depth: usize,
    },
    #[serde(rename = "recipe.exited")]
    RecipeExited {
        run_id: Uuid,
        recipe: String,
        succeeded: bool,
    },
    #[serde(rename = "step.started")]
    StepStarted {
        run_id: Uuid,
        step: String,
        tool: ToolType,
    },
    #[serde(rename = "step.completed")]
    StepCompleted {
        run_id: Uuid,
        step: String,
        duration_ms: u64,
    },
    #[serde(rename = "step.failed")]
    StepFailed {
        run_id: Uuid,
        step: String,
        error: String,
    },
    #[serde(rename = "step.skipped")]
    StepSkipped {
        run_id: Uuid,
        step: String,
        reason: String,
    },
    #[serde(rename = "step.retry_scheduled")]
    StepRetryScheduled {
        run_id: Uuid,
        step: String,
        attempt: u32,
        delay_ms: u64,
    },
    #[serde(rename = "attempt.started")]
    AttemptStarted {
        run_id: Uuid,
        step: String,
        attempt: u32,
    },
    #[serde(rename = "attempt.finished")]
    AttemptFinished {
        run_id: Uuid,
        step: String,
        attempt: u32,
        succeeded: bool,
    },
}

impl Event {
    pub fn run_id(&self) -> Uuid {
        match self {
            Event::RunStarted { run_id, .. }
            | Event::RunFinished { run_id, .. }
            | Event::RecipeEntered { run_id, .. }
            | Event::RecipeExited { run_id, .. }
            | Event::StepStarted { run_id, .. }
            | Event::StepCompleted { run_id, .. }
            | Event::StepFailed { run_id, .. }
            | Event::StepSkipped { run_id, .. }
            | Event::StepRetryScheduled { run_id, .. }
            | Event::AttemptStarted { run_id, .. }
            | Event::AttemptFinished { run_id, .. } => *run_id,
        }
    }

    pub fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }
}

#[async_trait]
pub trait EventSink: Send + Sync {
    async fn emit(&self, event: Event);
}

pub struct CompositeEventSink {
    sinks: Vec<Box<dyn EventSink>>,
}

impl Default for CompositeEventSink {
    fn default() -> Self {
        Self::new()
    }
}

impl CompositeEventSink {
    pub fn new() -> Self {
        Self { sinks: Vec::new() }
    }

    pub fn add(&mut self, sink: Box<dyn EventSink>) {
        self.sinks.push(sink);
    }

    pub fn with(mut self, sink: Box<dyn EventSink>) -> Self {
        self.add(sink);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }
}

#[async_trait]
impl EventSink for CompositeEventSink {
    async fn emit(&self, event: Event) {
        for sink in &self.sinks {
            sink.emit(event.clone()).await;
        }
    }
}

/// Turns lifecycle events into log lines.
pub struct TracingEventSink;

#[async_trait]
impl EventSink for TracingEventSink {
    async fn emit(&self, event: Event) {
        match event {
            Event::RunStarted { run_id, recipe } => info!(%run_id, %recipe, "run started"),
            Event::RunFinished {
                run_id,
                recipe,
                status,
            } => info!(%run_id, %recipe, status = status.as_str(), "run finished"),
            Event::RecipeEntered {
                run_id,
                recipe,
                depth,
            } => debug!(%run_id, %recipe, depth, "entering sub-recipe"),
            Event::RecipeExited {
                run_id,
                recipe,
                succeeded,
            } => debug!(%run_id, %recipe, succeeded, "leaving sub-recipe"),
            Event::StepStarted { run_id, step, tool } => {
                info!(%run_id, %step, %tool, "step started")
            }
            Event::StepCompleted {
                run_id,
                step,
                duration_ms,
            } => info!(%run_id, %step, duration_ms, "step completed"),
            Event::StepFailed { run_id, step, error } => {
                warn!(%run_id, %step, %error, "step failed")
            }
            Event::StepSkipped {
                run_id,
                step,
                reason,
            } => info!(%run_id, %step, %reason, "step skipped"),
            Event::StepRetryScheduled {
                run_id,
                step,
                attempt,
                delay_ms,
            } => debug!(%run_id, %step, attempt, delay_ms, "retry scheduled"),
            Event::AttemptStarted {
                run_id,
                step,
                attempt,
            } => debug!(%run_id, %step, attempt, "attempt started"),
            Event::AttemptFinished {
                run_id,
                step,
                attempt,
                succeeded,
            } => debug!(%run_id, %step, attempt, succeeded, "attempt finished"),
        }
    }
}

/// Forwards events to a tokio channel. A closed receiver drops events silently.
pub struct ChannelEventSink {
    tx: mpsc::UnboundedSender<Event>,
}

impl ChannelEventSink {
    pub fn new(tx: mpsc::UnboundedSender<Event>) -> Self {
        Self { tx }
    }

    pub fn channel() -> (Self, mpsc::UnboundedReceiver<Event>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

#[async_trait]
impl EventSink for ChannelEventSink {
    async fn emit(&self, event: Event) {
        let _ = self.tx.send(event);
    }
}

pub struct NoOpEventSink;

#[async_trait]
impl EventSink for NoOpEventSink {
    async fn emit(&self, _event: Event) {}
}
