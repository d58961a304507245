//! Scheduling and execution of recipe steps.

pub mod concurrency;
mod context;
pub mod events;
mod result;
mod scheduler;
mod step_runner;
mod types;

pub use context::{RunFlags, Services, StepContext};
pub use events::{
    ChannelEventSink, CompositeEventSink, Event, EventSink, NoOpEventSink, TracingEventSink,
};
pub use result::{
    ExecutionOutcome, FailureInfo, RunStatus, RunSummary, StepError, StepResult, StepStatus,
};
pub use scheduler::{StepExecutor, DEPENDENCY_FAILED};
pub use types::{ExecutorConfig, ExecutorError, GroupMode};
