use scaffold_exec::composition::ResolveError;
use scaffold_exec::{EngineError, RunStatus};

/// Exit codes for CI/automation.
pub const SUCCESS: i32 = 0;
pub const VALIDATION_FAILED: i32 = 2;
pub const RUN_FAILED: i32 = 3;
pub const RUNTIME_ERROR: i32 = 4;
/// A collect pass stopped with prompts waiting for an answers document.
pub const AWAITING_ANSWERS: i32 = 5;

pub fn for_status(status: RunStatus) -> i32 {
    match status {
        RunStatus::Succeeded => SUCCESS,
        RunStatus::AwaitingAnswers => AWAITING_ANSWERS,
        RunStatus::Failed | RunStatus::Cancelled => RUN_FAILED,
    }
}

pub fn for_error(err: &EngineError) -> i32 {
    match err {
        EngineError::Parse { .. }
        | EngineError::Validation(_)
        | EngineError::Plan(_)
        | EngineError::Resolve(ResolveError::Parse { .. }) => VALIDATION_FAILED,
        EngineError::Executor(_) => RUN_FAILED,
        EngineError::Io { .. } | EngineError::Resolve(_) => RUNTIME_ERROR,
    }
}
