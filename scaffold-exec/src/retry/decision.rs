use std::time::Duration;

use crate::retry::config::RetryConfig;
use crate::tool::ToolErrorKind;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetryDecision {
    RetryAfter { delay: Duration, reason: RetryReason },
    Stop { reason: RetryReason },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetryReason {
    NotRetryable(ToolErrorKind),
    AttemptsExhausted,
    Cancelled,
    Backoff,
}

/// Decide whether a failed attempt gets another go and how long to wait.
///
/// - `attempt_no`: 1-based number of the attempt that just failed.
/// - `max_retries`: retries allowed on top of the first attempt.
/// - `kind`: the failure's error kind; deterministic kinds never retry.
/// - `cancelled`: the run was cancelled, stop regardless of budget.
pub fn decide_retry(
    cfg: &RetryConfig,
    attempt_no: u32,
    max_retries: u32,
    kind: ToolErrorKind,
    cancelled: bool,
) -> RetryDecision {
    if cancelled {
        return RetryDecision::Stop {
            reason: RetryReason::Cancelled,
        };
    }
    if !kind.is_retryable() {
        return RetryDecision::Stop {
            reason: RetryReason::NotRetryable(kind),
        };
    }
    if attempt_no > max_retries {
        return RetryDecision::Stop {
            reason: RetryReason::AttemptsExhausted,
        };
    }
    RetryDecision::RetryAfter {
        delay: backoff_delay(cfg, attempt_no),
        reason: RetryReason::Backoff,
    }
}

/// Delay before retry `n` (1-based): `min(base * factor^(n-1), max)`.
pub fn backoff_delay(cfg: &RetryConfig, n: u32) -> Duration {
    let exp = n.saturating_sub(1).min(i32::MAX as u32) as i32;
    let raw = (cfg.base_delay.as_millis() as f64) * cfg.factor.powi(exp);
    let capped = raw.min(cfg.max_delay.as_millis() as f64).max(0.0);
    Duration::from_millis(capped as u64)
}
