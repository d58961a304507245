use std::process::Stdio;

use serde_json::json;
use tokio::process::Command;

use crate::executor::StepContext;
use crate::tool::ToolError;

const STDERR_TAIL_LINES: usize = 20;

pub(crate) struct ProcessOutput {
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

/// Run to completion, killing the child if the run is cancelled or the
/// attempt times out. A non-zero exit is an execution error.
pub(crate) async fn run(mut cmd: Command, shown: &str, ctx: &StepContext) -> Result<ProcessOutput, ToolError> {
    cmd.stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    let child = cmd
        .spawn()
        .map_err(|e| ToolError::execution(format!("failed to start `{shown}`: {e}")))?;

    let output = tokio::select! {
        out = child.wait_with_output() => out
            .map_err(|e| ToolError::execution(format!("`{shown}` failed: {e}")))?,
        _ = ctx.cancel.cancelled() => return Err(ToolError::cancelled()),
    };

    let result = ProcessOutput {
        code: output.status.code(),
        stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
        stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
    };
    tracing::debug!(command = %shown, code = ?result.code, "process exited");

    if !output.status.success() {
        let code = result
            .code
            .map_or_else(|| "a signal".to_string(), |c| c.to_string());
        let tail = stderr_tail(&result.stderr);
        let mut message = format!("`{shown}` exited with {code}");
        if !tail.is_empty() {
            message.push_str(": ");
            message.push_str(&tail);
        }
        return Err(ToolError::execution(message).with_details(json!({
            "exitCode": result.code,
            "stdout": result.stdout,
            "stderr": result.stderr,
        })));
    }
    Ok(result)
}

fn stderr_tail(stderr: &str) -> String {
    let lines: Vec<&str> = stderr.trim_end().lines().collect();
    let start = lines.len().saturating_sub(STDERR_TAIL_LINES);
    lines[start..].join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tail_keeps_last_lines() {
        let text: String = (0..30).map(|i| format!("line {i}\n")).collect();
        let tail = stderr_tail(&text);
        assert!(tail.starts_with("line 10"));
        assert!(tail.ends_with("line 29"));
    }
}
