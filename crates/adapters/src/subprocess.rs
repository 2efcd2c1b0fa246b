// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Subprocess execution helpers
//!
//! Every external process the orchestrator runs (tmux calls, the
//! reasoning tool) goes through these bounded runners, so a wedged
//! binary can never stall a tick indefinitely.

use std::process::{Output, Stdio};
use std::time::Duration;
use thiserror::Error;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

/// Default timeout for tmux commands.
pub const TMUX_TIMEOUT: Duration = Duration::from_secs(10);

/// Default timeout for the external reasoning tool.
pub const REASONING_TIMEOUT: Duration = Duration::from_secs(60);

/// Default poll interval for ready-pattern detection.
pub const READY_POLL: Duration = Duration::from_millis(500);

/// Default total budget for ready-pattern detection.
pub const READY_MAX_WAIT: Duration = Duration::from_secs(30);

/// Why a bounded subprocess run produced no output.
///
/// Callers map these onto their own error types; the missing-binary case
/// is kept distinct because both consumers treat it specially (a missing
/// multiplexer is fatal, a missing reasoning tool downgrades to manual
/// mode).
#[derive(Debug, Error)]
pub enum SubprocessError {
    #[error("{0}: binary not found")]
    MissingBinary(String),
    #[error("{0}")]
    Failed(String),
    #[error("{0}")]
    TimedOut(String),
}

/// Run a subprocess command with a timeout.
///
/// The child process is killed automatically if the timeout elapses (via
/// the tokio `Child` drop implementation). A non-zero exit is not an
/// error here; callers inspect `Output::status` themselves.
pub async fn run_with_timeout(
    mut cmd: Command,
    timeout: Duration,
    description: &str,
) -> Result<Output, SubprocessError> {
    match tokio::time::timeout(timeout, cmd.output()).await {
        Ok(Ok(output)) => Ok(output),
        Ok(Err(e)) if e.kind() == std::io::ErrorKind::NotFound => {
            Err(SubprocessError::MissingBinary(description.to_string()))
        }
        Ok(Err(e)) => Err(SubprocessError::Failed(format!(
            "{} failed: {}",
            description, e
        ))),
        Err(_elapsed) => Err(SubprocessError::TimedOut(format!(
            "{} timed out after {}s",
            description,
            timeout.as_secs()
        ))),
    }
}

/// Run a subprocess, write `input` to its stdin, and collect its output
/// under a timeout.
///
/// Stdin is closed after the write so the tool sees EOF and answers.
/// Used for prompt-on-stdin tools like the reasoning runner.
pub async fn run_with_input_timeout(
    mut cmd: Command,
    input: &str,
    timeout: Duration,
    description: &str,
) -> Result<Output, SubprocessError> {
    cmd.stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    let mut child = cmd.spawn().map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            SubprocessError::MissingBinary(description.to_string())
        } else {
            SubprocessError::Failed(format!("{} failed to spawn: {}", description, e))
        }
    })?;

    if let Some(mut stdin) = child.stdin.take() {
        // A tool that answers without reading stdin closes the pipe
        // early; the write fails but the output is still what matters.
        if let Err(e) = stdin.write_all(input.as_bytes()).await {
            tracing::debug!(what = description, error = %e, "subprocess did not consume stdin");
        }
        drop(stdin);
    }

    match tokio::time::timeout(timeout, child.wait_with_output()).await {
        Ok(Ok(output)) => Ok(output),
        Ok(Err(e)) => Err(SubprocessError::Failed(format!(
            "{} failed: {}",
            description, e
        ))),
        // kill_on_drop reaps the child when the future is dropped here.
        Err(_elapsed) => Err(SubprocessError::TimedOut(format!(
            "{} timed out after {}s",
            description,
            timeout.as_secs()
        ))),
    }
}

#[cfg(test)]
#[path = "subprocess_tests.rs"]
mod tests;
