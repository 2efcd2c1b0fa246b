// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! CLI reasoning runner: prompt on stdin, verdict on stdout

use super::{ReasoningError, ReasoningRunner};
use crate::subprocess::{run_with_input_timeout, SubprocessError};
use async_trait::async_trait;
use std::time::Duration;
use tokio::process::Command;

/// Runs a configured reasoning command, writing the prompt to its stdin
/// and returning its stdout.
#[derive(Clone)]
pub struct CliReasoningRunner {
    command: String,
    args: Vec<String>,
    timeout: Duration,
}

impl CliReasoningRunner {
    pub fn new(command: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            command: command.into(),
            args,
            timeout: crate::env::reasoning_timeout_ms(),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

#[async_trait]
impl ReasoningRunner for CliReasoningRunner {
    async fn run(&self, prompt: &str) -> Result<String, ReasoningError> {
        let mut cmd = Command::new(&self.command);
        cmd.args(&self.args);

        let output = run_with_input_timeout(cmd, prompt, self.timeout, &self.command)
            .await
            .map_err(|e| match e {
                SubprocessError::MissingBinary(_) => ReasoningError::Missing(self.command.clone()),
                SubprocessError::TimedOut(_) => ReasoningError::Timeout(self.timeout.as_secs()),
                SubprocessError::Failed(msg) => ReasoningError::Launch(msg),
            })?;

        if !output.status.success() {
            return Err(ReasoningError::Failed {
                code: output.status.code(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).to_string())
    }
}

#[cfg(test)]
#[path = "cli_tests.rs"]
mod tests;
