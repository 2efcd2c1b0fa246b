// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Tmux multiplexer driver

use super::{MuxAdapter, MuxError};
use crate::subprocess::{run_with_timeout, SubprocessError, TMUX_TIMEOUT};
use async_trait::async_trait;
use std::path::Path;
use std::process::Output;
use tokio::process::Command;

/// Tmux-based multiplexer driver bound to one orchestrator session.
#[derive(Clone)]
pub struct TmuxDriver {
    session: String,
}

impl TmuxDriver {
    pub fn new(session: impl Into<String>) -> Self {
        Self {
            session: session.into(),
        }
    }

    pub fn session(&self) -> &str {
        &self.session
    }

    /// Run one tmux command under the shared timeout, mapping a missing
    /// binary to the fatal `Unavailable` error.
    async fn tmux(&self, args: &[&str]) -> Result<Output, MuxError> {
        let mut cmd = Command::new("tmux");
        cmd.args(args);
        let what = format!("tmux {}", args.first().unwrap_or(&""));
        run_with_timeout(cmd, TMUX_TIMEOUT, &what)
            .await
            .map_err(|e| match e {
                SubprocessError::MissingBinary(_) => {
                    MuxError::Unavailable("tmux binary not found".to_string())
                }
                SubprocessError::Failed(msg) | SubprocessError::TimedOut(msg) => {
                    MuxError::CommandFailed(msg)
                }
            })
    }
}

#[async_trait]
impl MuxAdapter for TmuxDriver {
    async fn ensure_session(&self) -> Result<(), MuxError> {
        // `=` prefix forces an exact session-name match
        let exact = format!("={}", self.session);
        let existing = self.tmux(&["has-session", "-t", &exact]).await?;
        if existing.status.success() {
            return Ok(());
        }

        let output = self
            .tmux(&["new-session", "-d", "-s", &self.session, "-x", "220", "-y", "50"])
            .await?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            // Lost the race against a concurrent ensure_session: fine.
            if stderr.contains("duplicate session") {
                return Ok(());
            }
            tracing::error!(session = %self.session, stderr = %stderr, "tmux new-session failed");
            return Err(MuxError::Unavailable(stderr.trim().to_string()));
        }
        Ok(())
    }

    async fn create_window(&self, name: &str, command: &str) -> Result<String, MuxError> {
        let output = self
            .tmux(&[
                "new-window",
                "-d",
                "-t",
                &self.session,
                "-n",
                name,
                "-P",
                "-F",
                "#{session_name}:#{window_name}",
                command,
            ])
            .await?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            tracing::error!(
                session = %self.session,
                window = name,
                stderr = %stderr,
                "tmux new-window failed"
            );
            return Err(MuxError::CommandFailed(stderr.trim().to_string()));
        }

        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }

    async fn kill_window(&self, target: &str) -> Result<(), MuxError> {
        let output = self.tmux(&["kill-window", "-t", target]).await?;
        if !output.status.success() {
            // Window might already be dead, which is fine.
            tracing::debug!(window = target, "kill-window reported failure (already gone?)");
        }
        Ok(())
    }

    async fn kill_session(&self) -> Result<(), MuxError> {
        let output = self.tmux(&["kill-session", "-t", &self.session]).await?;
        if !output.status.success() {
            // Session might already be dead, which is fine.
            tracing::debug!(session = %self.session, "kill-session reported failure (already gone?)");
        }
        Ok(())
    }

    async fn capture_pane(&self, target: &str, lines: Option<u32>) -> Result<String, MuxError> {
        let from;
        // -p print to stdout, -e keep escape sequences (colors)
        let mut args = vec!["capture-pane", "-p", "-e", "-t", target];
        if let Some(n) = lines {
            from = format!("-{}", n);
            args.push("-S");
            args.push(&from);
        }

        let output = self.tmux(&args).await?;
        if !output.status.success() {
            return Err(MuxError::NotFound(target.to_string()));
        }
        Ok(String::from_utf8_lossy(&output.stdout).to_string())
    }

    async fn send_text(&self, target: &str, text: &str) -> Result<(), MuxError> {
        // -l = literal mode (no key name interpretation)
        // -- = end of options (handles text starting with -)
        let output = self
            .tmux(&["send-keys", "-t", target, "-l", "--", text])
            .await?;
        if !output.status.success() {
            return Err(MuxError::NotFound(target.to_string()));
        }

        let output = self.tmux(&["send-keys", "-t", target, "Enter"]).await?;
        if !output.status.success() {
            return Err(MuxError::NotFound(target.to_string()));
        }
        Ok(())
    }

    async fn send_key(&self, target: &str, key: &str) -> Result<(), MuxError> {
        let output = self.tmux(&["send-keys", "-t", target, key]).await?;
        if !output.status.success() {
            return Err(MuxError::NotFound(target.to_string()));
        }
        Ok(())
    }

    async fn start_pipe_pane(&self, target: &str, file: &Path) -> Result<(), MuxError> {
        if let Some(parent) = file.parent() {
            if let Err(e) = tokio::fs::create_dir_all(parent).await {
                return Err(MuxError::CommandFailed(format!(
                    "create pipe dir {}: {}",
                    parent.display(),
                    e
                )));
            }
        }

        // -o only pipes when no pipe is already attached; idempotent.
        let sink = format!("cat >> '{}'", file.display());
        let output = self
            .tmux(&["pipe-pane", "-o", "-t", target, &sink])
            .await?;
        if !output.status.success() {
            return Err(MuxError::NotFound(target.to_string()));
        }
        Ok(())
    }

    async fn file_size(&self, path: &Path) -> u64 {
        tokio::fs::metadata(path).await.map(|m| m.len()).unwrap_or(0)
    }
}

#[cfg(test)]
#[path = "tmux_tests.rs"]
mod tests;
