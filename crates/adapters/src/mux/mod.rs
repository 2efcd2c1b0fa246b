// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Terminal multiplexer adapters.
//!
//! The orchestrator drives opaque interactive CLIs through a multiplexer
//! that can create named windows, capture a pane's rendered text, send
//! keystrokes, and pipe a pane's output to a file. Targets use the
//! `session:window` syntax.

mod tmux;

pub use tmux::TmuxDriver;

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
mod fake;
#[cfg(any(test, feature = "test-support"))]
pub use fake::{FakeMuxAdapter, MuxCall};

use crate::ansi::strip_ansi;
use async_trait::async_trait;
use regex::Regex;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

/// Errors from multiplexer operations
#[derive(Debug, Error)]
pub enum MuxError {
    /// The multiplexer binary is missing or broken. Fatal: the
    /// orchestrator cannot run without it.
    #[error("multiplexer unavailable: {0}")]
    Unavailable(String),
    #[error("timed out waiting for ready pattern: {0}")]
    TimeoutReady(String),
    #[error("target not found: {0}")]
    NotFound(String),
    #[error("command failed: {0}")]
    CommandFailed(String),
}

/// Adapter for driving a terminal multiplexer (tmux, etc.)
#[async_trait]
pub trait MuxAdapter: Clone + Send + Sync + 'static {
    /// Create the orchestrator session if absent. Idempotent.
    async fn ensure_session(&self) -> Result<(), MuxError>;

    /// Create a named window running `command`; returns the composite
    /// `session:window` target.
    async fn create_window(&self, name: &str, command: &str) -> Result<String, MuxError>;

    /// Kill a window. Idempotent.
    async fn kill_window(&self, target: &str) -> Result<(), MuxError>;

    /// Kill the orchestrator session. Idempotent.
    async fn kill_session(&self) -> Result<(), MuxError>;

    /// Capture the rendered, ANSI-coloured text of the pane's visible
    /// buffer, optionally the last `lines`.
    async fn capture_pane(&self, target: &str, lines: Option<u32>) -> Result<String, MuxError>;

    /// Type `text` into the pane followed by the confirmation key (Enter).
    async fn send_text(&self, target: &str, text: &str) -> Result<(), MuxError>;

    /// Send a named key (e.g. "Enter", "Escape", "y") to the pane.
    async fn send_key(&self, target: &str, key: &str) -> Result<(), MuxError>;

    /// Attach a byte-for-byte pipe of all future pane output to `file`.
    /// Safe to call before the file exists.
    async fn start_pipe_pane(&self, target: &str, file: &Path) -> Result<(), MuxError>;

    /// Current size of a file in bytes; 0 when it does not exist yet.
    async fn file_size(&self, path: &Path) -> u64;

    /// Poll `capture_pane` until the ANSI-stripped text matches `pattern`
    /// or `max_wait` elapses. Returns the matching stripped text.
    async fn wait_for_ready(
        &self,
        target: &str,
        pattern: &Regex,
        max_wait: Duration,
        poll: Duration,
    ) -> Result<String, MuxError> {
        let deadline = tokio::time::Instant::now() + max_wait;
        loop {
            match self.capture_pane(target, None).await {
                Ok(raw) => {
                    let text = strip_ansi(&raw);
                    if pattern.is_match(&text) {
                        return Ok(text);
                    }
                }
                // Window may still be materializing; keep polling.
                Err(MuxError::NotFound(_)) => {}
                Err(e) => return Err(e),
            }
            if tokio::time::Instant::now() >= deadline {
                return Err(MuxError::TimeoutReady(pattern.to_string()));
            }
            tokio::time::sleep(poll).await;
        }
    }
}
