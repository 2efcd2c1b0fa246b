// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Reasoning-tool launchers.
//!
//! The orchestrator escalates stuck or approval-pending workers to an
//! arbitrary CLI reasoning tool. The bridge only needs "give it a prompt,
//! get text back"; which tool runs is configuration.

mod cli;

pub use cli::CliReasoningRunner;

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
mod fake;
#[cfg(any(test, feature = "test-support"))]
pub use fake::FakeReasoningRunner;

use async_trait::async_trait;
use thiserror::Error;

/// Errors from reasoning-tool invocation
#[derive(Debug, Clone, Error)]
pub enum ReasoningError {
    /// The configured tool binary does not exist.
    #[error("reasoning tool not found: {0}")]
    Missing(String),
    #[error("reasoning tool timed out after {0}s")]
    Timeout(u64),
    #[error("failed to launch reasoning tool: {0}")]
    Launch(String),
    #[error("reasoning tool exited with {code:?}: {stderr}")]
    Failed { code: Option<i32>, stderr: String },
}

/// Subprocess launcher that accepts a prompt and returns text.
#[async_trait]
pub trait ReasoningRunner: Clone + Send + Sync + 'static {
    async fn run(&self, prompt: &str) -> Result<String, ReasoningError>;
}
