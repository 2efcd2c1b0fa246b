// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Worker record and detected state tags.
//!
//! A worker is one long-lived interactive agent CLI hosted in a dedicated
//! multiplexer window. The worker owns its window for its lifetime;
//! destroying the worker destroys the window.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

crate::string_id! {
    /// Unique identifier for a worker instance.
    pub struct WorkerId;
}

impl WorkerId {
    /// Worker ids are short sequence handles ("w1", "w2", ...), minted by
    /// the orchestrator that owns the workers.
    pub fn numbered(seq: u64) -> Self {
        Self::new(format!("w{seq}"))
    }
}

/// State of a worker as classified from its pane text.
///
/// `Starting` is the pre-detection state; `Stuck` and `Dead` are
/// refinements applied by the supervisor, not pattern matches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkerState {
    Starting,
    Idle,
    Working,
    WaitingApproval,
    WaitingInput,
    RateLimited,
    Stuck,
    Error,
    Dead,
}

impl WorkerState {
    /// Human-readable explanation, included when seeking a reasoning verdict.
    pub fn explanation(&self) -> &'static str {
        match self {
            WorkerState::Starting => "the tool is still launching and has not rendered a prompt",
            WorkerState::Idle => "the tool is at its prompt, ready for input",
            WorkerState::Working => "the tool is actively processing",
            WorkerState::WaitingApproval => {
                "the tool is asking permission to perform an action and needs an explicit yes or no"
            }
            WorkerState::WaitingInput => "the tool asked a clarifying question and is blocked on an answer",
            WorkerState::RateLimited => "the provider reported a rate limit; the tool cannot proceed yet",
            WorkerState::Stuck => "the tool claims to be working but has produced no output for a long time",
            WorkerState::Error => "the tool reported a fatal error",
            WorkerState::Dead => "the tool's window is gone",
        }
    }

    /// States in which a new task may be assigned to the worker.
    pub fn accepts_assignment(&self) -> bool {
        matches!(
            self,
            WorkerState::Idle | WorkerState::WaitingInput | WorkerState::WaitingApproval
        )
    }

    /// States that escalate to the reasoning agent when they persist.
    pub fn needs_attention(&self) -> bool {
        matches!(
            self,
            WorkerState::Stuck | WorkerState::WaitingApproval | WorkerState::WaitingInput
        )
    }
}

impl fmt::Display for WorkerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WorkerState::Starting => write!(f, "starting"),
            WorkerState::Idle => write!(f, "idle"),
            WorkerState::Working => write!(f, "working"),
            WorkerState::WaitingApproval => write!(f, "waiting_approval"),
            WorkerState::WaitingInput => write!(f, "waiting_input"),
            WorkerState::RateLimited => write!(f, "rate_limited"),
            WorkerState::Stuck => write!(f, "stuck"),
            WorkerState::Error => write!(f, "error"),
            WorkerState::Dead => write!(f, "dead"),
        }
    }
}

/// A worker instance bound to one multiplexer window.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Worker {
    pub id: WorkerId,
    /// Tool name (profile and registry key, e.g. "claude").
    pub tool: String,
    /// Multiplexer target (`session:window`).
    pub target: String,
    pub state: WorkerState,
    pub tasks_completed: u32,
    /// File receiving the pane's piped output.
    pub pipe_path: PathBuf,
    /// Pipe file size at the last tick; growth means output activity.
    pub last_pipe_size: u64,
    pub last_check_ms: u64,
    pub last_output_change_ms: u64,
    pub created_at_ms: u64,
}

impl Worker {
    pub fn new(
        id: WorkerId,
        tool: impl Into<String>,
        target: impl Into<String>,
        pipe_path: PathBuf,
        created_at_ms: u64,
    ) -> Self {
        Self {
            id,
            tool: tool.into(),
            target: target.into(),
            state: WorkerState::Starting,
            tasks_completed: 0,
            pipe_path,
            last_pipe_size: 0,
            last_check_ms: created_at_ms,
            last_output_change_ms: created_at_ms,
            created_at_ms,
        }
    }
}

#[cfg(test)]
#[path = "worker_tests.rs"]
mod tests;
