// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Task record and status state machine.
//!
//! A task is a natural-language unit of work submitted by the user. The
//! queue owns the record; supervisors and the orchestrator refer to tasks
//! by id and mutate them through the queue.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

crate::string_id! {
    /// Unique identifier for a task (12-char url-safe token).
    pub struct TaskId;
}

impl TaskId {
    /// Mint a fresh random task id.
    pub fn generate() -> Self {
        Self::new(crate::id::random_token())
    }
}

/// Errors from task mutation.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TaskError {
    #[error("invalid status transition: {from} -> {to}")]
    InvalidTransition { from: TaskStatus, to: TaskStatus },
}

/// Lifecycle status of a task.
///
/// Advances monotonically through pending -> queued -> running ->
/// (completed | failed | cancelled). Only `running` may repeat; terminal
/// states never transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    Pending,
    Queued,
    Running,
    Completed,
    Failed,
    Cancelled,
}

impl TaskStatus {
    /// Check if this status is terminal (no further transitions).
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            TaskStatus::Completed | TaskStatus::Failed | TaskStatus::Cancelled
        )
    }

    /// Check whether a transition to `next` is legal.
    pub fn can_transition_to(&self, next: TaskStatus) -> bool {
        use TaskStatus::*;
        matches!(
            (self, next),
            (Pending, Queued)
                | (Pending, Cancelled)
                | (Queued, Running)
                | (Queued, Failed)
                | (Queued, Cancelled)
                | (Running, Running)
                | (Running, Completed)
                | (Running, Failed)
                | (Running, Cancelled)
        )
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaskStatus::Pending => write!(f, "pending"),
            TaskStatus::Queued => write!(f, "queued"),
            TaskStatus::Running => write!(f, "running"),
            TaskStatus::Completed => write!(f, "completed"),
            TaskStatus::Failed => write!(f, "failed"),
            TaskStatus::Cancelled => write!(f, "cancelled"),
        }
    }
}

/// A unit of work submitted by the user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    pub prompt: String,
    /// Agent name explicitly requested for this task, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agent: Option<String>,
    /// Project this task belongs to, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project: Option<String>,
    /// Files to hand the agent as context.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub context_files: Vec<PathBuf>,
    pub status: TaskStatus,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exit_code: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stdout: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stderr: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<u64>,
    /// Worktree the collaborator checked out for this task, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub worktree_path: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub branch: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Fields written by other tools; preserved verbatim across save/load.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl Task {
    /// Create a new pending task.
    pub fn new(id: TaskId, prompt: impl Into<String>, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            prompt: prompt.into(),
            agent: None,
            project: None,
            context_files: Vec::new(),
            status: TaskStatus::Pending,
            created_at,
            started_at: None,
            completed_at: None,
            exit_code: None,
            stdout: None,
            stderr: None,
            duration_ms: None,
            worktree_path: None,
            branch: None,
            error: None,
            extra: serde_json::Map::new(),
        }
    }

    /// Request a specific agent.
    pub fn with_agent(mut self, agent: impl Into<String>) -> Self {
        self.agent = Some(agent.into());
        self
    }

    /// Attach a project id.
    pub fn with_project(mut self, project: impl Into<String>) -> Self {
        self.project = Some(project.into());
        self
    }

    /// Advance the status, rejecting illegal transitions.
    pub fn advance(&mut self, next: TaskStatus) -> Result<(), TaskError> {
        if !self.status.can_transition_to(next) {
            return Err(TaskError::InvalidTransition {
                from: self.status,
                to: next,
            });
        }
        self.status = next;
        Ok(())
    }

    /// Mark the task running and stamp `started_at`.
    pub fn start(&mut self, at: DateTime<Utc>) -> Result<(), TaskError> {
        self.advance(TaskStatus::Running)?;
        self.started_at = Some(at);
        Ok(())
    }

    /// Finalize the task into a terminal state, stamping `completed_at`
    /// and the elapsed duration since `started_at`.
    pub fn finalize(&mut self, status: TaskStatus, at: DateTime<Utc>) -> Result<(), TaskError> {
        self.advance(status)?;
        self.completed_at = Some(at);
        if let Some(started) = self.started_at {
            let elapsed = (at - started).num_milliseconds().max(0) as u64;
            self.duration_ms = Some(elapsed);
        }
        Ok(())
    }

    /// Check if the task is in a terminal state.
    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }
}

#[cfg(test)]
#[path = "task_tests.rs"]
mod tests;
