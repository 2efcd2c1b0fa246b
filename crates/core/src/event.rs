// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Lifecycle events emitted by the orchestrator.
//!
//! Serializes with `{"type": "scope:name", ...fields}` format. Consumers
//! (TUI, logger, JSON dumper) subscribe through the orchestrator's event
//! callback; nothing in the core depends on who is listening.

use crate::id::abbrev;
use crate::task::TaskId;
use crate::worker::{WorkerId, WorkerState};
use serde::{Deserialize, Serialize};

/// Events delivered to the orchestrator's `on_event` callback.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum OrchestratorEvent {
    #[serde(rename = "worker:created")]
    WorkerCreated { worker_id: WorkerId, tool: String },

    #[serde(rename = "worker:state")]
    StateChanged {
        worker_id: WorkerId,
        from: WorkerState,
        to: WorkerState,
    },

    #[serde(rename = "task:assigned")]
    TaskAssigned {
        task_id: TaskId,
        worker_id: WorkerId,
    },

    #[serde(rename = "task:completed")]
    TaskCompleted {
        task_id: TaskId,
        worker_id: WorkerId,
        duration_ms: u64,
    },

    #[serde(rename = "task:failed")]
    TaskFailed {
        task_id: TaskId,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        worker_id: Option<WorkerId>,
        reason: String,
    },

    #[serde(rename = "task:cancelled")]
    TaskCancelled { task_id: TaskId },

    /// A reasoning verdict was obtained for a worker needing attention.
    #[serde(rename = "reasoning:verdict")]
    ReasoningVerdict { worker_id: WorkerId, verdict: String },
}

impl OrchestratorEvent {
    /// Compact one-line summary for log output.
    pub fn log_summary(&self) -> String {
        match self {
            OrchestratorEvent::WorkerCreated { worker_id, tool } => {
                format!("worker:created {} ({})", worker_id.abbrev(8), tool)
            }
            OrchestratorEvent::StateChanged {
                worker_id,
                from,
                to,
            } => {
                format!("worker:state {} {} -> {}", worker_id.abbrev(8), from, to)
            }
            OrchestratorEvent::TaskAssigned { task_id, worker_id } => {
                format!(
                    "task:assigned {} -> {}",
                    task_id.abbrev(8),
                    worker_id.abbrev(8)
                )
            }
            OrchestratorEvent::TaskCompleted {
                task_id,
                duration_ms,
                ..
            } => {
                format!("task:completed {} ({}ms)", task_id.abbrev(8), duration_ms)
            }
            OrchestratorEvent::TaskFailed {
                task_id, reason, ..
            } => {
                format!("task:failed {} ({})", task_id.abbrev(8), reason)
            }
            OrchestratorEvent::TaskCancelled { task_id } => {
                format!("task:cancelled {}", task_id.abbrev(8))
            }
            OrchestratorEvent::ReasoningVerdict { worker_id, verdict } => {
                format!(
                    "reasoning:verdict {} ({})",
                    worker_id.abbrev(8),
                    abbrev(verdict, 24)
                )
            }
        }
    }
}

#[cfg(test)]
#[path = "event_tests.rs"]
mod tests;
