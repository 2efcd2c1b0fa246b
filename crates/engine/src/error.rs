// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Error types for the engine runtime

use hive_adapters::{MuxError, ReasoningError};
use hive_core::worker::WorkerState;
use hive_core::TaskError;
use hive_storage::StoreError;
use thiserror::Error;

/// Errors that can occur in the orchestrator runtime
#[derive(Debug, Error)]
pub enum OrchestratorError {
    #[error(transparent)]
    Mux(#[from] MuxError),
    #[error("worker failed to become ready: {0}")]
    ReadyTimeout(String),
    #[error("reasoning tool not configured")]
    ReasoningMissing,
    #[error(transparent)]
    Reasoning(#[from] ReasoningError),
    #[error("task not found: {0}")]
    TaskNotFound(String),
    #[error("worker {worker} already has task {task}")]
    WorkerBusy { worker: String, task: String },
    #[error("worker {worker} cannot accept a task in state {state}")]
    NotAssignable { worker: String, state: WorkerState },
    #[error(transparent)]
    Task(#[from] TaskError),
    #[error("invalid pattern profile: {0}")]
    Profile(#[from] regex::Error),
    #[error(transparent)]
    Store(#[from] StoreError),
}
