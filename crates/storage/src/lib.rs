// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! hive-storage: Durable state for the OpenHive orchestrator.
//!
//! Two small stores: one JSON file per task, one JSON usage file per
//! provider. Writes are whole-file (temp + rename); a corrupt file is
//! skipped with a warning, never fatal: in-memory state stays
//! authoritative for the run.

pub mod paths;
pub mod task_store;
pub mod usage_store;

use thiserror::Error;

pub use task_store::TaskStore;
pub use usage_store::{ProviderUsage, UsageStore, WindowUsage};

/// Errors from store operations
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}
