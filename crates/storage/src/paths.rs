// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Default storage locations under the user home directory.

use std::path::PathBuf;

/// Root of all OpenHive state (`~/.openhive`).
///
/// Override with `HIVE_HOME` for tests and sandboxed runs.
pub fn hive_root() -> PathBuf {
    if let Ok(root) = std::env::var("HIVE_HOME") {
        return PathBuf::from(root);
    }
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".openhive")
}

/// Default per-task JSON store (`~/.openhive/tasks`).
pub fn default_task_dir() -> PathBuf {
    hive_root().join("tasks")
}

/// Default per-provider usage store (`~/.openhive/usage`).
pub fn default_usage_dir() -> PathBuf {
    hive_root().join("usage")
}

/// Default log directory (`~/.openhive/logs`).
pub fn default_log_dir() -> PathBuf {
    hive_root().join("logs")
}

/// Default per-worker pipe file directory (`~/.openhive/logs/workers`).
pub fn default_worker_log_dir() -> PathBuf {
    default_log_dir().join("workers")
}
