// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! One-JSON-file-per-task durable store.
//!
//! Save is a whole-file write through a temp file + atomic rename, so a
//! crash mid-write never leaves a truncated record behind.

use crate::StoreError;
use hive_core::Task;
use std::fs;
use std::path::{Path, PathBuf};

/// Durable task store rooted at one directory.
#[derive(Debug, Clone)]
pub struct TaskStore {
    dir: PathBuf,
}

impl TaskStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, id: &str) -> PathBuf {
        self.dir.join(format!("{}.json", id))
    }

    /// Persist a task, overwriting any previous record.
    pub fn save(&self, task: &Task) -> Result<(), StoreError> {
        fs::create_dir_all(&self.dir)?;
        let json = serde_json::to_string_pretty(task)?;

        let path = self.path_for(task.id.as_str());
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, json)?;
        fs::rename(&tmp, &path)?;
        Ok(())
    }

    /// Load one task. `Ok(None)` when no record exists.
    pub fn load(&self, id: &str) -> Result<Option<Task>, StoreError> {
        let path = self.path_for(id);
        let json = match fs::read_to_string(&path) {
            Ok(json) => json,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        Ok(Some(serde_json::from_str(&json)?))
    }

    /// Load every stored task, creation time ascending.
    ///
    /// A corrupt file is skipped with a warning; one bad record must not
    /// take the whole queue down.
    pub fn load_all(&self) -> Vec<Task> {
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(_) => return Vec::new(),
        };

        let mut tasks: Vec<Task> = entries
            .filter_map(|e| e.ok())
            .map(|e| e.path())
            .filter(|p| p.extension().is_some_and(|x| x == "json"))
            .filter_map(|path| match fs::read_to_string(&path) {
                Ok(json) => match serde_json::from_str::<Task>(&json) {
                    Ok(task) => {
                        if !hive_core::id::looks_like_token(task.id.as_str()) {
                            tracing::debug!(task_id = %task.id, "task id does not look generated (created externally?)");
                        }
                        Some(task)
                    }
                    Err(e) => {
                        tracing::warn!(path = %path.display(), error = %e, "skipping corrupt task file");
                        None
                    }
                },
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "skipping unreadable task file");
                    None
                }
            })
            .collect();

        tasks.sort_by_key(|t| t.created_at);
        tasks
    }

    /// Delete a task's record. Missing files are fine.
    pub fn delete(&self, id: &str) -> Result<(), StoreError> {
        match fs::remove_file(self.path_for(id)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
#[path = "task_store_tests.rs"]
mod tests;
