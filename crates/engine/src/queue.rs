// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-memory task queue over the durable task store.
//!
//! Insertion order is the dispatch order. The queue exclusively owns Task
//! records; supervisors and the orchestrator hold ids and mutate through
//! [`TaskQueue::update`], which persists after every change.

use crate::error::OrchestratorError;
use hive_core::{Task, TaskError, TaskStatus};
use hive_storage::TaskStore;
use indexmap::IndexMap;

/// Insertion-ordered map of task id to task, mirrored to disk.
pub struct TaskQueue {
    tasks: IndexMap<String, Task>,
    store: TaskStore,
}

impl TaskQueue {
    pub fn new(store: TaskStore) -> Self {
        Self {
            tasks: IndexMap::new(),
            store,
        }
    }

    /// Load every stored task (creation order) into the queue.
    pub fn load_from_store(&mut self) {
        for task in self.store.load_all() {
            self.tasks.insert(task.id.to_string(), task);
        }
    }

    /// Add a task and persist it.
    pub fn add(&mut self, task: Task) {
        if let Err(e) = self.store.save(&task) {
            tracing::warn!(task_id = %task.id, error = %e, "failed to persist new task");
        }
        self.tasks.insert(task.id.to_string(), task);
    }

    pub fn get(&self, id: &str) -> Option<&Task> {
        self.tasks.get(id)
    }

    /// Mutate a task in place, then persist.
    ///
    /// The mutation may fail (illegal status transition); persistence
    /// failures only warn; in-memory state stays authoritative.
    pub fn update<F>(&mut self, id: &str, mutate: F) -> Result<(), OrchestratorError>
    where
        F: FnOnce(&mut Task) -> Result<(), TaskError>,
    {
        let task = self
            .tasks
            .get_mut(id)
            .ok_or_else(|| OrchestratorError::TaskNotFound(id.to_string()))?;
        mutate(task)?;
        if let Err(e) = self.store.save(task) {
            tracing::warn!(task_id = id, error = %e, "failed to persist task update");
        }
        Ok(())
    }

    /// Remove a task from the queue and delete its record.
    pub fn remove(&mut self, id: &str) -> Option<Task> {
        let task = self.tasks.shift_remove(id)?;
        if let Err(e) = self.store.delete(id) {
            tracing::warn!(task_id = id, error = %e, "failed to delete task record");
        }
        Some(task)
    }

    /// All tasks in insertion order.
    pub fn list(&self) -> impl Iterator<Item = &Task> {
        self.tasks.values()
    }

    /// Pending tasks in insertion order.
    pub fn pending(&self) -> Vec<&Task> {
        self.tasks
            .values()
            .filter(|t| t.status == TaskStatus::Pending)
            .collect()
    }

    /// Tasks that are not yet in a terminal state.
    pub fn open_count(&self) -> usize {
        self.tasks.values().filter(|t| !t.is_terminal()).count()
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }
}

#[cfg(test)]
#[path = "queue_tests.rs"]
mod tests;
