// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-worker supervision.
//!
//! One supervisor per worker: it owns the window, the pipe-file size
//! tracking, the last state snapshot, and at most one assigned task. All
//! pane observation is a pull loop driven by [`WorkerSupervisor::tick`];
//! nothing survives across ticks except the worker record itself.

use crate::detector::{detect_from_output, refine_state};
use crate::error::OrchestratorError;
use crate::registry::RegisteredAgent;
use hive_adapters::{strip_ansi, MuxAdapter, MuxError};
use hive_core::pattern::tail_lines;
use hive_core::{PatternProfile, StateSnapshot, Task, TaskId, Worker, WorkerId, WorkerState};
use regex::Regex;
use std::path::Path;
use std::time::Duration;

/// Lines of pipe output captured as the task's stdout excerpt.
const OUTPUT_TAIL_LINES: usize = 100;

/// How much of the pipe file to consider when extracting the tail.
const PIPE_TAIL_BYTES: usize = 64 * 1024;

/// Tunables for one supervisor, resolved from the agent kind and the
/// orchestrator config.
#[derive(Debug, Clone)]
pub struct SupervisorConfig {
    pub ready_pattern: Regex,
    pub ready_max_wait: Duration,
    pub ready_poll: Duration,
    pub stuck_timeout_ms: u64,
    pub approve_key: String,
    pub cancel_key: String,
}

impl SupervisorConfig {
    /// Resolve the supervisor config for a registered agent.
    pub fn for_agent(
        agent: &RegisteredAgent,
        stuck_timeout_ms: u64,
    ) -> Result<Self, OrchestratorError> {
        Ok(Self {
            ready_pattern: Regex::new(agent.kind.ready_pattern())?,
            ready_max_wait: hive_adapters::env::ready_max_wait_ms(),
            ready_poll: hive_adapters::env::ready_poll_ms(),
            stuck_timeout_ms,
            approve_key: agent.kind.approve_key().to_string(),
            cancel_key: agent.kind.cancel_key().to_string(),
        })
    }
}

/// The task currently bound to a worker.
#[derive(Debug, Clone)]
pub struct Assignment {
    pub task_id: TaskId,
    pub prompt: String,
    pub assigned_at_ms: u64,
}

/// What one tick observed.
#[derive(Debug, Clone)]
pub struct TickReport {
    /// `(from, to)` when the state tag changed this tick.
    pub state_change: Option<(WorkerState, WorkerState)>,
    pub state: WorkerState,
    pub has_assignment: bool,
    /// A completion pattern matched: the tool finished its latest turn.
    pub turn_complete: bool,
}

/// A detached assignment, with the output excerpt gathered at detach time.
#[derive(Debug, Clone)]
pub struct FinishedAssignment {
    pub task_id: TaskId,
    pub assigned_at_ms: u64,
    pub output_tail: String,
}

/// Supervises one worker window.
pub struct WorkerSupervisor<M: MuxAdapter> {
    mux: M,
    worker: Worker,
    agent_name: String,
    provider: String,
    profile: PatternProfile,
    config: SupervisorConfig,
    snapshot: Option<StateSnapshot>,
    assignment: Option<Assignment>,
    restarts_this_assignment: u32,
    /// Set by [`mark_error`](Self::mark_error); pins the state so pane
    /// detection cannot revive a worker the orchestrator gave up on.
    marked_error: bool,
}

impl<M: MuxAdapter> WorkerSupervisor<M> {
    /// Spawn a worker: ensure the session, create the window, attach the
    /// pipe file, and wait for the tool's idle prompt.
    ///
    /// On ready timeout the window is torn down and the error propagated;
    /// the caller fails the task that was waiting on this worker.
    pub async fn spawn(
        mux: M,
        id: WorkerId,
        agent: &RegisteredAgent,
        pipe_dir: &Path,
        config: SupervisorConfig,
        now_ms: u64,
    ) -> Result<Self, OrchestratorError> {
        mux.ensure_session().await?;

        let window_name = format!("{}-{}", agent.name, id.abbrev(6));
        let target = mux.create_window(&window_name, &agent.command).await?;

        let pipe_path = pipe_dir.join(format!("{}.log", id));
        mux.start_pipe_pane(&target, &pipe_path).await?;

        let mut worker = Worker::new(id, agent.name.as_str(), target.as_str(), pipe_path, now_ms);

        match mux
            .wait_for_ready(
                &target,
                &config.ready_pattern,
                config.ready_max_wait,
                config.ready_poll,
            )
            .await
        {
            Ok(_) => {
                worker.state = WorkerState::Idle;
            }
            Err(MuxError::TimeoutReady(pattern)) => {
                tracing::warn!(worker_id = %worker.id, window = %target, "worker never became ready, killing window");
                let _ = mux.kill_window(&target).await;
                return Err(OrchestratorError::ReadyTimeout(pattern));
            }
            Err(e) => {
                let _ = mux.kill_window(&target).await;
                return Err(e.into());
            }
        }

        tracing::info!(worker_id = %worker.id, window = %worker.target, agent = %agent.name, "worker ready");

        Ok(Self {
            mux,
            worker,
            agent_name: agent.name.clone(),
            provider: agent.kind.provider().to_string(),
            profile: agent.profile.clone(),
            config,
            snapshot: None,
            assignment: None,
            restarts_this_assignment: 0,
            marked_error: false,
        })
    }

    pub fn worker(&self) -> &Worker {
        &self.worker
    }

    pub fn agent_name(&self) -> &str {
        &self.agent_name
    }

    pub fn provider(&self) -> &str {
        &self.provider
    }

    pub fn state(&self) -> WorkerState {
        self.worker.state
    }

    pub fn snapshot(&self) -> Option<&StateSnapshot> {
        self.snapshot.as_ref()
    }

    pub fn assignment(&self) -> Option<&Assignment> {
        self.assignment.as_ref()
    }

    pub fn has_assignment(&self) -> bool {
        self.assignment.is_some()
    }

    /// Bind a task to this worker and submit its prompt.
    ///
    /// Precondition: the worker is in an input-accepting state and has no
    /// current assignment.
    pub async fn assign(&mut self, task: &Task, now_ms: u64) -> Result<(), OrchestratorError> {
        if let Some(current) = &self.assignment {
            return Err(OrchestratorError::WorkerBusy {
                worker: self.worker.id.to_string(),
                task: current.task_id.to_string(),
            });
        }
        if !self.worker.state.accepts_assignment() {
            return Err(OrchestratorError::NotAssignable {
                worker: self.worker.id.to_string(),
                state: self.worker.state,
            });
        }

        let message = build_task_message(task);
        self.mux.send_text(&self.worker.target, &message).await?;

        self.assignment = Some(Assignment {
            task_id: task.id.clone(),
            prompt: message,
            assigned_at_ms: now_ms,
        });
        self.restarts_this_assignment = 0;
        self.worker.state = WorkerState::Working;
        self.worker.last_output_change_ms = now_ms;

        tracing::info!(worker_id = %self.worker.id, task_id = %task.id, "task assigned");
        Ok(())
    }

    /// Observe the pane once: capture, classify, refine, record.
    pub async fn tick(&mut self, now_ms: u64) -> TickReport {
        let old_state = self.worker.state;

        if self.marked_error {
            self.worker.last_check_ms = now_ms;
            return TickReport {
                state_change: None,
                state: WorkerState::Error,
                has_assignment: self.assignment.is_some(),
                turn_complete: false,
            };
        }

        let raw = match self.mux.capture_pane(&self.worker.target, None).await {
            Ok(raw) => raw,
            Err(MuxError::NotFound(_)) => {
                self.worker.state = WorkerState::Dead;
                self.worker.last_check_ms = now_ms;
                return TickReport {
                    state_change: (old_state != WorkerState::Dead)
                        .then_some((old_state, WorkerState::Dead)),
                    state: WorkerState::Dead,
                    has_assignment: self.assignment.is_some(),
                    turn_complete: false,
                };
            }
            Err(e) => {
                // Transient multiplexer trouble: keep the old state, the
                // next tick retries.
                tracing::warn!(worker_id = %self.worker.id, error = %e, "capture failed, will retry");
                return TickReport {
                    state_change: None,
                    state: old_state,
                    has_assignment: self.assignment.is_some(),
                    turn_complete: false,
                };
            }
        };

        let snapshot = detect_from_output(&self.profile, &raw, now_ms);

        // Pipe growth is the ground truth for "something happened";
        // activity patterns cover in-place screen updates (spinners).
        let pipe_size = self.mux.file_size(&self.worker.pipe_path).await;
        if pipe_size > self.worker.last_pipe_size {
            self.worker.last_pipe_size = pipe_size;
            self.worker.last_output_change_ms = now_ms;
        } else if self.profile.has_activity(&snapshot.pane) {
            self.worker.last_output_change_ms = now_ms;
        }

        let snapshot = refine_state(
            snapshot,
            self.worker.last_output_change_ms,
            self.config.stuck_timeout_ms,
            now_ms,
        );

        let new_state = snapshot.state;
        let turn_complete = self.profile.is_complete(&snapshot.pane);
        self.worker.state = new_state;
        self.worker.last_check_ms = now_ms;
        self.snapshot = Some(snapshot);

        TickReport {
            state_change: (old_state != new_state).then_some((old_state, new_state)),
            state: new_state,
            has_assignment: self.assignment.is_some(),
            turn_complete,
        }
    }

    /// Type free text into the worker's terminal (reasoning verdicts).
    pub async fn send_literal(&self, text: &str) -> Result<(), OrchestratorError> {
        self.mux.send_text(&self.worker.target, text).await?;
        Ok(())
    }

    /// Press the tool's affirmative key.
    pub async fn approve(&self) -> Result<(), OrchestratorError> {
        tracing::info!(worker_id = %self.worker.id, "approving");
        self.mux
            .send_key(&self.worker.target, &self.config.approve_key)
            .await?;
        Ok(())
    }

    /// Cancel the current turn and re-submit the assigned prompt.
    ///
    /// At most one restart per assignment; further RESTART verdicts are
    /// ignored with a warning to avoid cancel loops. Returns whether the
    /// restart was performed.
    pub async fn restart(&mut self) -> Result<bool, OrchestratorError> {
        let prompt = match &self.assignment {
            Some(assignment) => assignment.prompt.clone(),
            None => {
                tracing::warn!(worker_id = %self.worker.id, "restart requested without assignment");
                return Ok(false);
            }
        };
        if self.restarts_this_assignment >= 1 {
            tracing::warn!(worker_id = %self.worker.id, "restart already used for this assignment");
            return Ok(false);
        }

        self.mux
            .send_key(&self.worker.target, &self.config.cancel_key)
            .await?;
        self.mux.send_text(&self.worker.target, &prompt).await?;
        self.restarts_this_assignment += 1;
        self.worker.state = WorkerState::Working;
        Ok(true)
    }

    /// Detach the current assignment, gathering the output excerpt.
    ///
    /// On success the worker returns to idle and its completion counter
    /// advances; on failure the detected state (error, dead) is kept.
    pub async fn complete(&mut self, success: bool) -> Option<FinishedAssignment> {
        let assignment = self.assignment.take()?;
        let output_tail = self.output_tail().await;

        if success {
            self.worker.tasks_completed += 1;
            self.worker.state = WorkerState::Idle;
        }
        self.restarts_this_assignment = 0;

        Some(FinishedAssignment {
            task_id: assignment.task_id,
            assigned_at_ms: assignment.assigned_at_ms,
            output_tail,
        })
    }

    /// Kill the window. The worker record stays around as `dead`.
    pub async fn shutdown(&mut self) {
        if let Err(e) = self.mux.kill_window(&self.worker.target).await {
            tracing::warn!(worker_id = %self.worker.id, error = %e, "failed to kill window");
        }
        self.worker.state = WorkerState::Dead;
    }

    /// Mark the worker failed (repeated escalation failures).
    pub fn mark_error(&mut self) {
        self.worker.state = WorkerState::Error;
        self.marked_error = true;
    }

    /// Output excerpt: pipe file tail preferred, snapshot pane fallback.
    async fn output_tail(&self) -> String {
        if let Ok(bytes) = tokio::fs::read(&self.worker.pipe_path).await {
            if !bytes.is_empty() {
                let start = bytes.len().saturating_sub(PIPE_TAIL_BYTES);
                let text = String::from_utf8_lossy(&bytes[start..]);
                return tail_lines(&strip_ansi(&text), OUTPUT_TAIL_LINES);
            }
        }
        self.snapshot
            .as_ref()
            .map(|s| tail_lines(&s.pane, OUTPUT_TAIL_LINES))
            .unwrap_or_default()
    }
}

/// Render the text submitted to the worker for a task.
fn build_task_message(task: &Task) -> String {
    if task.context_files.is_empty() {
        return task.prompt.clone();
    }
    let files: Vec<String> = task
        .context_files
        .iter()
        .map(|p| p.display().to_string())
        .collect();
    format!("{}\n\nContext files: {}", task.prompt, files.join(", "))
}

#[cfg(test)]
#[path = "supervisor_tests.rs"]
mod tests;
