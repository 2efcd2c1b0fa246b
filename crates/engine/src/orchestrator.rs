// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The orchestrator control loop.
//!
//! One cooperative ticker: advance every supervisor, settle completions,
//! escalate workers that need attention, then dispatch pending tasks.
//! The orchestrator is the single mutation point for the queue, the
//! tracker, and the supervisor list.

use crate::config::HiveConfig;
use crate::dispatcher::{self, Dispatch};
use crate::error::OrchestratorError;
use crate::limits::RateLimitTracker;
use crate::queue::TaskQueue;
use crate::reasoning;
use crate::registry::AgentRegistry;
use crate::supervisor::{SupervisorConfig, WorkerSupervisor};
use chrono::{DateTime, Utc};
use hive_adapters::{MuxAdapter, ReasoningError, ReasoningRunner};
use hive_core::{
    Clock, MetaCommand, OrchestratorEvent, StateSnapshot, Task, TaskId, TaskStatus, Verdict,
    Worker, WorkerId, WorkerState,
};
use hive_storage::{TaskStore, UsageStore};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;

/// Consecutive empty-plan ticks (with work pending) before the effective
/// tick interval starts doubling.
const BACKPRESSURE_TICKS: u32 = 3;

/// Escalation failures tolerated before the worker is marked errored.
const MAX_ESCALATION_FAILURES: u32 = 3;

/// Callback receiving lifecycle events.
pub type EventCallback = Box<dyn Fn(OrchestratorEvent) + Send + Sync>;

/// Cooperative shutdown flag shared between the loop and its caller.
#[derive(Clone, Default)]
pub struct ShutdownSignal {
    flag: Arc<AtomicBool>,
    notify: Arc<Notify>,
}

impl ShutdownSignal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn trigger(&self) {
        self.flag.store(true, Ordering::SeqCst);
        self.notify.notify_waiters();
    }

    pub fn is_triggered(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }

    pub async fn wait(&self) {
        while !self.is_triggered() {
            let notified = self.notify.notified();
            if self.is_triggered() {
                break;
            }
            notified.await;
        }
    }
}

/// Per-worker escalation bookkeeping.
#[derive(Default)]
struct EscalationState {
    /// Attention state and when it was first observed.
    since: Option<(WorkerState, u64)>,
    last_decision_ms: Option<u64>,
    failures: u32,
}

/// The control loop over supervisors, queue, tracker, and registry.
pub struct Orchestrator<M: MuxAdapter, R: ReasoningRunner, C: Clock> {
    mux: M,
    reasoning: Option<R>,
    clock: C,
    config: HiveConfig,
    registry: AgentRegistry,
    queue: TaskQueue,
    tracker: RateLimitTracker,
    supervisors: Vec<WorkerSupervisor<M>>,
    escalations: HashMap<String, EscalationState>,
    on_event: Option<EventCallback>,
    pipe_dir: PathBuf,
    worker_seq: u64,
    no_dispatch_ticks: u32,
    effective_tick_ms: u64,
    shutdown: ShutdownSignal,
}

impl<M: MuxAdapter, R: ReasoningRunner, C: Clock> Orchestrator<M, R, C> {
    /// Build the orchestrator from the trusted config mapping.
    ///
    /// Passing `None` for the reasoning runner puts escalation in manual
    /// mode: waiting workers do nothing automatic.
    pub fn new(
        mux: M,
        reasoning: Option<R>,
        clock: C,
        config: HiveConfig,
    ) -> Result<Self, OrchestratorError> {
        let registry = AgentRegistry::from_config(&config)?;

        let mut queue = TaskQueue::new(TaskStore::new(config.task_dir()));
        queue.load_from_store();

        let tracker = RateLimitTracker::from_config(&config, UsageStore::new(config.usage_dir()));
        let pipe_dir = config.pipe_dir();
        let effective_tick_ms = config.orchestrator.tick_interval_ms;

        if reasoning.is_none() && !config.orchestrator.auto_approve {
            tracing::warn!(
                "no reasoning tool configured; workers awaiting approval or input require manual intervention"
            );
        }

        Ok(Self {
            mux,
            reasoning,
            clock,
            config,
            registry,
            queue,
            tracker,
            supervisors: Vec::new(),
            escalations: HashMap::new(),
            on_event: None,
            pipe_dir,
            worker_seq: 0,
            no_dispatch_ticks: 0,
            effective_tick_ms,
            shutdown: ShutdownSignal::new(),
        })
    }

    /// Register the lifecycle event callback.
    pub fn set_on_event(&mut self, callback: impl Fn(OrchestratorEvent) + Send + Sync + 'static) {
        self.on_event = Some(Box::new(callback));
    }

    /// Handle for requesting shutdown from another task.
    pub fn shutdown_signal(&self) -> ShutdownSignal {
        self.shutdown.clone()
    }

    /// Submit a new task; returns its generated id.
    pub fn submit(&mut self, prompt: impl Into<String>, agent: Option<String>) -> TaskId {
        let id = TaskId::generate();
        let mut task = Task::new(id.clone(), prompt, self.now_utc());
        task.agent = agent;
        self.queue.add(task);
        id
    }

    /// Submit a fully built task (restores, tests).
    pub fn submit_task(&mut self, task: Task) {
        self.queue.add(task);
    }

    pub fn queue(&self) -> &TaskQueue {
        &self.queue
    }

    pub fn tracker(&self) -> &RateLimitTracker {
        &self.tracker
    }

    /// Current worker records.
    pub fn workers(&self) -> Vec<&Worker> {
        self.supervisors.iter().map(|s| s.worker()).collect()
    }

    /// True when nothing is pending, queued, or running.
    pub fn is_idle(&self) -> bool {
        self.queue.open_count() == 0 && self.supervisors.iter().all(|s| !s.has_assignment())
    }

    /// Effective tick interval (grows under backpressure).
    pub fn effective_tick_interval(&self) -> Duration {
        Duration::from_millis(self.effective_tick_ms)
    }

    fn now_utc(&self) -> DateTime<Utc> {
        DateTime::from_timestamp_millis(self.clock.epoch_ms() as i64).unwrap_or(DateTime::UNIX_EPOCH)
    }

    fn emit(&self, event: OrchestratorEvent) {
        tracing::info!(event = %event.log_summary(), "lifecycle event");
        if let Some(callback) = &self.on_event {
            callback(event);
        }
    }

    /// Run the loop until the shutdown signal fires, then tear down.
    pub async fn run(&mut self) {
        let shutdown = self.shutdown.clone();
        loop {
            if shutdown.is_triggered() {
                break;
            }
            self.tick_once().await;
            if shutdown.is_triggered() {
                break;
            }
            let delay = Duration::from_millis(self.effective_tick_ms);
            tokio::select! {
                _ = tokio::time::sleep(delay) => {}
                _ = shutdown.wait() => break,
            }
        }
        self.shutdown_workers().await;
    }

    /// One tick: advance supervisors, settle, escalate, dispatch.
    pub async fn tick_once(&mut self) {
        let now_ms = self.clock.epoch_ms();

        let settled = self.advance_supervisors(now_ms).await;
        self.process_escalations(now_ms).await;
        let dispatched = self.dispatch_pending(now_ms).await;
        self.adjust_backpressure(settled, dispatched);

        // Dead workers without assignments are gone for good.
        self.supervisors.retain(|s| s.state() != WorkerState::Dead);
    }

    /// Advance each supervisor one tick and settle finished/failed
    /// assignments. Returns how many assignments settled.
    async fn advance_supervisors(&mut self, now_ms: u64) -> usize {
        let mut settled = 0;
        for i in 0..self.supervisors.len() {
            let report = self.supervisors[i].tick(now_ms).await;

            if let Some((from, to)) = report.state_change {
                let worker_id = self.supervisors[i].worker().id.clone();
                self.emit(OrchestratorEvent::StateChanged {
                    worker_id,
                    from,
                    to,
                });
                if to == WorkerState::RateLimited {
                    let provider = self.supervisors[i].provider().to_string();
                    self.tracker.note_rate_limit(&provider, None, now_ms);
                }
            }

            match report.state {
                WorkerState::Idle if report.has_assignment => {
                    tracing::debug!(
                        worker_id = %self.supervisors[i].worker().id,
                        turn_complete = report.turn_complete,
                        "worker back at prompt with an assignment, finishing"
                    );
                    self.finalize_assignment(i, true, None, now_ms).await;
                    settled += 1;
                }
                WorkerState::Dead if report.has_assignment => {
                    self.finalize_assignment(i, false, Some("worker died".to_string()), now_ms)
                        .await;
                    settled += 1;
                }
                WorkerState::Error if report.has_assignment => {
                    self.finalize_assignment(
                        i,
                        false,
                        Some("worker reported an error".to_string()),
                        now_ms,
                    )
                    .await;
                    settled += 1;
                }
                _ => {}
            }
        }
        settled
    }

    /// Detach a supervisor's assignment and finalize its task.
    async fn finalize_assignment(
        &mut self,
        idx: usize,
        success: bool,
        reason: Option<String>,
        now_ms: u64,
    ) {
        let Some(finished) = self.supervisors[idx].complete(success).await else {
            return;
        };
        let worker_id = self.supervisors[idx].worker().id.clone();
        let provider = self.supervisors[idx].provider().to_string();
        let now = self.now_utc();

        let output_tail = finished.output_tail.clone();
        let error = reason.clone();
        let status = if success {
            TaskStatus::Completed
        } else {
            TaskStatus::Failed
        };
        let update = self.queue.update(finished.task_id.as_str(), move |task| {
            task.finalize(status, now)?;
            task.stdout = Some(output_tail);
            if success {
                task.exit_code = Some(0);
            } else {
                task.error = error;
            }
            Ok(())
        });
        if let Err(e) = update {
            tracing::warn!(task_id = %finished.task_id, error = %e, "failed to finalize task");
        }

        self.tracker.record_completion(&provider, success, now_ms);
        self.escalations.remove(worker_id.as_str());

        if success {
            let duration_ms = self
                .queue
                .get(finished.task_id.as_str())
                .and_then(|t| t.duration_ms)
                .unwrap_or(0);
            self.emit(OrchestratorEvent::TaskCompleted {
                task_id: finished.task_id,
                worker_id,
                duration_ms,
            });
        } else {
            self.emit(OrchestratorEvent::TaskFailed {
                task_id: finished.task_id,
                worker_id: Some(worker_id),
                reason: reason.unwrap_or_else(|| "unknown".to_string()),
            });
        }
    }

    /// Escalate workers that have needed attention long enough.
    async fn process_escalations(&mut self, now_ms: u64) {
        for i in 0..self.supervisors.len() {
            let state = self.supervisors[i].state();
            let key = self.supervisors[i].worker().id.to_string();

            if !state.needs_attention() {
                if let Some(entry) = self.escalations.get_mut(&key) {
                    entry.since = None;
                }
                continue;
            }

            let (since_ms, last_decision_ms) = {
                let entry = self.escalations.entry(key.clone()).or_default();
                if entry.since.map(|(s, _)| s) != Some(state) {
                    entry.since = Some((state, now_ms));
                }
                (
                    entry.since.map(|(_, ms)| ms).unwrap_or(now_ms),
                    entry.last_decision_ms,
                )
            };

            // Waiting states get a grace period before the first
            // escalation; stuck already burned its timeout.
            let threshold = match state {
                WorkerState::WaitingApproval | WorkerState::WaitingInput => {
                    self.config.orchestrator.approval_timeout_ms
                }
                _ => 0,
            };
            if last_decision_ms.is_none() && now_ms.saturating_sub(since_ms) < threshold {
                continue;
            }
            if let Some(last) = last_decision_ms {
                if now_ms.saturating_sub(last) < self.config.orchestrator.escalation_debounce_ms {
                    continue;
                }
            }

            if state == WorkerState::WaitingApproval && self.config.orchestrator.auto_approve {
                if let Err(e) = self.supervisors[i].approve().await {
                    tracing::warn!(worker = %key, error = %e, "auto-approve failed");
                }
                if let Some(entry) = self.escalations.get_mut(&key) {
                    entry.last_decision_ms = Some(now_ms);
                }
                continue;
            }

            let Some(runner) = self.reasoning.clone() else {
                // Manual mode: nothing automatic for waiting states.
                continue;
            };

            let snapshot = self.supervisors[i].snapshot().cloned().unwrap_or_else(|| {
                StateSnapshot::new(state, None, String::new(), now_ms)
            });
            let task = self.supervisors[i]
                .assignment()
                .and_then(|a| self.queue.get(a.task_id.as_str()))
                .cloned();
            let context = reasoning::build_context(
                self.supervisors[i].worker(),
                &snapshot,
                task.as_ref(),
                self.config.orchestrator.reasoning_context_lines,
            )
            .await;

            match reasoning::request_verdict(&runner, &context).await {
                Ok(verdict) => {
                    self.emit(OrchestratorEvent::ReasoningVerdict {
                        worker_id: WorkerId::new(key.clone()),
                        verdict: verdict.to_string(),
                    });
                    self.apply_verdict(i, verdict, now_ms).await;
                    if let Some(entry) = self.escalations.get_mut(&key) {
                        entry.last_decision_ms = Some(now_ms);
                        entry.failures = 0;
                    }
                }
                Err(ReasoningError::Missing(tool)) => {
                    tracing::warn!(tool, "reasoning tool missing, downgrading to manual mode");
                    self.reasoning = None;
                }
                Err(e) => {
                    tracing::warn!(worker = %key, error = %e, "reasoning request failed, treating as WAIT");
                    let failures = {
                        let entry = self.escalations.entry(key.clone()).or_default();
                        entry.failures += 1;
                        entry.last_decision_ms = Some(now_ms);
                        entry.failures
                    };
                    if failures >= MAX_ESCALATION_FAILURES {
                        tracing::warn!(worker = %key, failures, "escalation keeps failing, marking worker errored");
                        self.supervisors[i].mark_error();
                        if self.supervisors[i].has_assignment() {
                            self.finalize_assignment(
                                i,
                                false,
                                Some("reasoning escalation failed repeatedly".to_string()),
                                now_ms,
                            )
                            .await;
                        }
                    }
                }
            }
        }
    }

    /// Apply a parsed verdict to one worker.
    async fn apply_verdict(&mut self, idx: usize, verdict: Verdict, now_ms: u64) {
        match verdict {
            Verdict::Meta {
                command: MetaCommand::Approve,
            } => {
                if let Err(e) = self.supervisors[idx].approve().await {
                    tracing::warn!(error = %e, "approve failed");
                }
            }
            Verdict::Meta {
                command: MetaCommand::Wait,
            } => {}
            Verdict::Meta {
                command: MetaCommand::Restart,
            } => match self.supervisors[idx].restart().await {
                Ok(restarted) => {
                    if !restarted {
                        tracing::debug!("restart verdict ignored");
                    }
                }
                Err(e) => tracing::warn!(error = %e, "restart failed"),
            },
            Verdict::Meta {
                command: MetaCommand::Done,
            } => {
                self.finalize_assignment(idx, true, None, now_ms).await;
            }
            Verdict::Meta {
                command: MetaCommand::Failed,
            } => {
                self.finalize_assignment(
                    idx,
                    false,
                    Some("reasoning verdict: FAILED".to_string()),
                    now_ms,
                )
                .await;
            }
            Verdict::Text { text } => {
                if let Err(e) = self.supervisors[idx].send_literal(&text).await {
                    tracing::warn!(error = %e, "failed to forward free-text verdict");
                }
            }
        }
    }

    /// Plan and execute dispatches. Returns how many tasks were handed out.
    async fn dispatch_pending(&mut self, now_ms: u64) -> usize {
        let plan: Vec<Dispatch> = {
            let pending = self.queue.pending();
            dispatcher::plan(
                &pending,
                &self.registry,
                &self.tracker,
                self.config.default_agent.as_deref(),
                now_ms,
            )
        };

        let mut dispatched = 0;
        for decision in plan {
            if self.execute_dispatch(&decision, now_ms).await {
                dispatched += 1;
            }
        }
        dispatched
    }

    /// Hand one task to an idle worker, spawning one if allowed.
    async fn execute_dispatch(&mut self, decision: &Dispatch, now_ms: u64) -> bool {
        let existing = self.supervisors.iter().position(|s| {
            s.agent_name() == decision.agent
                && !s.has_assignment()
                && s.state() == WorkerState::Idle
        });

        let idx = match existing {
            Some(idx) => idx,
            None => match self.spawn_worker(&decision.agent, now_ms).await {
                Ok(Some(idx)) => idx,
                // Worker budget exhausted: the task waits for a free slot.
                Ok(None) => return false,
                Err(e) => {
                    let reason = e.to_string();
                    let now = self.now_utc();
                    let failed = reason.clone();
                    let update = self.queue.update(decision.task_id.as_str(), move |task| {
                        task.advance(TaskStatus::Queued)?;
                        task.finalize(TaskStatus::Failed, now)?;
                        task.error = Some(failed);
                        Ok(())
                    });
                    if let Err(e) = update {
                        tracing::warn!(task_id = %decision.task_id, error = %e, "failed to record spawn failure");
                    }
                    self.emit(OrchestratorEvent::TaskFailed {
                        task_id: decision.task_id.clone(),
                        worker_id: None,
                        reason,
                    });
                    return false;
                }
            },
        };

        if let Err(e) = self
            .queue
            .update(decision.task_id.as_str(), |task| {
                task.advance(TaskStatus::Queued)
            })
        {
            tracing::warn!(task_id = %decision.task_id, error = %e, "could not queue task");
            return false;
        }

        let Some(task) = self.queue.get(decision.task_id.as_str()).cloned() else {
            return false;
        };

        match self.supervisors[idx].assign(&task, now_ms).await {
            Ok(()) => {
                let now = self.now_utc();
                if let Err(e) = self
                    .queue
                    .update(decision.task_id.as_str(), move |task| task.start(now))
                {
                    tracing::warn!(task_id = %decision.task_id, error = %e, "could not mark task running");
                }
                let provider = self.supervisors[idx].provider().to_string();
                self.tracker.record_dispatch(&provider, now_ms);
                self.emit(OrchestratorEvent::TaskAssigned {
                    task_id: decision.task_id.clone(),
                    worker_id: self.supervisors[idx].worker().id.clone(),
                });
                true
            }
            Err(e) => {
                let reason = e.to_string();
                let now = self.now_utc();
                let failed = reason.clone();
                let update = self.queue.update(decision.task_id.as_str(), move |task| {
                    task.finalize(TaskStatus::Failed, now)?;
                    task.error = Some(failed);
                    Ok(())
                });
                if let Err(e) = update {
                    tracing::warn!(task_id = %decision.task_id, error = %e, "failed to record assign failure");
                }
                self.emit(OrchestratorEvent::TaskFailed {
                    task_id: decision.task_id.clone(),
                    worker_id: Some(self.supervisors[idx].worker().id.clone()),
                    reason,
                });
                false
            }
        }
    }

    /// Spawn a worker for an agent, respecting the worker budget and the
    /// agent's own concurrency cap.
    ///
    /// `Ok(None)` means "no capacity right now"; an error means the spawn
    /// itself failed (the caller fails the task).
    async fn spawn_worker(
        &mut self,
        agent_name: &str,
        now_ms: u64,
    ) -> Result<Option<usize>, OrchestratorError> {
        if self.supervisors.len() >= self.config.orchestrator.max_workers as usize {
            return Ok(None);
        }
        let Some(agent) = self.registry.get(agent_name).cloned() else {
            return Ok(None);
        };
        if let Some(cap) = agent.max_concurrent {
            let count = self
                .supervisors
                .iter()
                .filter(|s| s.agent_name() == agent_name)
                .count();
            if count >= cap as usize {
                return Ok(None);
            }
        }

        let supervisor_config =
            SupervisorConfig::for_agent(&agent, self.config.orchestrator.stuck_timeout_ms)?;

        self.worker_seq += 1;
        let worker_id = WorkerId::numbered(self.worker_seq);

        let supervisor = WorkerSupervisor::spawn(
            self.mux.clone(),
            worker_id.clone(),
            &agent,
            &self.pipe_dir,
            supervisor_config,
            now_ms,
        )
        .await?;

        self.emit(OrchestratorEvent::WorkerCreated {
            worker_id,
            tool: agent_name.to_string(),
        });
        self.supervisors.push(supervisor);
        Ok(Some(self.supervisors.len() - 1))
    }

    /// Double the tick interval while saturated; reset on any progress.
    fn adjust_backpressure(&mut self, settled: usize, dispatched: usize) {
        let base = self.config.orchestrator.tick_interval_ms;
        let pending_left = !self.queue.pending().is_empty();

        if settled > 0 || dispatched > 0 || !pending_left {
            self.no_dispatch_ticks = 0;
            self.effective_tick_ms = base;
            return;
        }

        self.no_dispatch_ticks += 1;
        if self.no_dispatch_ticks >= BACKPRESSURE_TICKS {
            let doubled = (self.effective_tick_ms * 2)
                .min(self.config.orchestrator.max_tick_interval_ms)
                .max(base);
            if doubled != self.effective_tick_ms {
                tracing::debug!(
                    effective_tick_ms = doubled,
                    "pool saturated, backing off tick interval"
                );
            }
            self.effective_tick_ms = doubled;
        }
    }

    /// Cancel in-flight work, kill windows, then the session.
    pub async fn shutdown_workers(&mut self) {
        tracing::info!("shutting down orchestrator");
        let now_ms = self.clock.epoch_ms();
        let now = self.now_utc();

        for i in 0..self.supervisors.len() {
            if let Some(finished) = self.supervisors[i].complete(false).await {
                let provider = self.supervisors[i].provider().to_string();
                let output_tail = finished.output_tail.clone();
                let update = self.queue.update(finished.task_id.as_str(), move |task| {
                    task.finalize(TaskStatus::Cancelled, now)?;
                    task.stdout = Some(output_tail);
                    Ok(())
                });
                if let Err(e) = update {
                    tracing::warn!(task_id = %finished.task_id, error = %e, "failed to cancel task");
                }
                self.tracker.record_completion(&provider, true, now_ms);
                self.emit(OrchestratorEvent::TaskCancelled {
                    task_id: finished.task_id,
                });
            }
            self.supervisors[i].shutdown().await;
        }
        self.supervisors.clear();

        // Killing the session reaps any window the supervisors lost track of.
        if let Err(e) = self.mux.kill_session().await {
            tracing::warn!(error = %e, "failed to kill orchestrator session");
        }
    }
}

#[cfg(test)]
#[path = "orchestrator_tests.rs"]
mod tests;
