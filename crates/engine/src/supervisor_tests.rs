// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::config::{AgentConfig, HiveConfig};
use crate::registry::AgentRegistry;
use chrono::{TimeZone, Utc};
use hive_adapters::FakeMuxAdapter;

const CLAUDE_IDLE_PANE: &str = "Welcome to Claude\n\n> ";

fn claude_agent() -> RegisteredAgent {
    let mut config = HiveConfig::default();
    config
        .agents
        .insert("claude".to_string(), AgentConfig::default());
    AgentRegistry::from_config(&config)
        .unwrap()
        .get("claude")
        .unwrap()
        .clone()
}

fn fast_config(agent: &RegisteredAgent) -> SupervisorConfig {
    SupervisorConfig {
        ready_pattern: Regex::new(agent.kind.ready_pattern()).unwrap(),
        ready_max_wait: Duration::from_millis(50),
        ready_poll: Duration::from_millis(5),
        stuck_timeout_ms: 120_000,
        approve_key: agent.kind.approve_key().to_string(),
        cancel_key: agent.kind.cancel_key().to_string(),
    }
}

fn task(id: &str, prompt: &str) -> Task {
    Task::new(
        TaskId::new(id),
        prompt,
        Utc.timestamp_millis_opt(0).unwrap(),
    )
}

async fn ready_supervisor(
    mux: &FakeMuxAdapter,
    pipe_dir: &Path,
) -> WorkerSupervisor<FakeMuxAdapter> {
    mux.set_default_pane(CLAUDE_IDLE_PANE);
    let agent = claude_agent();
    let config = fast_config(&agent);
    WorkerSupervisor::spawn(
        mux.clone(),
        WorkerId::new("w-1"),
        &agent,
        pipe_dir,
        config,
        0,
    )
    .await
    .unwrap()
}

#[tokio::test]
async fn spawn_sets_up_window_pipe_and_reaches_idle() {
    let dir = tempfile::tempdir().unwrap();
    let mux = FakeMuxAdapter::new("openhive-orch");
    let sup = ready_supervisor(&mux, dir.path()).await;

    assert_eq!(sup.state(), WorkerState::Idle);
    assert_eq!(sup.worker().target, "openhive-orch:claude-w-1");
    assert_eq!(mux.session_count(), 1);

    let calls = mux.calls();
    assert!(calls
        .iter()
        .any(|c| matches!(c, hive_adapters::MuxCall::StartPipePane { .. })));
}

#[tokio::test]
async fn spawn_ready_timeout_tears_down_the_window() {
    let dir = tempfile::tempdir().unwrap();
    let mux = FakeMuxAdapter::new("openhive-orch");
    mux.set_default_pane("still starting up...");

    let agent = claude_agent();
    let config = fast_config(&agent);
    let result = WorkerSupervisor::spawn(
        mux.clone(),
        WorkerId::new("w-1"),
        &agent,
        dir.path(),
        config,
        0,
    )
    .await;

    assert!(matches!(result, Err(OrchestratorError::ReadyTimeout(_))));
    assert!(mux.window_targets().is_empty(), "window should be killed");
}

#[tokio::test]
async fn assign_sends_prompt_and_marks_working() {
    let dir = tempfile::tempdir().unwrap();
    let mux = FakeMuxAdapter::new("openhive-orch");
    let mut sup = ready_supervisor(&mux, dir.path()).await;

    sup.assign(&task("t-1", "Build a REST API"), 1_000)
        .await
        .unwrap();

    assert_eq!(sup.state(), WorkerState::Working);
    assert!(sup.has_assignment());
    assert_eq!(
        mux.sent_text("openhive-orch:claude-w-1"),
        vec!["Build a REST API"]
    );
}

#[tokio::test]
async fn assign_appends_context_files() {
    let dir = tempfile::tempdir().unwrap();
    let mux = FakeMuxAdapter::new("openhive-orch");
    let mut sup = ready_supervisor(&mux, dir.path()).await;

    let mut t = task("t-1", "Fix the bug");
    t.context_files = vec!["src/lib.rs".into(), "README.md".into()];
    sup.assign(&t, 0).await.unwrap();

    let sent = mux.sent_text("openhive-orch:claude-w-1");
    assert!(sent[0].contains("Fix the bug"));
    assert!(sent[0].contains("Context files: src/lib.rs, README.md"));
}

#[tokio::test]
async fn assign_twice_is_worker_busy() {
    let dir = tempfile::tempdir().unwrap();
    let mux = FakeMuxAdapter::new("openhive-orch");
    let mut sup = ready_supervisor(&mux, dir.path()).await;

    sup.assign(&task("t-1", "first"), 0).await.unwrap();
    let result = sup.assign(&task("t-2", "second"), 0).await;
    assert!(matches!(result, Err(OrchestratorError::WorkerBusy { .. })));
}

#[tokio::test]
async fn tick_reports_state_changes() {
    let dir = tempfile::tempdir().unwrap();
    let mux = FakeMuxAdapter::new("openhive-orch");
    let mut sup = ready_supervisor(&mux, dir.path()).await;
    let target = sup.worker().target.clone();

    mux.set_pane(&target, "12s │ analyzing code...");
    let report = sup.tick(1_000).await;
    assert_eq!(report.state, WorkerState::Working);
    assert_eq!(
        report.state_change,
        Some((WorkerState::Idle, WorkerState::Working))
    );

    // Same pane, no change reported
    let report = sup.tick(2_000).await;
    assert_eq!(report.state_change, None);
}

#[tokio::test]
async fn silent_working_pane_refines_to_stuck() {
    let dir = tempfile::tempdir().unwrap();
    let mux = FakeMuxAdapter::new("openhive-orch");
    let mut sup = ready_supervisor(&mux, dir.path()).await;
    let target = sup.worker().target.clone();

    // An unclassifiable pane with no timer glyphs: pessimistic working,
    // and nothing refreshes the activity clock.
    mux.set_pane(&target, "doing something inscrutable");
    let report = sup.tick(1_000).await;
    assert_eq!(report.state, WorkerState::Working);

    let report = sup.tick(130_000).await;
    assert_eq!(report.state, WorkerState::Stuck);
}

#[tokio::test]
async fn pipe_growth_defers_stuck() {
    let dir = tempfile::tempdir().unwrap();
    let mux = FakeMuxAdapter::new("openhive-orch");
    let mut sup = ready_supervisor(&mux, dir.path()).await;
    let target = sup.worker().target.clone();
    let pipe = sup.worker().pipe_path.clone();

    mux.set_pane(&target, "doing something inscrutable");
    sup.tick(1_000).await;

    // Pipe keeps growing: the worker is alive even though the pane text
    // never changes in kind.
    mux.set_file_size(&pipe, 100);
    sup.tick(100_000).await;
    mux.set_file_size(&pipe, 200);
    let report = sup.tick(219_000).await;
    assert_eq!(report.state, WorkerState::Working);

    // Growth stops: stuck once the timeout elapses from the last change.
    let report = sup.tick(340_000).await;
    assert_eq!(report.state, WorkerState::Stuck);
}

#[tokio::test]
async fn activity_pattern_refreshes_the_clock() {
    let dir = tempfile::tempdir().unwrap();
    let mux = FakeMuxAdapter::new("openhive-orch");
    let mut sup = ready_supervisor(&mux, dir.path()).await;
    let target = sup.worker().target.clone();

    // "esc to interrupt" is an activity pattern: even with a frozen pipe
    // size the worker counts as active.
    mux.set_pane(&target, "✻ churning (esc to interrupt)");
    sup.tick(1_000).await;
    let report = sup.tick(200_000).await;
    assert_eq!(report.state, WorkerState::Working);
}

#[tokio::test]
async fn vanished_window_is_dead() {
    let dir = tempfile::tempdir().unwrap();
    let mux = FakeMuxAdapter::new("openhive-orch");
    let mut sup = ready_supervisor(&mux, dir.path()).await;
    let target = sup.worker().target.clone();

    mux.kill_window(&target).await.unwrap();
    let report = sup.tick(1_000).await;
    assert_eq!(report.state, WorkerState::Dead);
    assert_eq!(
        report.state_change,
        Some((WorkerState::Idle, WorkerState::Dead))
    );
}

#[tokio::test]
async fn approve_presses_the_affirmative_key() {
    let dir = tempfile::tempdir().unwrap();
    let mux = FakeMuxAdapter::new("openhive-orch");
    let sup = ready_supervisor(&mux, dir.path()).await;

    sup.approve().await.unwrap();
    assert_eq!(mux.sent_keys(&sup.worker().target), vec!["1"]);
}

#[tokio::test]
async fn restart_cancels_and_resubmits_once() {
    let dir = tempfile::tempdir().unwrap();
    let mux = FakeMuxAdapter::new("openhive-orch");
    let mut sup = ready_supervisor(&mux, dir.path()).await;
    let target = sup.worker().target.clone();

    sup.assign(&task("t-1", "the prompt"), 0).await.unwrap();
    assert!(sup.restart().await.unwrap());

    assert_eq!(mux.sent_keys(&target), vec!["Escape"]);
    assert_eq!(mux.sent_text(&target), vec!["the prompt", "the prompt"]);

    // Second restart for the same assignment is refused.
    assert!(!sup.restart().await.unwrap());
    assert_eq!(mux.sent_text(&target).len(), 2);
}

#[tokio::test]
async fn restart_without_assignment_is_a_noop() {
    let dir = tempfile::tempdir().unwrap();
    let mux = FakeMuxAdapter::new("openhive-orch");
    let mut sup = ready_supervisor(&mux, dir.path()).await;
    assert!(!sup.restart().await.unwrap());
}

#[tokio::test]
async fn complete_detaches_and_counts_success() {
    let dir = tempfile::tempdir().unwrap();
    let mux = FakeMuxAdapter::new("openhive-orch");
    let mut sup = ready_supervisor(&mux, dir.path()).await;
    let target = sup.worker().target.clone();

    sup.assign(&task("t-1", "work"), 500).await.unwrap();
    mux.set_pane(&target, "Done!\n> ");
    let report = sup.tick(5_000).await;
    assert!(report.turn_complete);

    let finished = sup.complete(true).await.unwrap();
    assert_eq!(finished.task_id, "t-1");
    assert_eq!(finished.assigned_at_ms, 500);
    assert!(finished.output_tail.contains("Done!"));

    assert!(!sup.has_assignment());
    assert_eq!(sup.state(), WorkerState::Idle);
    assert_eq!(sup.worker().tasks_completed, 1);
}

#[tokio::test]
async fn complete_prefers_pipe_file_output() {
    let dir = tempfile::tempdir().unwrap();
    let mux = FakeMuxAdapter::new("openhive-orch");
    let mut sup = ready_supervisor(&mux, dir.path()).await;

    sup.assign(&task("t-1", "work"), 0).await.unwrap();
    std::fs::write(&sup.worker().pipe_path, "full transcript from pipe\n").unwrap();

    let finished = sup.complete(true).await.unwrap();
    assert!(finished.output_tail.contains("full transcript from pipe"));
}

#[tokio::test]
async fn failed_completion_keeps_error_state() {
    let dir = tempfile::tempdir().unwrap();
    let mux = FakeMuxAdapter::new("openhive-orch");
    let mut sup = ready_supervisor(&mux, dir.path()).await;
    let target = sup.worker().target.clone();

    sup.assign(&task("t-1", "work"), 0).await.unwrap();
    mux.set_pane(&target, "error: model backend exploded");
    sup.tick(1_000).await;
    assert_eq!(sup.state(), WorkerState::Error);

    let finished = sup.complete(false).await.unwrap();
    assert_eq!(finished.task_id, "t-1");
    assert_eq!(sup.state(), WorkerState::Error);
    assert_eq!(sup.worker().tasks_completed, 0);
}

#[tokio::test]
async fn shutdown_kills_the_window() {
    let dir = tempfile::tempdir().unwrap();
    let mux = FakeMuxAdapter::new("openhive-orch");
    let mut sup = ready_supervisor(&mux, dir.path()).await;

    sup.shutdown().await;
    assert_eq!(sup.state(), WorkerState::Dead);
    assert!(mux.window_targets().is_empty());
}
