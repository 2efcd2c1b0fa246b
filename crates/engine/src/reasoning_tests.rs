// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use chrono::{TimeZone, Utc};
use hive_adapters::FakeReasoningRunner;
use hive_core::{MetaCommand, TaskId, WorkerId};
use std::path::PathBuf;

fn worker_with_pipe(pipe: PathBuf) -> Worker {
    Worker::new(WorkerId::new("w-1"), "claude", "openhive-orch:claude-w-1", pipe, 0)
}

fn snapshot(state: WorkerState, pane: &str) -> StateSnapshot {
    StateSnapshot::new(state, None, pane.to_string(), 0)
}

fn task(prompt: &str) -> Task {
    Task::new(
        TaskId::new("t-1"),
        prompt,
        Utc.timestamp_millis_opt(0).unwrap(),
    )
}

#[tokio::test]
async fn falls_back_to_snapshot_pane_without_pipe_file() {
    let worker = worker_with_pipe(PathBuf::from("/nonexistent/pipe.log"));
    let snap = snapshot(WorkerState::Stuck, "line1\nline2\nline3");

    let context = build_context(&worker, &snap, None, 2).await;
    assert_eq!(context.pane_tail, "line2\nline3");
}

#[tokio::test]
async fn prefers_pipe_file_when_present() {
    let dir = tempfile::tempdir().unwrap();
    let pipe = dir.path().join("w.log");
    std::fs::write(&pipe, "old\npipe line A\npipe line B\n").unwrap();

    let worker = worker_with_pipe(pipe);
    let snap = snapshot(WorkerState::Stuck, "pane says something else");

    let context = build_context(&worker, &snap, None, 2).await;
    assert_eq!(context.pane_tail, "pipe line A\npipe line B");
}

#[tokio::test]
async fn empty_pipe_file_falls_back_to_snapshot() {
    let dir = tempfile::tempdir().unwrap();
    let pipe = dir.path().join("w.log");
    std::fs::write(&pipe, "").unwrap();

    let worker = worker_with_pipe(pipe);
    let snap = snapshot(WorkerState::Stuck, "pane tail");

    let context = build_context(&worker, &snap, None, 10).await;
    assert_eq!(context.pane_tail, "pane tail");
}

#[tokio::test]
async fn prompt_contains_state_task_tail_and_commands() {
    let worker = worker_with_pipe(PathBuf::from("/nonexistent/pipe.log"));
    let snap = snapshot(WorkerState::WaitingApproval, "Allow this?\n❯ 1. Yes");
    let task = task("Build a REST API");

    let context = build_context(&worker, &snap, Some(&task), 40).await;

    assert!(context.prompt.contains("waiting_approval"));
    assert!(context
        .prompt
        .contains(WorkerState::WaitingApproval.explanation()));
    assert!(context.prompt.contains("Build a REST API"));
    assert!(context.prompt.contains("Allow this?"));
    for command in ["APPROVE", "WAIT", "RESTART", "DONE", "FAILED"] {
        assert!(context.prompt.contains(command), "missing {command}");
    }
    assert!(context.prompt.contains("free-text"));
}

#[tokio::test]
async fn prompt_omits_task_stanza_without_assignment() {
    let worker = worker_with_pipe(PathBuf::from("/nonexistent/pipe.log"));
    let snap = snapshot(WorkerState::Stuck, "…");

    let context = build_context(&worker, &snap, None, 40).await;
    assert!(!context.prompt.contains("Assigned task"));
    assert_eq!(context.task_prompt, None);
}

#[tokio::test]
async fn request_verdict_parses_meta() {
    let runner = FakeReasoningRunner::new();
    runner.push_response("APPROVE\nbecause the command is safe");

    let worker = worker_with_pipe(PathBuf::from("/nonexistent/pipe.log"));
    let snap = snapshot(WorkerState::WaitingApproval, "Allow?");
    let context = build_context(&worker, &snap, None, 40).await;

    let verdict = request_verdict(&runner, &context).await.unwrap();
    assert_eq!(
        verdict,
        Verdict::Meta {
            command: MetaCommand::Approve
        }
    );
}

#[tokio::test]
async fn request_verdict_passes_free_text_through() {
    let runner = FakeReasoningRunner::new();
    runner.push_response("Use PostgreSQL.");

    let worker = worker_with_pipe(PathBuf::from("/nonexistent/pipe.log"));
    let snap = snapshot(WorkerState::WaitingInput, "Which database?");
    let context = build_context(&worker, &snap, None, 40).await;

    let verdict = request_verdict(&runner, &context).await.unwrap();
    assert_eq!(
        verdict,
        Verdict::Text {
            text: "Use PostgreSQL.".to_string()
        }
    );
}

#[tokio::test]
async fn request_verdict_surfaces_runner_errors() {
    let runner = FakeReasoningRunner::new();
    runner.push_error(ReasoningError::Timeout(60));

    let worker = worker_with_pipe(PathBuf::from("/nonexistent/pipe.log"));
    let snap = snapshot(WorkerState::Stuck, "…");
    let context = build_context(&worker, &snap, None, 40).await;

    assert!(matches!(
        request_verdict(&runner, &context).await,
        Err(ReasoningError::Timeout(60))
    ));
}
