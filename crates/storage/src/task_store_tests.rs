// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use chrono::{TimeZone, Utc};
use hive_core::{TaskId, TaskStatus};

fn task_at(id: &str, epoch_ms: i64) -> Task {
    Task::new(
        TaskId::new(id),
        format!("prompt for {id}"),
        Utc.timestamp_millis_opt(epoch_ms).unwrap(),
    )
}

#[test]
fn save_then_load_round_trips() {
    let dir = tempfile::tempdir().unwrap();
    let store = TaskStore::new(dir.path());

    let mut task = task_at("abc123def456", 1_700_000_000_000);
    task.agent = Some("claude".to_string());
    task.advance(TaskStatus::Queued).unwrap();
    store.save(&task).unwrap();

    let loaded = store.load("abc123def456").unwrap().unwrap();
    assert_eq!(loaded, task);
}

#[test]
fn load_missing_returns_none() {
    let dir = tempfile::tempdir().unwrap();
    let store = TaskStore::new(dir.path());
    assert!(store.load("nope").unwrap().is_none());
}

#[test]
fn save_overwrites_previous_record() {
    let dir = tempfile::tempdir().unwrap();
    let store = TaskStore::new(dir.path());

    let mut task = task_at("t1", 0);
    store.save(&task).unwrap();
    task.advance(TaskStatus::Queued).unwrap();
    store.save(&task).unwrap();

    let loaded = store.load("t1").unwrap().unwrap();
    assert_eq!(loaded.status, TaskStatus::Queued);
}

#[test]
fn load_all_sorts_by_creation_time() {
    let dir = tempfile::tempdir().unwrap();
    let store = TaskStore::new(dir.path());

    store.save(&task_at("late", 3_000)).unwrap();
    store.save(&task_at("early", 1_000)).unwrap();
    store.save(&task_at("middle", 2_000)).unwrap();

    let tasks = store.load_all();
    let ids: Vec<&str> = tasks.iter().map(|t| t.id.as_str()).collect();
    assert_eq!(ids, vec!["early", "middle", "late"]);
}

#[test]
fn load_all_skips_corrupt_files() {
    let dir = tempfile::tempdir().unwrap();
    let store = TaskStore::new(dir.path());

    store.save(&task_at("good", 1_000)).unwrap();
    std::fs::write(dir.path().join("bad.json"), "{not json").unwrap();

    let tasks = store.load_all();
    assert_eq!(tasks.len(), 1);
    assert_eq!(tasks[0].id.as_str(), "good");
}

#[test]
fn load_all_on_missing_dir_is_empty() {
    let store = TaskStore::new("/nonexistent/hive-tasks");
    assert!(store.load_all().is_empty());
}

#[test]
fn delete_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let store = TaskStore::new(dir.path());

    store.save(&task_at("t1", 0)).unwrap();
    store.delete("t1").unwrap();
    store.delete("t1").unwrap();
    assert!(store.load("t1").unwrap().is_none());
}

#[test]
fn unknown_fields_survive_save_load_cycle() {
    let dir = tempfile::tempdir().unwrap();
    let store = TaskStore::new(dir.path());

    // Simulate another tool having written an extended record
    let json = serde_json::json!({
        "id": "t1",
        "prompt": "p",
        "status": "pending",
        "created_at": "2023-11-14T22:13:20Z",
        "vision_score": 0.93,
    });
    std::fs::create_dir_all(dir.path()).unwrap();
    std::fs::write(
        dir.path().join("t1.json"),
        serde_json::to_string(&json).unwrap(),
    )
    .unwrap();

    let task = store.load("t1").unwrap().unwrap();
    store.save(&task).unwrap();

    let raw = std::fs::read_to_string(dir.path().join("t1.json")).unwrap();
    let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
    assert_eq!(
        value.get("vision_score").and_then(|v| v.as_f64()),
        Some(0.93)
    );
}

#[test]
fn no_tmp_files_left_behind() {
    let dir = tempfile::tempdir().unwrap();
    let store = TaskStore::new(dir.path());
    store.save(&task_at("t1", 0)).unwrap();

    let leftovers: Vec<_> = std::fs::read_dir(dir.path())
        .unwrap()
        .filter_map(|e| e.ok())
        .filter(|e| e.path().extension().is_some_and(|x| x == "tmp"))
        .collect();
    assert!(leftovers.is_empty());
}
