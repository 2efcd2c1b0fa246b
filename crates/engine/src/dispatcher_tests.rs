// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::config::{AgentConfig, HiveConfig};
use chrono::{TimeZone, Utc};
use hive_core::ProviderPool;
use hive_storage::UsageStore;

fn registry(names: &[&str]) -> AgentRegistry {
    let mut config = HiveConfig::default();
    for name in names {
        config
            .agents
            .insert(name.to_string(), AgentConfig::default());
    }
    AgentRegistry::from_config(&config).unwrap()
}

fn tracker_with(dir: &std::path::Path, pools: &[(&str, u32)]) -> RateLimitTracker {
    let mut tracker = RateLimitTracker::new(UsageStore::new(dir));
    for (provider, max) in pools {
        tracker.add_pool(ProviderPool::new(*provider, *max, 60_000), vec![]);
    }
    tracker
}

fn task(id: &str, agent: Option<&str>) -> Task {
    let mut task = Task::new(
        hive_core::TaskId::new(id),
        "prompt",
        Utc.timestamp_millis_opt(0).unwrap(),
    );
    task.agent = agent.map(String::from);
    task
}

#[test]
fn requested_agent_is_honored() {
    let dir = tempfile::tempdir().unwrap();
    let registry = registry(&["claude", "codex"]);
    let tracker = tracker_with(dir.path(), &[("anthropic", 2), ("openai", 2)]);

    let t = task("t1", Some("codex"));
    let plan = plan(&[&t], &registry, &tracker, Some("claude"), 0);
    assert_eq!(
        plan,
        vec![Dispatch {
            task_id: t.id.clone(),
            agent: "codex".to_string()
        }]
    );
}

#[test]
fn requested_agent_without_capacity_yields_no_decision() {
    let dir = tempfile::tempdir().unwrap();
    let registry = registry(&["claude", "codex"]);
    let mut tracker = tracker_with(dir.path(), &[("anthropic", 1), ("openai", 2)]);
    tracker.record_dispatch("anthropic", 0);

    // claude's pool is full; the task asked for claude so it waits even
    // though codex has room.
    let t = task("t1", Some("claude"));
    let plan = plan(&[&t], &registry, &tracker, None, 0);
    assert!(plan.is_empty());
}

#[test]
fn unregistered_requested_agent_yields_no_decision() {
    let dir = tempfile::tempdir().unwrap();
    let registry = registry(&["claude"]);
    let tracker = tracker_with(dir.path(), &[("anthropic", 2)]);

    let t = task("t1", Some("aider"));
    assert!(plan(&[&t], &registry, &tracker, None, 0).is_empty());
}

#[test]
fn default_agent_wins_over_declaration_order() {
    let dir = tempfile::tempdir().unwrap();
    let registry = registry(&["claude", "codex"]);
    let tracker = tracker_with(dir.path(), &[("anthropic", 2), ("openai", 2)]);

    let t = task("t1", None);
    let plan = plan(&[&t], &registry, &tracker, Some("codex"), 0);
    assert_eq!(plan[0].agent, "codex");
}

#[test]
fn falls_back_to_first_registered_with_capacity() {
    let dir = tempfile::tempdir().unwrap();
    let registry = registry(&["claude", "codex"]);
    let mut tracker = tracker_with(dir.path(), &[("anthropic", 1), ("openai", 2)]);
    tracker.record_dispatch("anthropic", 0);

    let t = task("t1", None);
    let plan = plan(&[&t], &registry, &tracker, None, 0);
    assert_eq!(plan[0].agent, "codex");
}

#[test]
fn batch_is_capped_by_pool_capacity_in_queue_order() {
    let dir = tempfile::tempdir().unwrap();
    let registry = registry(&["claude"]);
    let tracker = tracker_with(dir.path(), &[("anthropic", 2)]);

    let t1 = task("t1", None);
    let t2 = task("t2", None);
    let t3 = task("t3", None);
    let plan = plan(&[&t1, &t2, &t3], &registry, &tracker, None, 0);

    let ids: Vec<&str> = plan.iter().map(|d| d.task_id.as_str()).collect();
    assert_eq!(ids, vec!["t1", "t2"]);
}

#[test]
fn overflow_spills_to_other_provider() {
    let dir = tempfile::tempdir().unwrap();
    let registry = registry(&["claude", "codex"]);
    let tracker = tracker_with(dir.path(), &[("anthropic", 1), ("openai", 1)]);

    let t1 = task("t1", None);
    let t2 = task("t2", None);
    let plan = plan(&[&t1, &t2], &registry, &tracker, None, 0);

    assert_eq!(plan.len(), 2);
    assert_eq!(plan[0].agent, "claude");
    assert_eq!(plan[1].agent, "codex");
}

#[test]
fn plan_is_pure() {
    let dir = tempfile::tempdir().unwrap();
    let registry = registry(&["claude"]);
    let tracker = tracker_with(dir.path(), &[("anthropic", 2)]);

    let t = task("t1", None);
    let first = plan(&[&t], &registry, &tracker, None, 0);
    let second = plan(&[&t], &registry, &tracker, None, 0);
    assert_eq!(first, second);
}

#[test]
fn empty_pending_is_empty_plan() {
    let dir = tempfile::tempdir().unwrap();
    let registry = registry(&["claude"]);
    let tracker = tracker_with(dir.path(), &[("anthropic", 2)]);
    assert!(plan(&[], &registry, &tracker, None, 0).is_empty());
}
