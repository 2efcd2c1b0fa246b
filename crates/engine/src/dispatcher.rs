// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Pure dispatch planning.
//!
//! Given the pending tasks, the agent registry, and the tracker's capacity
//! signal, produce `(task, agent)` decisions in queue order. No mutation
//! happens here; the orchestrator executes the plan.

use crate::limits::RateLimitTracker;
use crate::registry::AgentRegistry;
use hive_core::{Task, TaskId};
use std::collections::HashMap;

/// One planned assignment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dispatch {
    pub task_id: TaskId,
    pub agent: String,
}

/// Select an agent for each pending task.
///
/// Per task: an explicitly requested agent wins (or the task waits), then
/// the configured default agent, then the first registered agent with
/// capacity in declaration order. Ties between tasks wanting the same
/// provider resolve by queue order; the pool cap bounds the batch.
pub fn plan(
    pending: &[&Task],
    registry: &AgentRegistry,
    tracker: &RateLimitTracker,
    default_agent: Option<&str>,
    now_ms: u64,
) -> Vec<Dispatch> {
    let mut planned: HashMap<String, u32> = HashMap::new();
    let mut decisions = Vec::new();

    for task in pending {
        let choice = match task.agent.as_deref() {
            // 1. The task names an agent: that agent or nothing.
            Some(requested) => pick(registry, requested, tracker, &planned, now_ms),
            None => {
                // 2. The configured default agent, if it has capacity.
                let by_default = default_agent
                    .and_then(|name| pick(registry, name, tracker, &planned, now_ms));
                // 3. First registered agent with capacity, declaration order.
                by_default.or_else(|| {
                    registry.iter().find_map(|agent| {
                        pick(registry, &agent.name, tracker, &planned, now_ms)
                    })
                })
            }
        };

        if let Some(agent) = choice {
            let provider = registry
                .get(&agent)
                .map(|a| a.kind.provider().to_string())
                .unwrap_or_default();
            *planned.entry(provider).or_insert(0) += 1;
            decisions.push(Dispatch {
                task_id: task.id.clone(),
                agent,
            });
        }
    }

    decisions
}

/// Agent name if it is registered and its provider still has room after
/// the dispatches already planned this tick.
fn pick(
    registry: &AgentRegistry,
    name: &str,
    tracker: &RateLimitTracker,
    planned: &HashMap<String, u32>,
    now_ms: u64,
) -> Option<String> {
    let agent = registry.get(name)?;
    let provider = agent.kind.provider();
    let extra = planned.get(provider).copied().unwrap_or(0);
    if tracker.can_dispatch_assuming(provider, extra, now_ms) {
        Some(agent.name.clone())
    } else {
        None
    }
}

#[cfg(test)]
#[path = "dispatcher_tests.rs"]
mod tests;
