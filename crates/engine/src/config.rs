// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Typed configuration mapping.
//!
//! The orchestrator receives a trusted, already-parsed mapping; discovery,
//! layering, and validation UX belong to the CLI front-end. Key names use
//! camelCase on the wire (`maxConcurrent`, `cooldownMs`).

use hive_core::{RateWindow, WindowKind};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Logger verbosity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Debug,
    #[default]
    Info,
    Warn,
    Error,
    Silent,
}

impl LogLevel {
    /// Directive string for the tracing env filter.
    pub fn as_filter(&self) -> &'static str {
        match self {
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
            LogLevel::Silent => "off",
        }
    }
}

/// One agent adapter's activation and invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AgentConfig {
    pub enabled: bool,
    /// Launch command; defaults to the tool's well-known binary.
    pub command: Option<String>,
    pub args: Vec<String>,
    /// Adapter mode hint (surfaced to the collaborator CLI front-end).
    pub mode: Option<String>,
    /// Cap on simultaneous workers for this agent.
    pub max_concurrent: Option<u32>,
    /// Provider pool this agent draws from; defaults by tool name.
    pub provider: Option<String>,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            command: None,
            args: Vec::new(),
            mode: None,
            max_concurrent: None,
            provider: None,
        }
    }
}

/// One rate-limit window in a provider pool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct WindowConfig {
    pub id: String,
    pub label: Option<String>,
    pub kind: WindowKind,
    pub duration_ms: u64,
    pub limit: Option<u32>,
    pub reset: Option<String>,
    /// Minutes east of UTC anchoring fixed daily buckets. Unset = UTC.
    pub utc_offset_minutes: Option<i32>,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            id: String::new(),
            label: None,
            kind: WindowKind::Rolling,
            duration_ms: 0,
            limit: None,
            reset: None,
            utc_offset_minutes: None,
        }
    }
}

impl WindowConfig {
    pub fn to_window(&self) -> RateWindow {
        RateWindow {
            id: self.id.clone(),
            label: self.label.clone().unwrap_or_else(|| self.id.clone()),
            kind: self.kind,
            duration_ms: self.duration_ms,
            limit: self.limit,
            reset: self.reset.clone().unwrap_or_default(),
            utc_offset_minutes: self.utc_offset_minutes,
        }
    }
}

/// Per-provider concurrency and rate windows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PoolConfig {
    pub provider: String,
    pub max_concurrent: u32,
    pub cooldown_ms: u64,
    pub windows: Vec<WindowConfig>,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            provider: String::new(),
            max_concurrent: 2,
            cooldown_ms: 60_000,
            windows: Vec::new(),
        }
    }
}

/// Control-loop tunables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct OrchestratorConfig {
    pub max_workers: u32,
    pub auto_approve: bool,
    pub tick_interval_ms: u64,
    pub stuck_timeout_ms: u64,
    /// How long a worker may sit in waiting_approval / waiting_input
    /// before the first escalation.
    pub approval_timeout_ms: u64,
    /// Minimum gap between reasoning requests for one worker.
    pub escalation_debounce_ms: u64,
    /// Reasoning tool command line; unset = manual mode.
    pub reasoning_tool: Option<String>,
    pub reasoning_context_lines: usize,
    /// Backpressure ceiling for the effective tick interval.
    pub max_tick_interval_ms: u64,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            max_workers: 4,
            auto_approve: false,
            tick_interval_ms: 1_000,
            stuck_timeout_ms: 120_000,
            approval_timeout_ms: 30_000,
            escalation_debounce_ms: 10_000,
            reasoning_tool: None,
            reasoning_context_lines: 40,
            max_tick_interval_ms: 10_000,
        }
    }
}

/// The full trusted mapping handed to the orchestrator.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct HiveConfig {
    pub agents: IndexMap<String, AgentConfig>,
    pub pools: Vec<PoolConfig>,
    /// Root directory for per-task worktrees (used by the collaborator,
    /// surfaced on the Task).
    pub worktree_dir: Option<PathBuf>,
    pub task_storage_dir: Option<PathBuf>,
    pub usage_storage_dir: Option<PathBuf>,
    pub worker_log_dir: Option<PathBuf>,
    pub log_level: LogLevel,
    /// Fallback agent for tasks that do not request one.
    pub default_agent: Option<String>,
    pub orchestrator: OrchestratorConfig,
}

impl HiveConfig {
    /// Effective task storage directory.
    pub fn task_dir(&self) -> PathBuf {
        self.task_storage_dir
            .clone()
            .unwrap_or_else(hive_storage::paths::default_task_dir)
    }

    /// Effective usage storage directory.
    pub fn usage_dir(&self) -> PathBuf {
        self.usage_storage_dir
            .clone()
            .unwrap_or_else(hive_storage::paths::default_usage_dir)
    }

    /// Effective per-worker pipe file directory.
    pub fn pipe_dir(&self) -> PathBuf {
        self.worker_log_dir
            .clone()
            .unwrap_or_else(hive_storage::paths::default_worker_log_dir)
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
