// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Agent registry: the closed set of known tools plus external adapters.
//!
//! Dispatch is by variant tag. Each kind knows its provider pool, launch
//! command, ready pattern, and the keys that drive its approval dialogs.

use crate::config::HiveConfig;
use crate::error::OrchestratorError;
use hive_core::PatternProfile;
use indexmap::IndexMap;

/// Subprocess spec for a tool outside the known set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExternalAgent {
    pub provider: String,
    pub command: String,
}

/// The known agent tools, plus an open constructor for everything else.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AgentKind {
    Claude,
    Codex,
    Gemini,
    Cursor,
    External(ExternalAgent),
}

impl AgentKind {
    /// Resolve a kind from the configured agent name.
    pub fn from_name(name: &str, provider: Option<&str>, command: Option<&str>) -> Self {
        match name {
            "claude" => AgentKind::Claude,
            "codex" => AgentKind::Codex,
            "gemini" => AgentKind::Gemini,
            "cursor" => AgentKind::Cursor,
            _ => AgentKind::External(ExternalAgent {
                provider: provider.unwrap_or(name).to_string(),
                command: command.unwrap_or(name).to_string(),
            }),
        }
    }

    /// Provider pool this tool draws from.
    pub fn provider(&self) -> &str {
        match self {
            AgentKind::Claude => "anthropic",
            AgentKind::Codex => "openai",
            AgentKind::Gemini => "google",
            AgentKind::Cursor => "cursor",
            AgentKind::External(spec) => &spec.provider,
        }
    }

    /// Profile key for pane-text classification.
    pub fn tool_name(&self) -> &str {
        match self {
            AgentKind::Claude => "claude",
            AgentKind::Codex => "codex",
            AgentKind::Gemini => "gemini",
            AgentKind::Cursor => "cursor",
            AgentKind::External(spec) => &spec.provider,
        }
    }

    /// Default launch command when the config does not override it.
    pub fn default_command(&self) -> &str {
        match self {
            AgentKind::Claude => "claude",
            AgentKind::Codex => "codex",
            AgentKind::Gemini => "gemini",
            AgentKind::Cursor => "cursor-agent",
            AgentKind::External(spec) => &spec.command,
        }
    }

    /// Key that accepts the tool's approval dialog.
    pub fn approve_key(&self) -> &'static str {
        match self {
            // Claude's dialogs are numbered with "1. Yes" first
            AgentKind::Claude => "1",
            _ => "y",
        }
    }

    /// Key that cancels the tool's current turn.
    pub fn cancel_key(&self) -> &'static str {
        "Escape"
    }

    /// Regex that marks the tool ready for input after launch.
    pub fn ready_pattern(&self) -> &'static str {
        match self {
            AgentKind::Claude => r"(?m)^>\s*$|\? for shortcuts",
            AgentKind::Codex => r"\? for shortcuts|(?m)^›\s*$",
            AgentKind::Gemini => r"(?m)^\s*>\s*$|Type your message",
            AgentKind::Cursor => r"(?m)^>\s*$|Add context",
            AgentKind::External(_) => r"(?m)^\s*[>$»›]\s*$",
        }
    }
}

/// One configured, enabled agent.
#[derive(Debug, Clone)]
pub struct RegisteredAgent {
    pub name: String,
    pub kind: AgentKind,
    /// Fully assembled launch command line.
    pub command: String,
    pub max_concurrent: Option<u32>,
    pub profile: PatternProfile,
}

/// Insertion-ordered set of enabled agents.
#[derive(Debug, Clone, Default)]
pub struct AgentRegistry {
    agents: IndexMap<String, RegisteredAgent>,
}

impl AgentRegistry {
    /// Build the registry from the trusted config mapping.
    ///
    /// Disabled agents are excluded entirely; declaration order is kept
    /// because the dispatcher scans it as the final fallback.
    pub fn from_config(config: &HiveConfig) -> Result<Self, OrchestratorError> {
        let mut agents = IndexMap::new();
        for (name, agent_config) in &config.agents {
            if !agent_config.enabled {
                continue;
            }
            let kind = AgentKind::from_name(
                name,
                agent_config.provider.as_deref(),
                agent_config.command.as_deref(),
            );

            let mut command = agent_config
                .command
                .clone()
                .unwrap_or_else(|| kind.default_command().to_string());
            if !agent_config.args.is_empty() {
                command = format!("{} {}", command, agent_config.args.join(" "));
            }

            let profile = PatternProfile::for_tool(kind.tool_name())?;

            agents.insert(
                name.clone(),
                RegisteredAgent {
                    name: name.clone(),
                    kind,
                    command,
                    max_concurrent: agent_config.max_concurrent,
                    profile,
                },
            );
        }
        Ok(Self { agents })
    }

    pub fn get(&self, name: &str) -> Option<&RegisteredAgent> {
        self.agents.get(name)
    }

    /// Agents in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = &RegisteredAgent> {
        self.agents.values()
    }

    pub fn len(&self) -> usize {
        self.agents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }
}

#[cfg(test)]
#[path = "registry_tests.rs"]
mod tests;
