// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Reasoning-agent verdicts.
//!
//! The reasoning tool answers with either one of five meta-commands on its
//! first line, or free text to forward verbatim to the worker.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Meta-commands a reasoning agent may answer with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum MetaCommand {
    Approve,
    Wait,
    Restart,
    Done,
    Failed,
}

impl MetaCommand {
    fn from_line(line: &str) -> Option<Self> {
        match line.trim().to_ascii_uppercase().as_str() {
            "APPROVE" => Some(MetaCommand::Approve),
            "WAIT" => Some(MetaCommand::Wait),
            "RESTART" => Some(MetaCommand::Restart),
            "DONE" => Some(MetaCommand::Done),
            "FAILED" => Some(MetaCommand::Failed),
            _ => None,
        }
    }
}

impl fmt::Display for MetaCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MetaCommand::Approve => write!(f, "APPROVE"),
            MetaCommand::Wait => write!(f, "WAIT"),
            MetaCommand::Restart => write!(f, "RESTART"),
            MetaCommand::Done => write!(f, "DONE"),
            MetaCommand::Failed => write!(f, "FAILED"),
        }
    }
}

/// Parsed reasoning response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Verdict {
    Meta { command: MetaCommand },
    Text { text: String },
}

impl Verdict {
    /// Parse raw reasoning-tool output.
    ///
    /// The first line decides: a lone meta-command (case-insensitive,
    /// whitespace-trimmed) wins, anything else is free text forwarded to
    /// the worker. An empty response means keep waiting.
    pub fn parse(raw: &str) -> Verdict {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Verdict::Meta {
                command: MetaCommand::Wait,
            };
        }
        let first_line = trimmed.lines().next().unwrap_or_default();
        if let Some(command) = MetaCommand::from_line(first_line) {
            return Verdict::Meta { command };
        }
        Verdict::Text {
            text: trimmed.to_string(),
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Verdict::Meta { command } => write!(f, "{}", command),
            Verdict::Text { text } => write!(f, "{}", text),
        }
    }
}

#[cfg(test)]
#[path = "verdict_tests.rs"]
mod tests;
