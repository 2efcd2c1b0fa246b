// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-tool pattern tables mapping rendered pane text to worker states.
//!
//! Each interactive agent CLI renders its own prompt, spinner, and approval
//! dialog. A profile bundles the regexes that recognize them, ordered by
//! priority, plus two auxiliary sets: activity patterns ("the tool is doing
//! something right now") and completion patterns ("the tool finished the
//! latest turn").

use crate::worker::WorkerState;
use regex::Regex;

/// Return the last `n` lines of `text`.
///
/// Patterns with a window are matched against this tail only, so stale
/// narrative higher up the pane cannot trigger high-priority states.
pub fn tail_lines(text: &str, n: usize) -> String {
    let lines: Vec<&str> = text.lines().collect();
    let start = lines.len().saturating_sub(n);
    lines[start..].join("\n")
}

/// One recognizer: regex, target state, priority, optional match window.
#[derive(Debug, Clone)]
pub struct Pattern {
    pub id: String,
    pub state: WorkerState,
    /// Higher wins when several patterns match the same pane.
    pub priority: i32,
    pub regex: Regex,
    /// Match only the last N lines of the pane when set.
    pub window: Option<usize>,
}

impl Pattern {
    pub fn new(
        id: impl Into<String>,
        state: WorkerState,
        priority: i32,
        regex: &str,
        window: Option<usize>,
    ) -> Result<Self, regex::Error> {
        Ok(Self {
            id: id.into(),
            state,
            priority,
            regex: Regex::new(regex)?,
            window,
        })
    }

    /// Test this pattern against ANSI-stripped pane text, honoring the window.
    pub fn is_match(&self, stripped: &str) -> bool {
        match self.window {
            Some(n) => self.regex.is_match(&tail_lines(stripped, n)),
            None => self.regex.is_match(stripped),
        }
    }
}

/// Declarative pattern row used by the built-in profile tables.
struct Spec {
    state: WorkerState,
    priority: i32,
    window: Option<usize>,
    regex: &'static str,
}

/// Approval dialogs fit in the last ~15 lines of the pane. Anything above
/// that is narrative and must not trigger `waiting_approval`.
const APPROVAL_WINDOW: usize = 15;

/// Gemini's approval dialog is a tall box with a spinner rendered below it,
/// so its window has to reach higher to still include the "Allow" line.
const GEMINI_APPROVAL_WINDOW: usize = 20;

/// The prompt sentinel only counts when it is at the bottom of the pane.
const IDLE_WINDOW: usize = 5;

const CLAUDE: &[Spec] = &[
    Spec {
        state: WorkerState::RateLimited,
        priority: 10,
        window: None,
        regex: r"(?i)rate limit(?:ed)?|usage limit (?:reached|hit)|too many requests",
    },
    Spec {
        state: WorkerState::WaitingApproval,
        priority: 9,
        window: Some(APPROVAL_WINDOW),
        regex: r"(?i)do you want to (?:allow|proceed|make this edit)|allow (?:this|once|always)|❯ 1\. yes",
    },
    Spec {
        state: WorkerState::WaitingInput,
        priority: 8,
        window: Some(APPROVAL_WINDOW),
        regex: r"(?i)what would you like|please (?:choose|select|clarify)|which option",
    },
    Spec {
        state: WorkerState::Error,
        priority: 7,
        window: None,
        regex: r"(?im)^\s*(?:error|fatal):|panicked at",
    },
    Spec {
        state: WorkerState::Working,
        priority: 5,
        window: None,
        regex: r"esc to interrupt|\d+s\s*[·│]|[✻✽✶✳]",
    },
    Spec {
        state: WorkerState::Idle,
        priority: 1,
        window: Some(IDLE_WINDOW),
        regex: r"(?m)^>\s*$|\? for shortcuts",
    },
];

const CODEX: &[Spec] = &[
    Spec {
        state: WorkerState::RateLimited,
        priority: 10,
        window: None,
        regex: r"(?i)rate limit|usage limit|quota exceeded",
    },
    Spec {
        state: WorkerState::WaitingApproval,
        priority: 9,
        window: Some(APPROVAL_WINDOW),
        regex: r"(?i)\bconfirm|\ballow\b|would you like to (?:run|apply)|press y to approve",
    },
    Spec {
        state: WorkerState::WaitingInput,
        priority: 8,
        window: Some(APPROVAL_WINDOW),
        regex: r"(?i)what should|need more (?:info|detail)|clarif",
    },
    Spec {
        state: WorkerState::Error,
        priority: 7,
        window: None,
        regex: r"(?im)^\s*error:|stream (?:error|disconnected)",
    },
    Spec {
        state: WorkerState::Working,
        priority: 5,
        window: None,
        regex: r"Working \(\d+s|esc to interrupt",
    },
    Spec {
        state: WorkerState::Idle,
        priority: 1,
        window: Some(IDLE_WINDOW),
        regex: r"\? for shortcuts|(?m)^›\s*$",
    },
];

const GEMINI: &[Spec] = &[
    Spec {
        state: WorkerState::RateLimited,
        priority: 10,
        window: None,
        regex: r"(?i)rate limit|quota exceeded|resource exhausted|\b429\b",
    },
    Spec {
        state: WorkerState::WaitingApproval,
        priority: 9,
        window: Some(GEMINI_APPROVAL_WINDOW),
        regex: r"(?i)allow execution|apply this change\?|yes, allow (?:once|always)|do you want to proceed",
    },
    Spec {
        state: WorkerState::WaitingInput,
        priority: 8,
        window: Some(APPROVAL_WINDOW),
        regex: r"(?i)waiting for (?:your|user) (?:input|confirmation)",
    },
    Spec {
        state: WorkerState::Error,
        priority: 7,
        window: None,
        regex: r"(?im)^\s*✖|^\s*error:",
    },
    Spec {
        state: WorkerState::Working,
        priority: 5,
        window: None,
        regex: r"[⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏]|\(esc to cancel\)",
    },
    Spec {
        state: WorkerState::Idle,
        priority: 1,
        window: Some(IDLE_WINDOW),
        regex: r"(?m)^\s*>\s*$|Type your message",
    },
];

const CURSOR: &[Spec] = &[
    Spec {
        state: WorkerState::RateLimited,
        priority: 10,
        window: None,
        regex: r"(?i)rate limit|usage limit",
    },
    Spec {
        state: WorkerState::WaitingApproval,
        priority: 9,
        window: Some(APPROVAL_WINDOW),
        regex: r"(?i)run this command\?|\baccept\b.*\breject\b|requires approval",
    },
    Spec {
        state: WorkerState::WaitingInput,
        priority: 8,
        window: Some(APPROVAL_WINDOW),
        regex: r"(?i)which (?:approach|option)|need your input",
    },
    Spec {
        state: WorkerState::Error,
        priority: 7,
        window: None,
        regex: r"(?im)^\s*error:|connection failed",
    },
    Spec {
        state: WorkerState::Working,
        priority: 5,
        window: None,
        regex: r"(?i)\bgenerating\b|esc to interrupt",
    },
    Spec {
        state: WorkerState::Idle,
        priority: 1,
        window: Some(IDLE_WINDOW),
        regex: r"(?m)^>\s*$|Add context",
    },
];

/// Fallback table for tools without a dedicated profile.
const GENERIC: &[Spec] = &[
    Spec {
        state: WorkerState::RateLimited,
        priority: 10,
        window: None,
        regex: r"(?i)rate limit|too many requests",
    },
    Spec {
        state: WorkerState::WaitingApproval,
        priority: 9,
        window: Some(APPROVAL_WINDOW),
        regex: r"(?i)\ballow\b.*\?|do you want to|\[y/n\]",
    },
    Spec {
        state: WorkerState::WaitingInput,
        priority: 8,
        window: Some(APPROVAL_WINDOW),
        regex: r"(?i)awaiting (?:input|response)|question:",
    },
    Spec {
        state: WorkerState::Error,
        priority: 7,
        window: None,
        regex: r"(?im)^\s*(?:error|fatal)\b",
    },
    Spec {
        state: WorkerState::Working,
        priority: 5,
        window: None,
        regex: r"(?i)esc to interrupt|\bworking\b|\bthinking\b|[⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏✻]",
    },
    Spec {
        state: WorkerState::Idle,
        priority: 1,
        window: Some(IDLE_WINDOW),
        regex: r"(?m)^\s*[>$»›]\s*$",
    },
];

/// A tool's full recognizer set.
#[derive(Debug, Clone)]
pub struct PatternProfile {
    pub tool: String,
    patterns: Vec<Pattern>,
    activity: Vec<Regex>,
    completion: Vec<Regex>,
}

impl PatternProfile {
    /// Build the profile for a tool name. Unknown tools get the generic table.
    pub fn for_tool(tool: &str) -> Result<Self, regex::Error> {
        let (specs, activity, completion): (&[Spec], &[&str], &[&str]) = match tool {
            "claude" => (
                CLAUDE,
                &[r"esc to interrupt", r"[✻✽✶✳]", r"\d+\s*tokens"],
                &[r"(?i)\bdone\b", r"Total (?:cost|duration)", r"✓"],
            ),
            "codex" => (
                CODEX,
                &[r"esc to interrupt", r"Working \("],
                &[r"(?i)\bdone\b", r"tokens used"],
            ),
            "gemini" => (
                GEMINI,
                &[r"[⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏]", r"\(esc to cancel\)"],
                &[r"(?i)\bdone\b", r"✔"],
            ),
            "cursor" => (
                CURSOR,
                &[r"(?i)\bgenerating\b", r"esc to interrupt"],
                &[r"(?i)\bdone\b", r"✓"],
            ),
            _ => (
                GENERIC,
                &[r"esc to interrupt", r"[⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏✻]"],
                &[r"(?i)\bdone\b|\bfinished\b"],
            ),
        };
        Self::build(tool, specs, activity, completion)
    }

    fn build(
        tool: &str,
        specs: &[Spec],
        activity: &[&str],
        completion: &[&str],
    ) -> Result<Self, regex::Error> {
        let mut patterns = Vec::with_capacity(specs.len());
        for spec in specs {
            patterns.push(Pattern::new(
                format!("{}:{}", tool, spec.state),
                spec.state,
                spec.priority,
                spec.regex,
                spec.window,
            )?);
        }
        // Stable sort keeps declaration order among equal priorities.
        patterns.sort_by_key(|p| std::cmp::Reverse(p.priority));

        let activity = activity
            .iter()
            .map(|r| Regex::new(r))
            .collect::<Result<Vec<_>, _>>()?;
        let completion = completion
            .iter()
            .map(|r| Regex::new(r))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            tool: tool.to_string(),
            patterns,
            activity,
            completion,
        })
    }

    /// Patterns in match order: priority descending, declaration-stable.
    pub fn patterns(&self) -> &[Pattern] {
        &self.patterns
    }

    /// True if any activity pattern matches: the tool is mid-turn.
    pub fn has_activity(&self, stripped: &str) -> bool {
        self.activity.iter().any(|r| r.is_match(stripped))
    }

    /// True if any completion pattern matches: the latest turn finished.
    pub fn is_complete(&self, stripped: &str) -> bool {
        self.completion.iter().any(|r| r.is_match(stripped))
    }
}

#[cfg(test)]
#[path = "pattern_tests.rs"]
mod tests;
