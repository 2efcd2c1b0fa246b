// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Pane-text state detection.
//!
//! Classification is a pure function of the pane text and the profile:
//! same input, same snapshot (modulo timestamp). The inactivity
//! refinement (working -> stuck) is the only part that looks at time.

use hive_adapters::strip_ansi;
use hive_core::{PatternProfile, StateSnapshot, WorkerState};

/// Pattern id reported when inactivity promotes `working` to `stuck`.
pub const STUCK_PATTERN_ID: &str = "stuck:no_output_change";

/// Classify raw pane text into a state snapshot.
///
/// Empty panes mean the tool has not rendered yet (`starting`). When no
/// pattern matches non-empty text the classification is pessimistic:
/// something is happening that we cannot name, so `working`.
pub fn detect_from_output(profile: &PatternProfile, raw: &str, now_ms: u64) -> StateSnapshot {
    let text = strip_ansi(raw);
    if text.trim().is_empty() {
        return StateSnapshot::new(WorkerState::Starting, None, text, now_ms);
    }

    for pattern in profile.patterns() {
        if pattern.is_match(&text) {
            return StateSnapshot::new(pattern.state, Some(pattern.id.clone()), text, now_ms);
        }
    }

    StateSnapshot::new(WorkerState::Working, None, text, now_ms)
}

/// Promote `working` to `stuck` when the pane has been silent too long.
///
/// Other states pass through unchanged: a tool sitting at an approval
/// dialog is waiting, not stuck.
pub fn refine_state(
    snapshot: StateSnapshot,
    last_change_ms: u64,
    stuck_timeout_ms: u64,
    now_ms: u64,
) -> StateSnapshot {
    if snapshot.state == WorkerState::Working
        && now_ms.saturating_sub(last_change_ms) >= stuck_timeout_ms
    {
        return StateSnapshot {
            state: WorkerState::Stuck,
            pattern_id: Some(STUCK_PATTERN_ID.to_string()),
            ..snapshot
        };
    }
    snapshot
}

#[cfg(test)]
#[path = "detector_tests.rs"]
mod tests;
