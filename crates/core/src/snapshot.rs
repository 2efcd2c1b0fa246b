// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! State snapshots produced by the detector.

use crate::worker::WorkerState;
use serde::{Deserialize, Serialize};

/// Immutable record of one detection pass over a worker's pane.
///
/// The pane text is retained so a reasoning verdict can be sought later
/// without re-capturing (the pane may have scrolled by then).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateSnapshot {
    pub state: WorkerState,
    /// Id of the pattern that matched, if any (`None` for the fallback
    /// classification and for `starting`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern_id: Option<String>,
    /// ANSI-stripped pane text the classification was made from.
    pub pane: String,
    pub at_ms: u64,
}

impl StateSnapshot {
    pub fn new(state: WorkerState, pattern_id: Option<String>, pane: String, at_ms: u64) -> Self {
        Self {
            state,
            pattern_id,
            pane,
            at_ms,
        }
    }
}
