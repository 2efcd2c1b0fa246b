// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Provider pool and rate-window accounting types.
//!
//! All agents sharing a backend provider draw from one pool: a concurrency
//! cap plus zero or more usage windows. The tracker in the engine owns the
//! pool map; these are the plain records it accounts with.

use serde::{Deserialize, Serialize};

/// How a window's usage count resets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WindowKind {
    /// Usage older than `now - duration` is dropped continuously.
    Rolling,
    /// Usage is bucketed at wall-clock boundaries (minute at second 0,
    /// daily at the configured-offset midnight, weekly at Monday 00:00 UTC).
    Fixed,
}

/// A rate-limit window definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateWindow {
    pub id: String,
    pub label: String,
    pub kind: WindowKind,
    pub duration_ms: u64,
    /// Maximum dispatches inside the window; `None` means uncounted
    /// (the window only tracks usage for display).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
    /// Human description of when the window resets.
    #[serde(default)]
    pub reset: String,
    /// Minutes east of UTC anchoring fixed daily buckets. `None` = UTC.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub utc_offset_minutes: Option<i32>,
}

/// Concurrency and failure accounting for one provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderPool {
    pub provider: String,
    pub max_concurrent: u32,
    pub cooldown_ms: u64,
    /// Dispatches currently in flight. Invariant: 0 <= active <= max_concurrent.
    pub active: u32,
    pub dispatched: u64,
    pub failed: u64,
    /// Epoch ms until which the provider is rate limited, if flagged.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rate_limited_until_ms: Option<u64>,
}

impl ProviderPool {
    pub fn new(provider: impl Into<String>, max_concurrent: u32, cooldown_ms: u64) -> Self {
        Self {
            provider: provider.into(),
            max_concurrent,
            cooldown_ms,
            active: 0,
            dispatched: 0,
            failed: 0,
            rate_limited_until_ms: None,
        }
    }

    /// True while the rate-limited flag is set and its deadline is in the future.
    pub fn is_rate_limited(&self, now_ms: u64) -> bool {
        match self.rate_limited_until_ms {
            Some(until) => until > now_ms,
            None => false,
        }
    }

    /// True if another dispatch fits under the concurrency cap.
    pub fn has_capacity(&self) -> bool {
        self.active < self.max_concurrent
    }
}

#[cfg(test)]
#[path = "limits_tests.rs"]
mod tests;
