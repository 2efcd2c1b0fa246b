// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Centralized environment variable access for the adapters crate.

use std::time::Duration;

fn parse_duration_ms(var: &str) -> Option<Duration> {
    std::env::var(var)
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .map(Duration::from_millis)
}

/// Ready-pattern poll interval (default: 500ms).
pub fn ready_poll_ms() -> Duration {
    parse_duration_ms("HIVE_READY_POLL_MS").unwrap_or(crate::subprocess::READY_POLL)
}

/// Ready-pattern total wait budget (default: 30000ms).
pub fn ready_max_wait_ms() -> Duration {
    parse_duration_ms("HIVE_READY_MAX_WAIT_MS").unwrap_or(crate::subprocess::READY_MAX_WAIT)
}

/// Reasoning tool timeout (default: 60000ms).
pub fn reasoning_timeout_ms() -> Duration {
    parse_duration_ms("HIVE_REASONING_TIMEOUT_MS").unwrap_or(crate::subprocess::REASONING_TIMEOUT)
}
