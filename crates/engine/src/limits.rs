// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-provider concurrency and rate-window accounting.
//!
//! The tracker owns the provider pool map. Window usage is mirrored to the
//! usage store after every mutation; persistence failures are logged and
//! the in-memory state stays authoritative for the run.

use crate::config::HiveConfig;
use chrono::{DateTime, Utc};
use hive_core::{ProviderPool, RateWindow, WindowKind};
use hive_storage::{ProviderUsage, UsageStore};
use std::collections::HashMap;

const DAY_MS: u64 = 86_400_000;
const WEEK_MS: u64 = 7 * DAY_MS;

/// Concurrency cap for providers that appear without a configured pool.
const IMPLICIT_MAX_CONCURRENT: u32 = 2;

/// Cooldown applied when a rate limit is noted without a retry-after.
const IMPLICIT_COOLDOWN_MS: u64 = 60_000;

/// Start of the fixed bucket containing `now_ms`.
///
/// Weekly buckets open at Monday 00:00 UTC; daily buckets at midnight of
/// the window's configured UTC offset; everything else aligns to epoch
/// multiples of the duration (which puts minute windows at second 0).
fn bucket_start_ms(window: &RateWindow, now_ms: u64) -> u64 {
    match window.duration_ms {
        WEEK_MS => {
            let days = now_ms / DAY_MS;
            // Epoch day zero was a Thursday, three days after a Monday.
            let since_monday = (days + 3) % 7;
            (days - since_monday) * DAY_MS
        }
        DAY_MS => {
            let offset_ms = i64::from(window.utc_offset_minutes.unwrap_or(0)) * 60_000;
            let shifted = now_ms as i64 + offset_ms;
            let local_midnight = shifted.div_euclid(DAY_MS as i64) * DAY_MS as i64;
            (local_midnight - offset_ms).max(0) as u64
        }
        duration if duration > 0 => (now_ms / duration) * duration,
        _ => now_ms,
    }
}

/// Oldest timestamp still counted by a window at `now_ms`.
fn window_floor_ms(window: &RateWindow, now_ms: u64) -> u64 {
    match window.kind {
        WindowKind::Rolling => now_ms.saturating_sub(window.duration_ms),
        WindowKind::Fixed => bucket_start_ms(window, now_ms),
    }
}

fn to_datetime(epoch_ms: u64) -> DateTime<Utc> {
    DateTime::from_timestamp_millis(epoch_ms as i64).unwrap_or(DateTime::UNIX_EPOCH)
}

/// Tracks pools and window usage for every provider.
pub struct RateLimitTracker {
    pools: HashMap<String, ProviderPool>,
    windows: HashMap<String, Vec<RateWindow>>,
    usage: HashMap<String, ProviderUsage>,
    store: UsageStore,
}

impl RateLimitTracker {
    pub fn new(store: UsageStore) -> Self {
        Self {
            pools: HashMap::new(),
            windows: HashMap::new(),
            usage: HashMap::new(),
            store,
        }
    }

    /// Build the tracker from configured pools, loading persisted usage.
    pub fn from_config(config: &HiveConfig, store: UsageStore) -> Self {
        let mut tracker = Self::new(store);
        for pool in &config.pools {
            tracker.add_pool(
                ProviderPool::new(&pool.provider, pool.max_concurrent, pool.cooldown_ms),
                pool.windows.iter().map(|w| w.to_window()).collect(),
            );
        }
        tracker
    }

    /// Register a provider pool and its windows, loading stored usage.
    pub fn add_pool(&mut self, pool: ProviderPool, windows: Vec<RateWindow>) {
        let provider = pool.provider.clone();
        self.usage.insert(provider.clone(), self.store.load(&provider));
        self.windows.insert(provider.clone(), windows);
        self.pools.insert(provider, pool);
    }

    fn ensure_pool(&mut self, provider: &str) {
        if !self.pools.contains_key(provider) {
            tracing::debug!(provider, "no configured pool, creating implicit pool");
            self.add_pool(
                ProviderPool::new(provider, IMPLICIT_MAX_CONCURRENT, IMPLICIT_COOLDOWN_MS),
                Vec::new(),
            );
        }
    }

    pub fn pool(&self, provider: &str) -> Option<&ProviderPool> {
        self.pools.get(provider)
    }

    /// Count dispatches a window still sees at `now_ms`.
    fn window_count(&self, provider: &str, window: &RateWindow, now_ms: u64) -> usize {
        let floor = to_datetime(window_floor_ms(window, now_ms));
        self.usage
            .get(provider)
            .and_then(|u| u.windows.get(&window.id))
            .map(|w| w.timestamps.iter().filter(|t| **t >= floor).count())
            .unwrap_or(0)
    }

    /// Can another dispatch for `provider` start right now?
    pub fn can_dispatch(&self, provider: &str, now_ms: u64) -> bool {
        self.can_dispatch_assuming(provider, 0, now_ms)
    }

    /// Like [`can_dispatch`](Self::can_dispatch) but with `extra` dispatches
    /// already planned this tick. Lets the pure dispatcher cap a batch
    /// without mutating the tracker.
    pub fn can_dispatch_assuming(&self, provider: &str, extra: u32, now_ms: u64) -> bool {
        let Some(pool) = self.pools.get(provider) else {
            // Implicit pool is created on first dispatch.
            return extra < IMPLICIT_MAX_CONCURRENT;
        };
        if pool.active + extra >= pool.max_concurrent {
            return false;
        }
        if pool.is_rate_limited(now_ms) {
            return false;
        }
        for window in self.windows.get(provider).map(Vec::as_slice).unwrap_or(&[]) {
            if let Some(limit) = window.limit {
                if self.window_count(provider, window, now_ms) + extra as usize >= limit as usize {
                    return false;
                }
            }
        }
        true
    }

    /// Record a dispatch: bump the active counter and stamp every window.
    pub fn record_dispatch(&mut self, provider: &str, now_ms: u64) {
        self.ensure_pool(provider);
        if let Some(pool) = self.pools.get_mut(provider) {
            pool.active += 1;
            pool.dispatched += 1;
            debug_assert!(pool.active <= pool.max_concurrent);
        }

        let now = to_datetime(now_ms);
        let windows = self.windows.get(provider).cloned().unwrap_or_default();
        let usage = self.usage.entry(provider.to_string()).or_default();
        for window in &windows {
            let entry = usage.windows.entry(window.id.clone()).or_default();
            entry.timestamps.push(now);
            let floor = to_datetime(window_floor_ms(window, now_ms));
            entry.timestamps.retain(|t| *t >= floor);
        }
        self.persist(provider);
    }

    /// Record a completion: release the slot, prune windows, persist.
    ///
    /// A lost dispatch record is preferable to a stuck counter, so an
    /// underflow clamps at zero with a warning.
    pub fn record_completion(&mut self, provider: &str, success: bool, now_ms: u64) {
        if let Some(pool) = self.pools.get_mut(provider) {
            if pool.active == 0 {
                tracing::warn!(provider, "completion without matching dispatch, clamping at 0");
            }
            pool.active = pool.active.saturating_sub(1);
            if !success {
                pool.failed += 1;
            }
        } else {
            tracing::warn!(provider, "completion for unknown provider pool");
            return;
        }

        let windows = self.windows.get(provider).cloned().unwrap_or_default();
        if let Some(usage) = self.usage.get_mut(provider) {
            for window in &windows {
                if let Some(entry) = usage.windows.get_mut(&window.id) {
                    let floor = to_datetime(window_floor_ms(window, now_ms));
                    entry.timestamps.retain(|t| *t >= floor);
                }
            }
        }
        self.persist(provider);
    }

    /// Flag the provider rate-limited until `now + retry_after_ms`
    /// (default: one cooldown).
    pub fn note_rate_limit(&mut self, provider: &str, retry_after_ms: Option<u64>, now_ms: u64) {
        self.ensure_pool(provider);
        if let Some(pool) = self.pools.get_mut(provider) {
            let retry = retry_after_ms.unwrap_or(pool.cooldown_ms);
            pool.rate_limited_until_ms = Some(now_ms + retry);
            tracing::warn!(provider, retry_after_ms = retry, "provider rate limited");
        }
    }

    fn persist(&self, provider: &str) {
        let Some(usage) = self.usage.get(provider) else {
            return;
        };
        if let Err(e) = self.store.save(provider, usage) {
            tracing::warn!(provider, error = %e, "failed to persist usage; in-memory state remains authoritative");
        }
    }
}

#[cfg(test)]
#[path = "limits_tests.rs"]
mod tests;
