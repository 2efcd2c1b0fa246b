// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Clock abstractions for testable time handling

use parking_lot::Mutex;
use std::sync::Arc;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

/// Source of monotonic and wall-clock time.
///
/// `now()` drives tick scheduling and inactivity timeouts; `epoch_ms()`
/// drives persisted timestamps and rate-limit window arithmetic.
pub trait Clock: Clone + Send + Sync {
    fn now(&self) -> Instant;
    fn epoch_ms(&self) -> u64;
}

/// System clock for production use
#[derive(Clone, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    fn epoch_ms(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis() as u64
    }
}

/// Manually advanced clock for tests
#[derive(Clone)]
pub struct FakeClock {
    start: Instant,
    base_epoch_ms: u64,
    offset: Arc<Mutex<Duration>>,
}

impl FakeClock {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
            base_epoch_ms: 1_700_000_000_000,
            offset: Arc::new(Mutex::new(Duration::ZERO)),
        }
    }

    /// Create a fake clock anchored at a specific epoch timestamp.
    pub fn at_epoch_ms(epoch_ms: u64) -> Self {
        Self {
            start: Instant::now(),
            base_epoch_ms: epoch_ms,
            offset: Arc::new(Mutex::new(Duration::ZERO)),
        }
    }

    /// Advance the clock by the given duration.
    pub fn advance(&self, by: Duration) {
        *self.offset.lock() += by;
    }
}

impl Default for FakeClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for FakeClock {
    fn now(&self) -> Instant {
        self.start + *self.offset.lock()
    }

    fn epoch_ms(&self) -> u64 {
        self.base_epoch_ms + self.offset.lock().as_millis() as u64
    }
}

#[cfg(test)]
#[path = "clock_tests.rs"]
mod tests;
