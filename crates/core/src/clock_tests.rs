// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn fake_clock_advances_monotonic_and_epoch_together() {
    let clock = FakeClock::new();
    let t0 = clock.now();
    let e0 = clock.epoch_ms();

    clock.advance(Duration::from_millis(1500));

    assert_eq!(clock.now() - t0, Duration::from_millis(1500));
    assert_eq!(clock.epoch_ms() - e0, 1500);
}

#[test]
fn fake_clock_clones_share_time() {
    let clock = FakeClock::new();
    let other = clock.clone();
    clock.advance(Duration::from_secs(5));
    assert_eq!(other.epoch_ms(), clock.epoch_ms());
}

#[test]
fn fake_clock_anchored_epoch() {
    let clock = FakeClock::at_epoch_ms(42_000);
    assert_eq!(clock.epoch_ms(), 42_000);
    clock.advance(Duration::from_secs(1));
    assert_eq!(clock.epoch_ms(), 43_000);
}

#[test]
fn system_clock_epoch_is_plausible() {
    let clock = SystemClock;
    // Any run of this test is well after 2023-11.
    assert!(clock.epoch_ms() > 1_700_000_000_000);
}
