// SPDX-License-Identifier: MIT

use super::*;
use std::time::Duration;

#[test]
fn fake_clock_advances_both_instant_and_epoch() {
    let clock = FakeClock::new();
    let start_ms = clock.epoch_ms();
    let start_instant = clock.now();

    clock.advance(Duration::from_secs(5));

    assert_eq!(clock.epoch_ms(), start_ms + 5000);
    assert!(clock.now() >= start_instant + Duration::from_secs(5));
}

#[test]
fn set_epoch_ms_is_absolute() {
    let clock = FakeClock::new();
    clock.set_epoch_ms(42);
    assert_eq!(clock.epoch_ms(), 42);
}

#[test]
fn system_clock_epoch_is_plausible() {
    let clock = SystemClock;
    // Any time after 2020-01-01.
    assert!(clock.epoch_ms() > 1_577_836_800_000);
}
