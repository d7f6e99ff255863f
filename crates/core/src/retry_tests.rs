// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::clock::FakeClock;

#[test]
fn first_failure_sets_base_delay() {
    let mut state = RetryState::default();
    state.record_failure(0, "boom");
    assert_eq!(state.next_retry_time_ms, Some(10_000));
    assert_eq!(state.failure_count, 1);
}

#[test]
fn backoff_doubles_and_caps() {
    let mut state = RetryState::default();
    let mut now = 0u64;
    let mut last_delay = 0u64;
    for _ in 0..10 {
        state.record_failure(now, "boom");
        let delay = state.next_retry_time_ms.unwrap() - now;
        assert!(delay <= BACKOFF_CAP.as_millis() as u64);
        if last_delay != 0 {
            assert!(delay >= last_delay);
        }
        last_delay = delay;
        now = state.next_retry_time_ms.unwrap();
    }
    assert_eq!(last_delay, BACKOFF_CAP.as_millis() as u64);
}

#[test]
fn is_gated_respects_next_retry_time() {
    let mut state = RetryState::default();
    state.record_failure(0, "boom");
    assert!(state.is_gated(1));
    assert!(!state.is_gated(10_001));
}

#[test]
fn retry_table_gates_by_key() {
    let clock = FakeClock::new();
    clock.set_epoch_ms(0);
    let table = RetryTable::new(clock.clone());
    table.record_failure("service:1001:1", "pull failed");
    assert!(table.is_gated("service:1001:1"));
    assert!(!table.is_gated("service:1001:2"));
}

#[test]
fn retry_table_clear_removes_state() {
    let clock = FakeClock::new();
    let table = RetryTable::new(clock);
    table.record_failure("k", "e");
    table.clear("k");
    assert!(table.get("k").is_none());
}
