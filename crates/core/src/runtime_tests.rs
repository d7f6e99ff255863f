// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[yare::parameterized(
    exited = { ServiceStatus::Exited },
    stopped = { ServiceStatus::Stopped },
    dead = { ServiceStatus::Dead },
)]
fn stopped_kinds_are_flagged(status: ServiceStatus) {
    assert!(status.is_stopped_kind());
}

#[yare::parameterized(
    pending = { ServiceStatus::Pending },
    running = { ServiceStatus::Running },
    error = { ServiceStatus::Error },
)]
fn non_stopped_kinds_are_not_flagged(status: ServiceStatus) {
    assert!(!status.is_stopped_kind());
}

#[test]
fn crash_loop_detected_after_three_exits_in_window() {
    let mut runtime = ServiceRuntime::default();
    assert!(!runtime.record_exit(0));
    assert!(!runtime.record_exit(1_000));
    assert!(runtime.record_exit(2_000));
}

#[test]
fn crash_loop_window_expires_old_exits() {
    let mut runtime = ServiceRuntime::default();
    assert!(!runtime.record_exit(0));
    assert!(!runtime.record_exit(1_000));
    // Far outside the 5-minute window: the first two exits roll off.
    assert!(!runtime.record_exit(10 * 60 * 1000));
}
