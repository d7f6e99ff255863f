// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[yare::parameterized(
    too_low = { 500 },
    too_high = { 4_000_000 },
)]
fn rejects_out_of_range_interval(ms: i64) {
    assert!(validate_publish_interval(ms).is_err());
}

#[yare::parameterized(
    floor = { 1000 },
    ceiling = { 3_600_000 },
    typical = { 30_000 },
)]
fn accepts_in_range_interval(ms: i64) {
    assert!(validate_publish_interval(ms).is_ok());
}

#[test]
fn update_interval_rejects_and_leaves_sensor_unchanged() {
    let mut sensor = Sensor::builder().publish_interval_ms(30_000).build();
    let result = sensor.update_interval(500);
    assert!(result.is_err());
    assert_eq!(sensor.publish_interval_ms, 30_000);
}

#[test]
fn update_interval_applies_valid_value() {
    let mut sensor = Sensor::builder().publish_interval_ms(30_000).build();
    sensor.update_interval(60_000).unwrap();
    assert_eq!(sensor.publish_interval_ms, 60_000);
}
