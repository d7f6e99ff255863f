// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use serde_json::json;

#[test]
fn delta_is_empty_when_reported_equals_desired() {
    let mut shadow = Shadow::new("sensor-config");
    shadow.reported = json!({"sensors": {"s1": {"publishInterval": 30000}}});
    shadow.desired = shadow.reported.clone();
    assert_eq!(shadow.delta(), json!({}));
}

#[test]
fn delta_surfaces_changed_leaf() {
    let mut shadow = Shadow::new("sensor-config");
    shadow.reported = json!({"sensors": {"s1": {"enabled": true, "publishInterval": 30000}}});
    shadow.desired = json!({"sensors": {"s1": {"enabled": true, "publishInterval": 60000}}});
    assert_eq!(
        shadow.delta(),
        json!({"sensors": {"s1": {"publishInterval": 60000}}})
    );
}

#[test]
fn publish_increments_version_monotonically() {
    let mut shadow = Shadow::new("sensor-config");
    let v1 = shadow.next_reported_envelope(json!({"a": 1}), "t1".into());
    let v2 = shadow.next_reported_envelope(json!({"a": 2}), "t2".into());
    assert_eq!(v1["version"], 1);
    assert_eq!(v2["version"], 2);
    assert!(v2["version"].as_u64().unwrap() > v1["version"].as_u64().unwrap());
}

#[test]
fn shadow_channel_topic_grammar() {
    assert_eq!(
        ShadowChannel::Delta.topic("pi-01", "sensor-config"),
        "iot/device/pi-01/shadow/name/sensor-config/update/delta"
    );
}
