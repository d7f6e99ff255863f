// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn app_id_roundtrips_through_json() {
    let id = AppId::new(1001);
    let json = serde_json::to_string(&id).unwrap();
    assert_eq!(json, "1001");
    let parsed: AppId = serde_json::from_str(&json).unwrap();
    assert_eq!(parsed, id);
}

#[test]
fn service_id_display() {
    assert_eq!(ServiceId::new(7).to_string(), "7");
}

#[test]
fn device_id_from_str() {
    let id: DeviceId = "pi-0042".into();
    assert_eq!(id.as_str(), "pi-0042");
    assert_eq!(id.to_string(), "pi-0042");
}

#[test]
fn job_id_ordering_is_lexicographic() {
    let a: JobId = "job-1".into();
    let b: JobId = "job-2".into();
    assert!(a < b);
}
