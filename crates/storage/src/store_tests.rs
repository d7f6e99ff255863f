// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use dsup_core::{App, AppId};

fn sample_snapshot() -> StateSnapshot {
    let mut snapshot = StateSnapshot::empty();
    snapshot.apps.insert(
        AppId::new(1001),
        App {
            id: AppId::new(1001),
            name: "web".into(),
            uuid: None,
            services: vec![],
        },
    );
    snapshot
}

#[test]
fn load_on_fresh_store_is_none() {
    let dir = tempfile::tempdir().unwrap();
    let store = StateStore::open(dir.path().join("state.json")).unwrap();
    assert!(store.load(SnapshotKind::Current).unwrap().is_none());
}

#[test]
fn write_then_load_roundtrips() {
    let dir = tempfile::tempdir().unwrap();
    let store = StateStore::open(dir.path().join("state.json")).unwrap();
    let snapshot = sample_snapshot();
    assert!(store.write(SnapshotKind::Target, &snapshot).unwrap());
    let loaded = store.load(SnapshotKind::Target).unwrap().unwrap();
    assert_eq!(loaded, snapshot);
}

#[test]
fn second_write_of_identical_content_is_elided() {
    let dir = tempfile::tempdir().unwrap();
    let store = StateStore::open(dir.path().join("state.json")).unwrap();
    let snapshot = sample_snapshot();
    assert!(store.write(SnapshotKind::Current, &snapshot).unwrap());
    assert!(!store.write(SnapshotKind::Current, &snapshot).unwrap());
}

#[test]
fn slots_are_independent() {
    let dir = tempfile::tempdir().unwrap();
    let store = StateStore::open(dir.path().join("state.json")).unwrap();
    store.write(SnapshotKind::Current, &sample_snapshot()).unwrap();
    assert!(store.load(SnapshotKind::Target).unwrap().is_none());
}

#[test]
fn corrupt_row_is_treated_as_empty_slot() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("state.json");
    let store = StateStore::open(&path).unwrap();
    let mut disk: OnDisk = serde_json::from_slice(&std::fs::read(&path).unwrap()).unwrap();
    disk.rows.insert(
        "current".to_string(),
        Row {
            schema_version: CURRENT_SCHEMA_VERSION,
            state: serde_json::json!({"apps": "not-a-map"}),
            state_hash: "deadbeef".into(),
            created_at: Utc::now(),
        },
    );
    std::fs::write(&path, serde_json::to_vec(&disk).unwrap()).unwrap();

    assert!(store.load(SnapshotKind::Current).unwrap().is_none());
}
