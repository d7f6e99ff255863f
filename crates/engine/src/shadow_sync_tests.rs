// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::sensor_manager::SensorManager;
use dsup_adapters::{FakeBusClient, FakeSensorSource};
use dsup_core::{FakeClock, Sensor};
use serde_json::json;

fn sensors() -> Arc<SensorManager<FakeClock>> {
    Arc::new(SensorManager::new(
        Arc::new(FakeSensorSource::new()),
        FakeClock::new(),
        vec![Sensor {
            name: "temp".into(),
            enabled: true,
            address: "/run/sensors/temp.sock".into(),
            publish_interval_ms: 30_000,
            metrics: Default::default(),
        }],
    ))
}

#[tokio::test]
async fn start_subscribes_to_all_three_channels_and_publishes_initial_snapshot() {
    let (bus, _rx) = FakeBusClient::new();
    let sync = ShadowSynchronizer::new(Arc::new(bus.clone()), "dev-1", "sensor-config", sensors());
    sync.start().await;

    let published = bus.published();
    assert_eq!(published.len(), 1);
    assert_eq!(
        published[0].topic,
        "iot/device/dev-1/shadow/name/sensor-config/update"
    );
    let body: serde_json::Value = serde_json::from_slice(&published[0].payload).unwrap();
    assert_eq!(body["version"], json!(1));
}

#[tokio::test]
async fn delta_on_valid_config_republishes_with_incremented_version() {
    let (bus, _rx) = FakeBusClient::new();
    let sync = ShadowSynchronizer::new(Arc::new(bus.clone()), "dev-1", "sensor-config", sensors());
    sync.start().await;

    let delta = BusMessage {
        topic: "iot/device/dev-1/shadow/name/sensor-config/update/delta".into(),
        payload: serde_json::to_vec(&json!({"sensors": {"temp": {"publishInterval": 5000}}})).unwrap(),
    };
    sync.handle_message(&delta).await;

    let published = bus.published();
    assert_eq!(published.len(), 2);
    let body: serde_json::Value = serde_json::from_slice(&published[1].payload).unwrap();
    assert_eq!(body["version"], json!(2));
    assert_eq!(body["state"]["reported"]["sensors"]["temp"]["publishInterval"], json!(5000));
}

#[tokio::test]
async fn delta_on_unknown_sensor_publishes_error_document() {
    let (bus, _rx) = FakeBusClient::new();
    let sync = ShadowSynchronizer::new(Arc::new(bus.clone()), "dev-1", "sensor-config", sensors());
    sync.start().await;

    let delta = BusMessage {
        topic: "iot/device/dev-1/shadow/name/sensor-config/update/delta".into(),
        payload: serde_json::to_vec(&json!({"sensors": {"ghost": {"enabled": true}}})).unwrap(),
    };
    sync.handle_message(&delta).await;

    let published = bus.published();
    let body: serde_json::Value = serde_json::from_slice(&published[1].payload).unwrap();
    assert!(body["state"]["reported"]["error"].is_string());
}

#[tokio::test]
async fn non_delta_channels_are_logged_and_do_not_republish() {
    let (bus, _rx) = FakeBusClient::new();
    let sync = ShadowSynchronizer::new(Arc::new(bus.clone()), "dev-1", "sensor-config", sensors());
    sync.start().await;

    let accepted = BusMessage {
        topic: "iot/device/dev-1/shadow/name/sensor-config/update/accepted".into(),
        payload: b"{}".to_vec(),
    };
    sync.handle_message(&accepted).await;

    assert_eq!(bus.published().len(), 1);
}
