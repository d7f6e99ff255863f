// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use dsup_adapters::{FakeBusClient, FakeSensorSource};
use dsup_core::FakeClock;
use serde_json::json;

fn sensor(name: &str) -> Sensor {
    Sensor {
        name: name.to_string(),
        enabled: true,
        address: format!("/run/sensors/{name}.sock"),
        publish_interval_ms: 1000,
        metrics: Default::default(),
    }
}

fn manager() -> SensorManager<FakeClock> {
    SensorManager::new(
        Arc::new(FakeSensorSource::new()),
        FakeClock::new(),
        vec![sensor("temp"), sensor("humidity")],
    )
}

#[test]
fn update_interval_rejects_out_of_range_values() {
    let mgr = manager();
    let err = mgr.update_interval("temp", 500).unwrap_err();
    assert!(matches!(err, ValidationError::PublishIntervalOutOfRange(500)));
    assert_eq!(mgr.sensor("temp").unwrap().publish_interval_ms, 1000);
}

#[test]
fn update_interval_applies_live() {
    let mgr = manager();
    mgr.update_interval("temp", 5000).unwrap();
    assert_eq!(mgr.sensor("temp").unwrap().publish_interval_ms, 5000);
}

#[test]
fn enable_disable_toggle_unknown_sensor_errors() {
    let mgr = manager();
    let err = mgr.disable("nonexistent").unwrap_err();
    assert!(matches!(err, ValidationError::UnknownSensor(_)));
}

#[test]
fn config_delta_applies_all_entries_when_valid() {
    let mgr = manager();
    let delta = json!({
        "sensors": {
            "temp": { "enabled": false, "publishInterval": 2000 },
            "humidity": { "publishInterval": 10000 },
        }
    });
    mgr.apply_config_delta(&delta).unwrap();

    let temp = mgr.sensor("temp").unwrap();
    assert!(!temp.enabled);
    assert_eq!(temp.publish_interval_ms, 2000);
    assert_eq!(mgr.sensor("humidity").unwrap().publish_interval_ms, 10000);
}

#[test]
fn config_delta_is_all_or_nothing_on_unknown_sensor() {
    let mgr = manager();
    let delta = json!({
        "sensors": {
            "temp": { "enabled": false },
            "ghost": { "enabled": true },
        }
    });
    let err = mgr.apply_config_delta(&delta).unwrap_err();
    assert!(matches!(err, ValidationError::UnknownSensor(_)));
    // `temp` must be untouched since the whole delta was rejected.
    assert!(mgr.sensor("temp").unwrap().enabled);
}

#[test]
fn config_delta_is_all_or_nothing_on_bad_interval() {
    let mgr = manager();
    let delta = json!({
        "sensors": {
            "temp": { "enabled": false },
            "humidity": { "publishInterval": 1 },
        }
    });
    let err = mgr.apply_config_delta(&delta).unwrap_err();
    assert!(matches!(err, ValidationError::PublishIntervalOutOfRange(1)));
    assert!(mgr.sensor("temp").unwrap().enabled);
}

#[test]
fn reported_document_includes_metrics_for_every_sensor() {
    let mgr = manager();
    let doc = mgr.reported_document();
    let sensors = doc["sensors"].as_object().unwrap();
    assert!(sensors.contains_key("temp"));
    assert!(sensors.contains_key("humidity"));
    assert_eq!(sensors["temp"]["connected"], json!(false));
    assert_eq!(sensors["temp"]["publishCount"], json!(0));
}

#[tokio::test(start_paused = true)]
async fn publisher_task_publishes_read_messages_and_updates_metrics() {
    let source = Arc::new(FakeSensorSource::new());
    source.push_message("/run/sensors/temp.sock", b"22.5".to_vec());
    let mgr = Arc::new(SensorManager::new(
        source.clone(),
        FakeClock::new(),
        vec![Sensor {
            publish_interval_ms: 1000,
            ..sensor("temp")
        }],
    ));
    let (bus, _rx) = FakeBusClient::new();
    let bus: Arc<dyn dsup_adapters::BusClient> = Arc::new(bus);
    let shutdown = CancellationToken::new();
    mgr.spawn_publishers(bus.clone(), "device-1", &shutdown);

    tokio::time::advance(Duration::from_millis(1500)).await;
    tokio::task::yield_now().await;

    let temp = mgr.sensor("temp").unwrap();
    assert_eq!(temp.metrics.publish_count, 1);
    assert!(temp.metrics.connected);
    shutdown.cancel();
}
