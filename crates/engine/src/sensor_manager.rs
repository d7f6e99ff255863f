// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Sensor Manager & Config Handler (spec §4.6): owns the live sensor set,
//! runs one publisher task per sensor, and applies all-or-nothing
//! config-delta validation on behalf of the shadow synchronizer.

use dsup_adapters::{BusClient, SensorSource};
use dsup_core::sensor::MIN_PUBLISH_INTERVAL_MS;
use dsup_core::{validate_publish_interval, Clock, Sensor, SensorConfigEntry, ValidationError};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

pub struct SensorManager<C: Clock> {
    sensors: Mutex<HashMap<String, Sensor>>,
    source: Arc<dyn SensorSource>,
    clock: C,
}

impl<C: Clock> SensorManager<C> {
    pub fn new(source: Arc<dyn SensorSource>, clock: C, seed: Vec<Sensor>) -> Self {
        let sensors = seed.into_iter().map(|s| (s.name.clone(), s)).collect();
        Self {
            sensors: Mutex::new(sensors),
            source,
            clock,
        }
    }

    pub fn sensor(&self, name: &str) -> Option<Sensor> {
        self.sensors.lock().get(name).cloned()
    }

    pub fn enable(&self, name: &str) -> Result<(), ValidationError> {
        self.with_sensor(name, |s| s.enabled = true)
    }

    pub fn disable(&self, name: &str) -> Result<(), ValidationError> {
        self.with_sensor(name, |s| s.enabled = false)
    }

    pub fn update_interval(&self, name: &str, ms: i64) -> Result<(), ValidationError> {
        validate_publish_interval(ms)?;
        let mut sensors = self.sensors.lock();
        match sensors.get_mut(name) {
            Some(sensor) => sensor.update_interval(ms),
            None => Err(ValidationError::UnknownSensor(name.to_string())),
        }
    }

    fn with_sensor(&self, name: &str, apply: impl FnOnce(&mut Sensor)) -> Result<(), ValidationError> {
        let mut sensors = self.sensors.lock();
        match sensors.get_mut(name) {
            Some(sensor) => {
                apply(sensor);
                Ok(())
            }
            None => Err(ValidationError::UnknownSensor(name.to_string())),
        }
    }

    /// Applies a sensor-config shadow delta. Validation happens against the
    /// whole entry set before any sensor is mutated (spec §4.6:
    /// "all-or-nothing for a single delta message").
    pub fn apply_config_delta(&self, delta: &serde_json::Value) -> Result<(), ValidationError> {
        let Some(sensors_value) = delta.get("sensors") else {
            return Ok(());
        };
        let entries: HashMap<String, SensorConfigEntry> =
            serde_json::from_value(sensors_value.clone()).map_err(|_| ValidationError::WrongType {
                field: "sensors".into(),
                expected: "object",
            })?;

        {
            let sensors = self.sensors.lock();
            for (name, entry) in &entries {
                if !sensors.contains_key(name) {
                    return Err(ValidationError::UnknownSensor(name.clone()));
                }
                if let Some(ms) = entry.publish_interval_ms {
                    validate_publish_interval(ms)?;
                }
            }
        }

        let mut sensors = self.sensors.lock();
        for (name, entry) in entries {
            let Some(sensor) = sensors.get_mut(&name) else { continue };
            if let Some(enabled) = entry.enabled {
                sensor.enabled = enabled;
            }
            if let Some(address) = entry.address {
                sensor.address = address;
            }
            if let Some(ms) = entry.publish_interval_ms {
                sensor.publish_interval_ms = ms;
            }
        }
        Ok(())
    }

    /// The full reported document the shadow synchronizer publishes after
    /// every applied delta (spec §4.6: "gather current truth... including
    /// connectivity and metrics").
    pub fn reported_document(&self) -> serde_json::Value {
        let sensors = self.sensors.lock();
        let mut map = serde_json::Map::new();
        for (name, sensor) in sensors.iter() {
            map.insert(
                name.clone(),
                serde_json::json!({
                    "enabled": sensor.enabled,
                    "address": sensor.address,
                    "publishInterval": sensor.publish_interval_ms,
                    "connected": sensor.metrics.connected,
                    "publishCount": sensor.metrics.publish_count,
                    "errorCount": sensor.metrics.error_count,
                    "lastError": sensor.metrics.last_error,
                    "lastPublishTime": sensor.metrics.last_publish_time_ms,
                }),
            );
        }
        serde_json::json!({ "sensors": serde_json::Value::Object(map) })
    }
}

impl<C: Clock> SensorManager<C> {
    /// Spawns one publisher task per registered sensor. Each task rereads
    /// `enabled`/`publishInterval`/`address` from the shared sensor map on
    /// every cycle, so `updateInterval`/`enable`/`disable` take effect on
    /// the task's next tick without a restart (spec §4.6).
    pub fn spawn_publishers(
        self: &Arc<Self>,
        bus: Arc<dyn BusClient>,
        device_id: impl Into<String>,
        shutdown: &CancellationToken,
    ) {
        let device_id = device_id.into();
        let names: Vec<String> = self.sensors.lock().keys().cloned().collect();
        for name in names {
            let manager = self.clone();
            let bus = bus.clone();
            let device_id = device_id.clone();
            let token = shutdown.child_token();
            tokio::spawn(async move { manager.run_publisher(name, bus, device_id, token).await });
        }
    }

    async fn run_publisher(
        &self,
        name: String,
        bus: Arc<dyn BusClient>,
        device_id: String,
        shutdown: CancellationToken,
    ) {
        loop {
            let Some((enabled, interval_ms, address)) = self
                .sensors
                .lock()
                .get(&name)
                .map(|s| (s.enabled, s.publish_interval_ms, s.address.clone()))
            else {
                return;
            };

            if !enabled {
                tokio::select! {
                    _ = shutdown.cancelled() => return,
                    _ = tokio::time::sleep(Duration::from_millis(MIN_PUBLISH_INTERVAL_MS as u64)) => continue,
                }
            }

            tokio::select! {
                _ = shutdown.cancelled() => return,
                _ = tokio::time::sleep(Duration::from_millis(interval_ms.max(MIN_PUBLISH_INTERVAL_MS) as u64)) => {}
            }

            let read = self.source.read_message(&address).await;
            let to_publish = {
                let mut sensors = self.sensors.lock();
                let Some(sensor) = sensors.get_mut(&name) else { return };
                match read {
                    Ok(payload) => {
                        sensor.metrics.connected = true;
                        let topic = format!("iot/device/{device_id}/sensor/{name}");
                        Some((topic, payload))
                    }
                    Err(err) => {
                        sensor.metrics.connected = false;
                        sensor.metrics.error_count += 1;
                        sensor.metrics.last_error = Some(err.to_string());
                        None
                    }
                }
            };

            if let Some((topic, payload)) = to_publish {
                let published = bus.publish(&topic, payload).await;
                let mut sensors = self.sensors.lock();
                let Some(sensor) = sensors.get_mut(&name) else { return };
                match published {
                    Ok(()) => {
                        sensor.metrics.publish_count += 1;
                        sensor.metrics.last_publish_time_ms = Some(self.clock.epoch_ms());
                    }
                    Err(err) => {
                        sensor.metrics.error_count += 1;
                        sensor.metrics.last_error = Some(err.to_string());
                    }
                }
            }
        }
    }
}

#[cfg(test)]
#[path = "sensor_manager_tests.rs"]
mod tests;
