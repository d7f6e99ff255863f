// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Sensor lifecycle model (spec §4.6).

use crate::error::ValidationError;
use serde::{Deserialize, Serialize};

pub const MIN_PUBLISH_INTERVAL_MS: i64 = 1000;
pub const MAX_PUBLISH_INTERVAL_MS: i64 = 3_600_000;

pub fn validate_publish_interval(ms: i64) -> Result<(), ValidationError> {
    if (MIN_PUBLISH_INTERVAL_MS..=MAX_PUBLISH_INTERVAL_MS).contains(&ms) {
        Ok(())
    } else {
        Err(ValidationError::PublishIntervalOutOfRange(ms))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SensorMetrics {
    pub publish_count: u64,
    pub error_count: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_publish_time_ms: Option<u64>,
    pub connected: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sensor {
    pub name: String,
    pub enabled: bool,
    pub address: String,
    pub publish_interval_ms: i64,
    #[serde(default)]
    pub metrics: SensorMetrics,
}

impl Sensor {
    pub fn update_interval(&mut self, ms: i64) -> Result<(), ValidationError> {
        validate_publish_interval(ms)?;
        self.publish_interval_ms = ms;
        Ok(())
    }
}

/// The shape `SENSOR_PUBLISH_CONFIG` (spec §6 / SPEC_FULL §4.6) seeds at
/// startup, and also the shape of a single entry inside a sensor-config
/// delta payload.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SensorConfigEntry {
    #[serde(default)]
    pub enabled: Option<bool>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default, rename = "publishInterval")]
    pub publish_interval_ms: Option<i64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SensorSeedEntry {
    pub name: String,
    pub enabled: bool,
    pub address: String,
    #[serde(rename = "publish_interval_ms")]
    pub publish_interval_ms: i64,
}

impl From<SensorSeedEntry> for Sensor {
    fn from(entry: SensorSeedEntry) -> Self {
        Sensor {
            name: entry.name,
            enabled: entry.enabled,
            address: entry.address,
            publish_interval_ms: entry.publish_interval_ms,
            metrics: SensorMetrics::default(),
        }
    }
}

crate::builder! {
    pub struct SensorBuilder => Sensor {
        into {
            name: String = "temp-sensor",
            address: String = "/run/sensors/temp.sock",
        }
        set {
            enabled: bool = true,
            publish_interval_ms: i64 = 30_000,
        }
        computed { metrics: SensorMetrics = SensorMetrics::default() }
    }
}

#[cfg(test)]
#[path = "sensor_tests.rs"]
mod tests;
