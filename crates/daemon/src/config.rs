// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Centralized environment variable access for the daemon binary (spec §6),
//! modeled on the reference codebase's `env.rs` (one function per option,
//! no monolithic config struct parsed up front).

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} is required but not set")]
    Missing(&'static str),
    #[error("failed to read {path}: {source}")]
    ReadCredential {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub fn device_id() -> Result<String, ConfigError> {
    std::env::var("DEVICE_ID").map_err(|_| ConfigError::Missing("DEVICE_ID"))
}

pub fn device_credential() -> Result<String, ConfigError> {
    let path = std::env::var("DEVICE_CREDENTIAL_PATH")
        .map_err(|_| ConfigError::Missing("DEVICE_CREDENTIAL_PATH"))?;
    let path = PathBuf::from(path);
    std::fs::read_to_string(&path)
        .map(|s| s.trim().to_string())
        .map_err(|source| ConfigError::ReadCredential { path, source })
}

pub fn cloud_api_endpoint() -> Result<String, ConfigError> {
    std::env::var("CLOUD_API_ENDPOINT").map_err(|_| ConfigError::Missing("CLOUD_API_ENDPOINT"))
}

pub fn mqtt_broker() -> Option<String> {
    std::env::var("MQTT_BROKER").ok()
}

/// State-store path: `STATE_DB_PATH` > platform data dir > `./state.json`.
pub fn state_db_path() -> PathBuf {
    if let Ok(path) = std::env::var("STATE_DB_PATH") {
        return PathBuf::from(path);
    }
    dirs::data_dir()
        .map(|dir| dir.join("dsup").join("state.json"))
        .unwrap_or_else(|| PathBuf::from("state.json"))
}

pub fn device_api_port() -> Option<u16> {
    std::env::var("DEVICE_API_PORT").ok().and_then(|s| s.parse().ok())
}

pub fn enable_shadow() -> bool {
    env_flag("ENABLE_SHADOW")
}

pub fn enable_sensor_publish() -> bool {
    env_flag("ENABLE_SENSOR_PUBLISH")
}

pub fn enable_job_engine() -> bool {
    env_flag("ENABLE_JOB_ENGINE")
}

fn env_flag(key: &str) -> bool {
    std::env::var(key).is_ok_and(|v| v == "1" || v.eq_ignore_ascii_case("true"))
}

pub fn shadow_name() -> String {
    std::env::var("SHADOW_NAME").unwrap_or_else(|_| "main".to_string())
}

pub fn reconcile_interval() -> Duration {
    duration_ms_env("RECONCILE_INTERVAL", Duration::from_secs(30))
}

pub fn cloud_target_poll_interval() -> Duration {
    duration_ms_env("CLOUD_TARGET_POLL_INTERVAL_MS", Duration::from_secs(30))
}

pub fn cloud_report_interval() -> Duration {
    duration_ms_env("CLOUD_REPORT_INTERVAL_MS", Duration::from_secs(60))
}

pub fn cloud_jobs_polling_interval() -> Duration {
    duration_ms_env("CLOUD_JOBS_POLLING_INTERVAL", Duration::from_secs(30))
}

/// Shutdown grace period before the task set is abandoned (spec §5).
pub fn shutdown_grace_period() -> Duration {
    Duration::from_secs(30)
}

fn duration_ms_env(key: &str, default: Duration) -> Duration {
    std::env::var(key)
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .map(Duration::from_millis)
        .unwrap_or(default)
}

/// Initial sensor set (spec §4.6 supplemental): a JSON array of
/// [`dsup_core::SensorSeedEntry`]. Absent or malformed config starts with an
/// empty sensor set rather than failing startup.
pub fn sensor_publish_config() -> Vec<dsup_core::Sensor> {
    let Ok(raw) = std::env::var("SENSOR_PUBLISH_CONFIG") else {
        return Vec::new();
    };
    match serde_json::from_str::<Vec<dsup_core::SensorSeedEntry>>(&raw) {
        Ok(entries) => entries.into_iter().map(Into::into).collect(),
        Err(err) => {
            tracing::warn!(error = %err, "malformed SENSOR_PUBLISH_CONFIG, starting with no sensors");
            Vec::new()
        }
    }
}

pub fn log_format() -> LogFormat {
    match std::env::var("LOG_FORMAT").as_deref() {
        Ok("json") => LogFormat::Json,
        _ => LogFormat::Pretty,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
}
