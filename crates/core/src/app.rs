// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! App/Service/ServiceConfig — the desired shape of a deployable unit.

use crate::error::{PortMappingError, ResourceLimitError};
use crate::health::HealthProbe;
use crate::ids::{AppId, ServiceId};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// A host:container TCP port mapping, e.g. `8080:80`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PortMapping {
    pub host: u16,
    pub container: u16,
}

impl PortMapping {
    pub fn new(host: u16, container: u16) -> Self {
        Self { host, container }
    }
}

impl fmt::Display for PortMapping {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.container)
    }
}

impl std::str::FromStr for PortMapping {
    type Err = PortMappingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (host, container) = s
            .split_once(':')
            .ok_or_else(|| PortMappingError::BadFormat(s.to_string()))?;
        let host: u16 = host
            .parse()
            .map_err(|_| PortMappingError::NotANumber(s.to_string()))?;
        let container: u16 = container
            .parse()
            .map_err(|_| PortMappingError::NotANumber(s.to_string()))?;
        Ok(Self { host, container })
    }
}

impl TryFrom<String> for PortMapping {
    type Error = PortMappingError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<PortMapping> for String {
    fn from(value: PortMapping) -> Self {
        value.to_string()
    }
}

/// A volume mount — either a named runtime volume or a bind mount.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum VolumeMount {
    Named { volume: String, path: String },
    Bind { host: String, container: String },
}

impl fmt::Display for VolumeMount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VolumeMount::Named { volume, path } => write!(f, "{volume}:{path}"),
            VolumeMount::Bind { host, container } => write!(f, "{host}:{container}"),
        }
    }
}

impl std::str::FromStr for VolumeMount {
    type Err = PortMappingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (left, right) = s
            .split_once(':')
            .ok_or_else(|| PortMappingError::BadFormat(s.to_string()))?;
        if left.starts_with('/') {
            Ok(VolumeMount::Bind {
                host: left.to_string(),
                container: right.to_string(),
            })
        } else {
            Ok(VolumeMount::Named {
                volume: left.to_string(),
                path: right.to_string(),
            })
        }
    }
}

impl TryFrom<String> for VolumeMount {
    type Error = PortMappingError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<VolumeMount> for String {
    fn from(value: VolumeMount) -> Self {
        value.to_string()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RestartPolicy {
    No,
    Always,
    OnFailure,
    UnlessStopped,
}

crate::simple_display! {
    RestartPolicy {
        No => "no",
        Always => "always",
        OnFailure => "on-failure",
        UnlessStopped => "unless-stopped",
    }
}

/// CPU limit, normalized to nanocpus (1 full cpu = 1_000_000_000).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CpuLimit {
    pub nanocpus: u64,
}

impl std::str::FromStr for CpuLimit {
    type Err = ResourceLimitError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Err(ResourceLimitError::Empty);
        }
        if let Some(millis) = s.strip_suffix('m') {
            let millis: u64 = millis
                .parse()
                .map_err(|_| ResourceLimitError::InvalidCpu(s.to_string()))?;
            return Ok(Self {
                nanocpus: millis.saturating_mul(1_000_000),
            });
        }
        let cores: f64 = s
            .parse()
            .map_err(|_| ResourceLimitError::InvalidCpu(s.to_string()))?;
        if cores < 0.0 {
            return Err(ResourceLimitError::InvalidCpu(s.to_string()));
        }
        Ok(Self {
            nanocpus: (cores * 1_000_000_000.0).round() as u64,
        })
    }
}

/// Memory limit, normalized to bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MemoryLimit {
    pub bytes: u64,
}

impl std::str::FromStr for MemoryLimit {
    type Err = ResourceLimitError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Err(ResourceLimitError::Empty);
        }
        const UNITS: &[(&str, u64)] = &[
            ("Gi", 1024 * 1024 * 1024),
            ("Mi", 1024 * 1024),
            ("Ki", 1024),
            ("G", 1_000_000_000),
            ("M", 1_000_000),
            ("K", 1_000),
        ];
        for (suffix, multiplier) in UNITS {
            if let Some(amount) = s.strip_suffix(suffix) {
                let amount: u64 = amount
                    .parse()
                    .map_err(|_| ResourceLimitError::InvalidMemory(s.to_string()))?;
                return Ok(Self {
                    bytes: amount.saturating_mul(*multiplier),
                });
            }
        }
        let bytes: u64 = s
            .parse()
            .map_err(|_| ResourceLimitError::InvalidMemory(s.to_string()))?;
        Ok(Self { bytes })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceLimits {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cpu: Option<CpuLimit>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub memory: Option<MemoryLimit>,
}

/// The three probe roles a service may declare.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProbeSet {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub liveness: Option<HealthProbe>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub readiness: Option<HealthProbe>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub startup: Option<HealthProbe>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceConfig {
    pub image: String,
    #[serde(default)]
    pub ports: Vec<PortMapping>,
    #[serde(default)]
    pub env: BTreeMap<String, String>,
    #[serde(default)]
    pub volumes: Vec<VolumeMount>,
    #[serde(default)]
    pub networks: BTreeSet<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub restart_policy: Option<RestartPolicy>,
    #[serde(default)]
    pub labels: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resources: Option<ResourceLimits>,
    #[serde(default)]
    pub probes: ProbeSet,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Service {
    pub id: ServiceId,
    pub name: String,
    pub image_ref: String,
    pub config: ServiceConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct App {
    pub id: AppId,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uuid: Option<String>,
    pub services: Vec<Service>,
}

impl App {
    pub fn service(&self, id: ServiceId) -> Option<&Service> {
        self.services.iter().find(|s| s.id == id)
    }
}

crate::builder! {
    pub struct ServiceBuilder => Service {
        into {
            name: String = "svc",
            image_ref: String = "alpine:latest",
        }
        set { id: ServiceId = ServiceId::new(1) }
        computed { config: ServiceConfig = ServiceConfig { image: "alpine:latest".into(), ..Default::default() } }
    }
}

crate::builder! {
    pub struct AppBuilder => App {
        into { name: String = "app" }
        set { id: AppId = AppId::new(1) }
        option { uuid: String = None }
        computed { services: Vec<Service> = Vec::new() }
    }
}

#[cfg(test)]
#[path = "app_tests.rs"]
mod tests;
