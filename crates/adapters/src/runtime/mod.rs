// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Runtime Adapter (spec §4.2) — the only component allowed to speak to the
//! local container engine. Modeled on the reference codebase's
//! `AgentAdapter` trait split: one trait, a production implementation, and
//! (behind `test-support`) a fake used by `dsup-engine`'s unit tests.

mod docker;
mod labels;

#[cfg(feature = "test-support")]
mod fake;

pub use docker::DockerRuntimeAdapter;
pub use labels::{managed_label_filter, service_labels, MANAGED_LABEL};

#[cfg(feature = "test-support")]
pub use fake::FakeRuntimeAdapter;

use async_trait::async_trait;
use dsup_core::{App, AppId, Service, ServiceId};
use std::time::Duration;
use thiserror::Error;

/// Default timeout inherited by every Runtime Adapter call that does not
/// override it (SPEC_FULL §4.2: "runtime calls inherit a 60s default").
pub const DEFAULT_RUNTIME_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Debug, Error)]
pub enum RuntimeAdapterError {
    #[error("not found: {0}")]
    NotFound(String),
    #[error("already exists: {0}")]
    AlreadyExists(String),
    #[error("rejected by runtime: {0}")]
    Rejected(String),
    #[error("transport error: {0}")]
    Transport(String),
    #[error("timed out after {0:?}")]
    Timeout(Duration),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerInfo {
    pub container_id: String,
    pub app_id: AppId,
    pub service_id: ServiceId,
    pub status: dsup_core::ServiceStatus,
    pub ip_address: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FullContainerInfo {
    pub info: ContainerInfo,
    pub image_ref: String,
    pub config: dsup_core::ServiceConfig,
}

/// Minimal, strongly-typed surface over the container runtime (spec §4.2).
#[async_trait]
pub trait RuntimeAdapter: Send + Sync {
    async fn list_managed_containers(&self) -> Result<Vec<ContainerInfo>, RuntimeAdapterError>;

    async fn inspect(&self, container_id: &str) -> Result<FullContainerInfo, RuntimeAdapterError>;

    /// Idempotent: progress is discarded, repeated pulls of the same ref
    /// succeed without side effects beyond the first.
    async fn pull_image(&self, image_ref: &str) -> Result<(), RuntimeAdapterError>;

    async fn start_container(
        &self,
        app: &App,
        service: &Service,
    ) -> Result<String, RuntimeAdapterError>;

    /// No-op if the container is already stopped/absent.
    async fn stop_container(&self, container_id: &str) -> Result<(), RuntimeAdapterError>;

    /// No-op (`NotFound` is swallowed) if the container is already gone.
    async fn remove_container(&self, container_id: &str) -> Result<(), RuntimeAdapterError>;

    /// No-op after verifying configuration matches if the network already
    /// exists.
    async fn create_network(&self, app_id: AppId, name: &str) -> Result<(), RuntimeAdapterError>;

    async fn remove_network(&self, app_id: AppId, name: &str) -> Result<(), RuntimeAdapterError>;

    async fn create_volume(&self, app_id: AppId, name: &str) -> Result<(), RuntimeAdapterError>;

    async fn remove_volume(&self, app_id: AppId, name: &str) -> Result<(), RuntimeAdapterError>;
}

/// Translate `ServiceConfig` resource limits into the runtime's native
/// units (spec §4.2: `cpu="500m"` -> 500_000_000 nanocpus,
/// `memory="512Mi"` -> 512*2^20 bytes — already implemented by
/// `dsup_core::app::{CpuLimit, MemoryLimit}` parsing; this module only
/// reads the already-typed limits off `ServiceConfig::resources`).
pub fn scoped_name(app_id: AppId, logical_name: &str) -> String {
    format!("{app_id}_{logical_name}")
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
