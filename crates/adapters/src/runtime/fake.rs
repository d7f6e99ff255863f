// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-memory [`RuntimeAdapter`] used by `dsup-engine`'s reconciler tests.

use super::{scoped_name, ContainerInfo, FullContainerInfo, RuntimeAdapter, RuntimeAdapterError};
use crate::probe::{ExecRunner, ProbeError};
use async_trait::async_trait;
use dsup_core::{App, AppId, Service, ServiceStatus};
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

#[derive(Default)]
struct Inner {
    next_id: u64,
    containers: HashMap<String, FullContainerInfo>,
    networks: HashSet<String>,
    volumes: HashSet<String>,
    /// image refs that should fail `pull_image` (simulating a bad image).
    failing_images: HashSet<String>,
    /// container id -> exit code returned by `exec`, default 0.
    exec_exit_codes: HashMap<String, i64>,
}

/// A fully in-process fake of the container runtime, gated behind
/// `test-support` the same way the reference codebase gates its fake
/// adapters.
#[derive(Clone, Default)]
pub struct FakeRuntimeAdapter {
    inner: Arc<Mutex<Inner>>,
}

impl FakeRuntimeAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_image_pull(&self, image_ref: impl Into<String>) {
        self.inner.lock().failing_images.insert(image_ref.into());
    }

    pub fn container_count(&self) -> usize {
        self.inner.lock().containers.len()
    }

    pub fn set_exec_exit_code(&self, container_id: impl Into<String>, code: i64) {
        self.inner.lock().exec_exit_codes.insert(container_id.into(), code);
    }
}

#[async_trait]
impl ExecRunner for FakeRuntimeAdapter {
    async fn exec(&self, container_id: &str, _command: &[String]) -> Result<i64, ProbeError> {
        Ok(self
            .inner
            .lock()
            .exec_exit_codes
            .get(container_id)
            .copied()
            .unwrap_or(0))
    }
}

#[async_trait]
impl RuntimeAdapter for FakeRuntimeAdapter {
    async fn list_managed_containers(&self) -> Result<Vec<ContainerInfo>, RuntimeAdapterError> {
        Ok(self
            .inner
            .lock()
            .containers
            .values()
            .map(|f| f.info.clone())
            .collect())
    }

    async fn inspect(&self, container_id: &str) -> Result<FullContainerInfo, RuntimeAdapterError> {
        self.inner
            .lock()
            .containers
            .get(container_id)
            .cloned()
            .ok_or_else(|| RuntimeAdapterError::NotFound(container_id.to_string()))
    }

    async fn pull_image(&self, image_ref: &str) -> Result<(), RuntimeAdapterError> {
        if self.inner.lock().failing_images.contains(image_ref) {
            return Err(RuntimeAdapterError::Rejected(format!(
                "manifest for {image_ref} not found"
            )));
        }
        Ok(())
    }

    async fn start_container(
        &self,
        app: &App,
        service: &Service,
    ) -> Result<String, RuntimeAdapterError> {
        let mut inner = self.inner.lock();
        inner.next_id += 1;
        let container_id = format!("fake-{}", inner.next_id);
        inner.containers.insert(
            container_id.clone(),
            FullContainerInfo {
                info: ContainerInfo {
                    container_id: container_id.clone(),
                    app_id: app.id,
                    service_id: service.id,
                    status: ServiceStatus::Running,
                    ip_address: Some("127.0.0.1".to_string()),
                },
                image_ref: service.image_ref.clone(),
                config: service.config.clone(),
            },
        );
        Ok(container_id)
    }

    async fn stop_container(&self, container_id: &str) -> Result<(), RuntimeAdapterError> {
        if let Some(c) = self.inner.lock().containers.get_mut(container_id) {
            c.info.status = ServiceStatus::Stopped;
        }
        Ok(())
    }

    async fn remove_container(&self, container_id: &str) -> Result<(), RuntimeAdapterError> {
        self.inner.lock().containers.remove(container_id);
        Ok(())
    }

    async fn create_network(&self, app_id: AppId, name: &str) -> Result<(), RuntimeAdapterError> {
        self.inner.lock().networks.insert(scoped_name(app_id, name));
        Ok(())
    }

    async fn remove_network(&self, app_id: AppId, name: &str) -> Result<(), RuntimeAdapterError> {
        self.inner.lock().networks.remove(&scoped_name(app_id, name));
        Ok(())
    }

    async fn create_volume(&self, app_id: AppId, name: &str) -> Result<(), RuntimeAdapterError> {
        self.inner.lock().volumes.insert(scoped_name(app_id, name));
        Ok(())
    }

    async fn remove_volume(&self, app_id: AppId, name: &str) -> Result<(), RuntimeAdapterError> {
        self.inner.lock().volumes.remove(&scoped_name(app_id, name));
        Ok(())
    }
}

#[cfg(test)]
#[path = "fake_tests.rs"]
mod tests;
