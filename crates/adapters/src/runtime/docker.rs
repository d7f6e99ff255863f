// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Production [`RuntimeAdapter`] talking to the local Docker Engine API
//! over its Unix socket via `bollard`, rather than shelling out to the
//! `docker` CLI the way the reference codebase's Docker adapter does — this
//! spec calls for a strongly-typed client surface (DESIGN.md).

use super::labels::{managed_label_filter, service_labels, APP_ID_LABEL, SERVICE_ID_LABEL};
use super::{scoped_name, ContainerInfo, FullContainerInfo, RuntimeAdapter, RuntimeAdapterError};
use crate::probe::{ExecRunner, ProbeError};
use async_trait::async_trait;
use bollard::container::{
    Config as ContainerConfig, CreateContainerOptions, ListContainersOptions,
    RemoveContainerOptions, StopContainerOptions,
};
use bollard::errors::Error as BollardError;
use bollard::image::CreateImageOptions;
use bollard::network::CreateNetworkOptions;
use bollard::volume::CreateVolumeOptions;
use bollard::Docker;
use dsup_core::{App, AppId, Service, ServiceStatus};
use futures_util::stream::StreamExt;
use std::collections::HashMap;

pub struct DockerRuntimeAdapter {
    docker: Docker,
}

impl DockerRuntimeAdapter {
    pub fn connect() -> Result<Self, RuntimeAdapterError> {
        let docker = Docker::connect_with_local_defaults()
            .map_err(|e| RuntimeAdapterError::Transport(e.to_string()))?;
        Ok(Self { docker })
    }
}

fn map_err(err: BollardError) -> RuntimeAdapterError {
    match &err {
        BollardError::DockerResponseServerError { status_code, .. } if *status_code == 404 => {
            RuntimeAdapterError::NotFound(err.to_string())
        }
        BollardError::DockerResponseServerError { status_code, .. } if *status_code == 409 => {
            RuntimeAdapterError::AlreadyExists(err.to_string())
        }
        _ => RuntimeAdapterError::Transport(err.to_string()),
    }
}

fn parse_label_id<T: From<i64>>(labels: &HashMap<String, String>, key: &str) -> Option<T> {
    labels.get(key)?.parse::<i64>().ok().map(T::from)
}

fn status_from_state(state: Option<&str>) -> ServiceStatus {
    match state {
        Some("running") => ServiceStatus::Running,
        Some("exited") => ServiceStatus::Exited,
        Some("dead") => ServiceStatus::Dead,
        Some("created") => ServiceStatus::Pending,
        _ => ServiceStatus::Stopped,
    }
}

#[async_trait]
impl RuntimeAdapter for DockerRuntimeAdapter {
    async fn list_managed_containers(&self) -> Result<Vec<ContainerInfo>, RuntimeAdapterError> {
        let options = ListContainersOptions {
            all: true,
            filters: managed_label_filter(),
            ..Default::default()
        };
        let containers = self
            .docker
            .list_containers(Some(options))
            .await
            .map_err(map_err)?;

        let mut out = Vec::new();
        for c in containers {
            let labels = c.labels.unwrap_or_default();
            let (Some(app_id), Some(service_id)) = (
                parse_label_id(&labels, APP_ID_LABEL),
                parse_label_id(&labels, SERVICE_ID_LABEL),
            ) else {
                // Label mismatch on an otherwise-managed container: treat as
                // foreign rather than a fatal error (spec §7 runtime
                // invariant violation policy).
                continue;
            };
            out.push(ContainerInfo {
                container_id: c.id.unwrap_or_default(),
                app_id,
                service_id,
                status: status_from_state(c.state.as_deref()),
                ip_address: None,
            });
        }
        Ok(out)
    }

    async fn inspect(&self, container_id: &str) -> Result<FullContainerInfo, RuntimeAdapterError> {
        let details = self
            .docker
            .inspect_container(container_id, None)
            .await
            .map_err(map_err)?;

        let config = details.config.clone().unwrap_or_default();
        let labels = config.labels.clone().unwrap_or_default();
        let (Some(app_id), Some(service_id)) = (
            parse_label_id(&labels, APP_ID_LABEL),
            parse_label_id(&labels, SERVICE_ID_LABEL),
        ) else {
            return Err(RuntimeAdapterError::Rejected(format!(
                "container {container_id} is missing management labels"
            )));
        };

        let status = details
            .state
            .as_ref()
            .and_then(|s| s.status.as_ref())
            .map(|s| status_from_state(Some(&s.to_string().to_lowercase())))
            .unwrap_or(ServiceStatus::Pending);

        Ok(FullContainerInfo {
            info: ContainerInfo {
                container_id: container_id.to_string(),
                app_id,
                service_id,
                status,
                ip_address: details
                    .network_settings
                    .and_then(|n| n.ip_address)
                    .filter(|ip| !ip.is_empty()),
            },
            image_ref: config.image.unwrap_or_default(),
            config: dsup_core::ServiceConfig::default(),
        })
    }

    async fn pull_image(&self, image_ref: &str) -> Result<(), RuntimeAdapterError> {
        let options = CreateImageOptions {
            from_image: image_ref,
            ..Default::default()
        };
        let mut stream = self.docker.create_image(Some(options), None, None);
        while let Some(progress) = stream.next().await {
            // Progress is discarded (spec §4.2: idempotent, progress
            // discarded); only the terminal error matters.
            progress.map_err(map_err)?;
        }
        Ok(())
    }

    async fn start_container(
        &self,
        app: &App,
        service: &Service,
    ) -> Result<String, RuntimeAdapterError> {
        let labels = service_labels(app, service);
        let name = format!("{}_{}", app.id, service.name);

        let port_bindings = if service.config.ports.is_empty() {
            None
        } else {
            let mut map: HashMap<String, Option<Vec<bollard::models::PortBinding>>> =
                HashMap::new();
            for port in &service.config.ports {
                map.insert(
                    format!("{}/tcp", port.container),
                    Some(vec![bollard::models::PortBinding {
                        host_ip: None,
                        host_port: Some(port.host.to_string()),
                    }]),
                );
            }
            Some(map)
        };

        let networks = service
            .config
            .networks
            .iter()
            .map(|n| scoped_name(app.id, n))
            .collect::<Vec<_>>();

        let host_config = bollard::models::HostConfig {
            port_bindings,
            binds: Some(
                service
                    .config
                    .volumes
                    .iter()
                    .map(|v| {
                        let scoped = match v {
                            dsup_core::VolumeMount::Named { volume, path } => {
                                format!("{}:{path}", scoped_name(app.id, volume))
                            }
                            dsup_core::VolumeMount::Bind { host, container } => {
                                format!("{host}:{container}")
                            }
                        };
                        scoped
                    })
                    .collect(),
            ),
            nano_cpus: service
                .config
                .resources
                .as_ref()
                .and_then(|r| r.cpu)
                .map(|c| c.nanocpus as i64),
            memory: service
                .config
                .resources
                .as_ref()
                .and_then(|r| r.memory)
                .map(|m| m.bytes as i64),
            network_mode: networks.first().cloned(),
            ..Default::default()
        };

        let env = service
            .config
            .env
            .iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect::<Vec<_>>();

        let config = ContainerConfig {
            image: Some(service.config.image.clone()),
            env: Some(env),
            labels: Some(labels),
            host_config: Some(host_config),
            ..Default::default()
        };

        let created = self
            .docker
            .create_container(Some(CreateContainerOptions { name: name.as_str(), platform: None }), config)
            .await
            .map_err(map_err)?;

        self.docker
            .start_container::<String>(&created.id, None)
            .await
            .map_err(map_err)?;

        Ok(created.id)
    }

    async fn stop_container(&self, container_id: &str) -> Result<(), RuntimeAdapterError> {
        match self
            .docker
            .stop_container(container_id, Some(StopContainerOptions { t: 10 }))
            .await
        {
            Ok(()) => Ok(()),
            Err(e) => match map_err(e) {
                RuntimeAdapterError::NotFound(_) => Ok(()),
                other => Err(other),
            },
        }
    }

    async fn remove_container(&self, container_id: &str) -> Result<(), RuntimeAdapterError> {
        match self
            .docker
            .remove_container(
                container_id,
                Some(RemoveContainerOptions { force: true, ..Default::default() }),
            )
            .await
        {
            Ok(()) => Ok(()),
            Err(e) => match map_err(e) {
                RuntimeAdapterError::NotFound(_) => Ok(()),
                other => Err(other),
            },
        }
    }

    async fn create_network(&self, app_id: AppId, name: &str) -> Result<(), RuntimeAdapterError> {
        let scoped = scoped_name(app_id, name);
        match self
            .docker
            .create_network(CreateNetworkOptions {
                name: scoped.as_str(),
                ..Default::default()
            })
            .await
        {
            Ok(_) => Ok(()),
            Err(e) => match map_err(e) {
                RuntimeAdapterError::AlreadyExists(_) => Ok(()),
                other => Err(other),
            },
        }
    }

    async fn remove_network(&self, app_id: AppId, name: &str) -> Result<(), RuntimeAdapterError> {
        let scoped = scoped_name(app_id, name);
        match self.docker.remove_network(&scoped).await {
            Ok(()) => Ok(()),
            Err(e) => match map_err(e) {
                RuntimeAdapterError::NotFound(_) => Ok(()),
                other => Err(other),
            },
        }
    }

    async fn create_volume(&self, app_id: AppId, name: &str) -> Result<(), RuntimeAdapterError> {
        let scoped = scoped_name(app_id, name);
        match self
            .docker
            .create_volume(CreateVolumeOptions {
                name: scoped.as_str(),
                ..Default::default()
            })
            .await
        {
            Ok(_) => Ok(()),
            Err(e) => match map_err(e) {
                RuntimeAdapterError::AlreadyExists(_) => Ok(()),
                other => Err(other),
            },
        }
    }

    async fn remove_volume(&self, app_id: AppId, name: &str) -> Result<(), RuntimeAdapterError> {
        let scoped = scoped_name(app_id, name);
        match self.docker.remove_volume(&scoped, None).await {
            Ok(()) => Ok(()),
            Err(e) => match map_err(e) {
                RuntimeAdapterError::NotFound(_) => Ok(()),
                other => Err(other),
            },
        }
    }
}

/// Backs `exec` health probes (spec §4.3) — the only other runtime
/// operation the probe manager needs, kept off the main `RuntimeAdapter`
/// trait since the probe checker takes an `&dyn ExecRunner` rather than the
/// full adapter surface.
#[async_trait]
impl ExecRunner for DockerRuntimeAdapter {
    async fn exec(&self, container_id: &str, command: &[String]) -> Result<i64, ProbeError> {
        use bollard::exec::{CreateExecOptions, StartExecResults};

        let exec = self
            .docker
            .create_exec(
                container_id,
                CreateExecOptions {
                    cmd: Some(command.to_vec()),
                    attach_stdout: Some(true),
                    attach_stderr: Some(true),
                    ..Default::default()
                },
            )
            .await
            .map_err(|e| ProbeError::Transport(e.to_string()))?;

        if let StartExecResults::Attached { mut output, .. } = self
            .docker
            .start_exec(&exec.id, None)
            .await
            .map_err(|e| ProbeError::Transport(e.to_string()))?
        {
            while output.next().await.is_some() {}
        }

        let inspected = self
            .docker
            .inspect_exec(&exec.id)
            .await
            .map_err(|e| ProbeError::Transport(e.to_string()))?;
        Ok(inspected.exit_code.unwrap_or(-1))
    }
}
