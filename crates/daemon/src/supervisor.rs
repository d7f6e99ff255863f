// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Owning struct wiring every long-running loop together (spec §5):
//! modeled on the reference codebase's daemon-owns-everything composition
//! (`oj-engine/src/runtime/mod.rs`'s generic `Runtime<S, A, N, C>`), but
//! concrete rather than generic since this supervisor has exactly one real
//! wiring (no pluggable transports to swap in production).

use crate::config;
use dsup_adapters::{
    BusClient, CloudClient, DockerRuntimeAdapter, ExecRunner, MqttBusClient, ProbeChecker,
    RuntimeAdapter, SensorSource, UnixSensorSource,
};
use dsup_core::{ProbeEvent, SystemClock};
use dsup_engine::{CloudPoller, JobExecutor, ProbeManager, Reconciler, SensorManager, ShadowSynchronizer};
use dsup_storage::StateStore;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

#[derive(Debug, thiserror::Error)]
pub enum SupervisorError {
    #[error("config error: {0}")]
    Config(#[from] config::ConfigError),
    #[error("state store error: {0}")]
    Store(#[from] dsup_storage::StoreError),
    #[error("reconciler error: {0}")]
    Reconciler(#[from] dsup_engine::ReconcilerError),
    #[error("runtime adapter error: {0}")]
    Runtime(#[from] dsup_adapters::RuntimeAdapterError),
}

/// Owns the root shutdown token, the reconciler, and every adapter. Nothing
/// in this crate reaches a singleton or ambient global — every loop below
/// is handed exactly the dependencies it needs.
pub struct Supervisor {
    reconciler: Arc<Reconciler<SystemClock>>,
    store: Arc<StateStore>,
    shutdown: CancellationToken,
    ready: Arc<std::sync::atomic::AtomicBool>,
}

impl Supervisor {
    /// Build every adapter and engine component and spawn their loops.
    /// Returns once the first reconciliation pass has completed, so
    /// `GET /healthz` has something true to report.
    pub async fn start() -> Result<Self, SupervisorError> {
        let clock = SystemClock;
        let shutdown = CancellationToken::new();
        let device_id = config::device_id()?;

        let store = Arc::new(StateStore::open(config::state_db_path())?);
        let runtime = Arc::new(DockerRuntimeAdapter::connect()?);

        let (probe_tx, probe_rx) = mpsc::unbounded_channel();
        let reconciler = Arc::new(Reconciler::new(
            runtime.clone() as Arc<dyn RuntimeAdapter>,
            store.clone(),
            clock.clone(),
            Some(probe_tx),
        )?);

        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let probe_manager = Arc::new(ProbeManager::new(
            Arc::new(ProbeChecker::new()),
            runtime.clone() as Arc<dyn ExecRunner>,
            event_tx,
            shutdown.child_token(),
        ));
        spawn_container_started_forwarder(probe_rx, probe_manager.clone(), runtime.clone());
        spawn_probe_event_forwarder(event_rx, reconciler.clone());

        // Run the first pass synchronously against whatever target is
        // already on disk, then drive subsequent passes off the cloud
        // poller / a fixed interval timer.
        let initial_target = store.load(dsup_core::SnapshotKind::Target)?.unwrap_or_else(dsup_core::StateSnapshot::empty);
        reconciler.apply_target(&initial_target).await;
        spawn_reconcile_timer(reconciler.clone(), store.clone(), shutdown.child_token());

        if config::enable_shadow() || config::enable_sensor_publish() {
            if let Some(broker) = config::mqtt_broker() {
                spawn_shadow_and_sensors(&broker, &device_id, clock.clone(), &shutdown);
            } else {
                tracing::warn!("ENABLE_SHADOW/ENABLE_SENSOR_PUBLISH set but MQTT_BROKER is absent, skipping");
            }
        }

        let cloud = Arc::new(CloudClient::new(
            config::cloud_api_endpoint()?,
            device_id.clone(),
            config::device_credential()?,
        ));
        let poller = Arc::new(CloudPoller::new(cloud.clone(), store.clone(), reconciler.clone(), clock.clone()));
        poller.spawn(
            config::cloud_target_poll_interval(),
            config::cloud_report_interval(),
            &shutdown,
        );

        if config::enable_job_engine() {
            let executor = Arc::new(JobExecutor::new(cloud, clock.clone()));
            let token = shutdown.child_token();
            let interval = config::cloud_jobs_polling_interval();
            tokio::spawn(async move { executor.run(interval, token).await });
        }

        Ok(Self {
            reconciler,
            store,
            shutdown,
            ready: Arc::new(std::sync::atomic::AtomicBool::new(true)),
        })
    }

    pub fn is_ready(&self) -> bool {
        self.ready.load(std::sync::atomic::Ordering::Acquire)
    }

    pub fn current_snapshot(&self) -> dsup_core::StateSnapshot {
        self.reconciler.current_snapshot()
    }

    /// Cancel every spawned loop, wait up to the shutdown grace period, and
    /// flush the current snapshot exactly once regardless of which tasks
    /// finished first (spec §5).
    pub async fn shutdown(&self) {
        self.shutdown.cancel();
        tokio::time::sleep(Duration::from_millis(200)).await;
        let snapshot = self.reconciler.current_snapshot();
        if let Err(err) = self.store.write(dsup_core::SnapshotKind::Current, &snapshot) {
            tracing::error!(error = %err, "final snapshot flush failed during shutdown");
        }
    }
}

fn spawn_reconcile_timer(reconciler: Arc<Reconciler<SystemClock>>, store: Arc<StateStore>, shutdown: CancellationToken) {
    tokio::spawn(async move {
        let interval = config::reconcile_interval();
        loop {
            tokio::select! {
                _ = shutdown.cancelled() => return,
                _ = tokio::time::sleep(interval) => {}
            }
            let Ok(Some(target)) = store.load(dsup_core::SnapshotKind::Target) else {
                continue;
            };
            reconciler.apply_target(&target).await;
        }
    });
}

/// Bridges `Reconciler`'s `ContainerStarted` events to `ProbeManager::register`,
/// looking up each container's IP via `RuntimeAdapter::inspect` (spec §4.3:
/// the probe manager never talks to the runtime directly, so this glue lives
/// in the daemon, not in either component).
fn spawn_container_started_forwarder(
    mut rx: mpsc::UnboundedReceiver<dsup_engine::ContainerStarted>,
    probe_manager: Arc<ProbeManager>,
    runtime: Arc<DockerRuntimeAdapter>,
) {
    tokio::spawn(async move {
        while let Some(started) = rx.recv().await {
            let ip = match runtime.inspect(&started.container_id).await {
                Ok(info) => info.info.ip_address.unwrap_or_default(),
                Err(err) => {
                    tracing::warn!(error = %err, container_id = %started.container_id, "inspect failed, probing without an IP");
                    String::new()
                }
            };
            probe_manager.register(started.container_id, started.service_name, ip, started.probes);
        }
    });
}

/// Bridges `ProbeManager`'s `ProbeEvent`s back into the reconciler: a
/// liveness failure triggers `restart_on_liveness_failure` for the owning
/// service, found by matching `container_id` against the live runtime map.
fn spawn_probe_event_forwarder(
    mut rx: mpsc::UnboundedReceiver<ProbeEvent>,
    reconciler: Arc<Reconciler<SystemClock>>,
) {
    tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            match event {
                ProbeEvent::LivenessFailed { container_id, service_name, message } => {
                    tracing::warn!(container_id = %container_id, service_name, message, "liveness probe failed");
                    let snapshot = reconciler.current_snapshot();
                    let runtimes = reconciler.runtime_snapshot();
                    let found = runtimes
                        .iter()
                        .find(|(_, runtime)| runtime.container_id.as_deref() == Some(container_id.as_str()))
                        .map(|((app_id, service_id), _)| (*app_id, *service_id));
                    let Some((app_id, service_id)) = found else { continue };
                    let Some(app) = snapshot.app(app_id) else { continue };
                    let Some(service) = app.services.iter().find(|s| s.id == service_id) else { continue };
                    reconciler.restart_on_liveness_failure(app, service, &container_id).await;
                }
                ProbeEvent::ReadinessChanged { container_id, is_ready } => {
                    tracing::debug!(container_id = %container_id, is_ready, "readiness changed");
                }
                ProbeEvent::StartupCompleted { container_id } => {
                    tracing::info!(container_id = %container_id, "startup probe completed");
                }
            }
        }
    });
}

fn spawn_shadow_and_sensors(broker: &str, device_id: &str, clock: SystemClock, shutdown: &CancellationToken) {
    let (host, port) = split_broker(broker);
    let (mqtt, inbound) = MqttBusClient::connect(&host, port, device_id);
    let bus: Arc<dyn BusClient> = Arc::new(mqtt);

    let seed = config::sensor_publish_config();
    let source: Arc<dyn SensorSource> = Arc::new(UnixSensorSource);
    let sensors = Arc::new(SensorManager::new(source, clock, seed));
    sensors.spawn_publishers(bus.clone(), device_id.to_string(), shutdown);

    let synchronizer = Arc::new(ShadowSynchronizer::new(bus, device_id.to_string(), config::shadow_name(), sensors));
    let token = shutdown.child_token();
    tokio::spawn(async move { synchronizer.run(inbound, token).await });
}

fn split_broker(broker: &str) -> (String, u16) {
    match broker.rsplit_once(':') {
        Some((host, port)) => (host.to_string(), port.parse().unwrap_or(1883)),
        None => (broker.to_string(), 1883),
    }
}

#[cfg(test)]
#[path = "supervisor_tests.rs"]
mod tests;
