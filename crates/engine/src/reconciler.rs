// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Reconciler (spec §4.1): drives `diff` -> ordered `Step`s -> execution
//! against the `RuntimeAdapter`, with per-step retry gating and
//! partial-failure tolerance. Execution shape (elapsed-time tracing per
//! step, `execute`/`execute_all` split, "record and continue" on failure)
//! is modeled on the reference codebase's `Executor::execute`/`execute_all`
//! (`oj-engine/src/executor.rs`).

use crate::diff::{diff, RuntimeMap};
use dsup_adapters::{RuntimeAdapter, RuntimeAdapterError};
use dsup_core::{
    AppId, Clock, ErrorKind, ErrorRecord, ProbeSet, RetryTable, Service, ServiceId,
    ServiceStatus, StateSnapshot, Step,
};
use dsup_storage::StateStore;
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReconcilerError {
    #[error("state store error: {0}")]
    Store(#[from] dsup_storage::StoreError),
}

/// Emitted once a container successfully starts, so the probe manager can
/// register its liveness/readiness/startup checks without the reconciler
/// depending on the probe manager directly.
#[derive(Debug, Clone)]
pub struct ContainerStarted {
    pub app_id: AppId,
    pub service_id: ServiceId,
    pub service_name: String,
    pub container_id: String,
    pub probes: ProbeSet,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcileSummary {
    pub steps_executed: usize,
    pub steps_failed: usize,
    pub current_persisted: bool,
    /// `true` if a reconciliation pass was already in flight and this
    /// trigger was coalesced away (spec §5: "concurrent triggers coalesce").
    pub skipped: bool,
}

pub struct Reconciler<C: Clock> {
    runtime: Arc<dyn RuntimeAdapter>,
    store: Arc<StateStore>,
    clock: C,
    retries: RetryTable<C>,
    current: Mutex<StateSnapshot>,
    runtimes: Mutex<RuntimeMap>,
    inflight: tokio::sync::Mutex<()>,
    probe_tx: Option<tokio::sync::mpsc::UnboundedSender<ContainerStarted>>,
}

impl<C: Clock> Reconciler<C> {
    pub fn new(
        runtime: Arc<dyn RuntimeAdapter>,
        store: Arc<StateStore>,
        clock: C,
        probe_tx: Option<tokio::sync::mpsc::UnboundedSender<ContainerStarted>>,
    ) -> Result<Self, ReconcilerError> {
        let current = store
            .load(dsup_core::SnapshotKind::Current)?
            .unwrap_or_else(StateSnapshot::empty);
        let retries = RetryTable::new(clock.clone());
        Ok(Self {
            runtime,
            store,
            clock,
            retries,
            current: Mutex::new(current),
            runtimes: Mutex::new(RuntimeMap::new()),
            inflight: tokio::sync::Mutex::new(()),
            probe_tx,
        })
    }

    pub fn current_snapshot(&self) -> StateSnapshot {
        self.current.lock().clone()
    }

    /// Per-service runtime annotations (status/error/container id), used by
    /// the cloud poller to build the condensed current-state report
    /// (spec §4.7).
    pub fn runtime_snapshot(&self) -> RuntimeMap {
        self.runtimes.lock().clone()
    }

    /// Run one reconciliation pass against `target`. No-op (returns
    /// `skipped: true`) if a pass is already running (spec Invariant 4).
    pub async fn apply_target(&self, target: &StateSnapshot) -> ReconcileSummary {
        let Ok(_guard) = self.inflight.try_lock() else {
            return ReconcileSummary {
                skipped: true,
                ..Default::default()
            };
        };

        let (steps, image_owners) = {
            let current = self.current.lock();
            let runtimes = self.runtimes.lock();
            let steps = diff(&current, target, &runtimes);
            let image_owners = image_owners_for(&steps);
            (steps, image_owners)
        };

        let mut executed = 0usize;
        let mut failed = 0usize;
        let mut skip_services: HashSet<(AppId, ServiceId)> = HashSet::new();

        for step in &steps {
            if let Step::StartContainer { app_id, service } = step {
                if skip_services.contains(&(*app_id, service.id)) {
                    tracing::warn!(
                        app_id = %app_id,
                        service_id = %service.id,
                        "skipping start_container: dependent download_image failed"
                    );
                    continue;
                }
            }

            let retry_key = self.resolve_app_id(step).and_then(|id| step.retry_key(id));
            if let Some(key) = &retry_key {
                if self.retries.is_gated(key) {
                    tracing::debug!(key, "step retry-gated, skipping this pass");
                    continue;
                }
            }

            let start = std::time::Instant::now();
            let result = self.execute_step(step, target).await;
            let elapsed_ms = start.elapsed().as_millis() as u64;
            executed += 1;

            match result {
                Ok(()) => {
                    if let Some(key) = &retry_key {
                        self.retries.clear(key);
                    }
                    tracing::info!(step = step.name(), elapsed_ms, "step succeeded");
                }
                Err(err) => {
                    failed += 1;
                    tracing::error!(step = step.name(), error = %err, elapsed_ms, "step failed");
                    if let Some(key) = &retry_key {
                        self.retries.record_failure(key, err.to_string());
                    }
                    self.classify_and_record(step, &err, &image_owners, &mut skip_services);
                }
            }
        }

        let snapshot = self.current.lock().clone();
        let persisted = self.store.write(dsup_core::SnapshotKind::Current, &snapshot).unwrap_or(false);

        ReconcileSummary {
            steps_executed: executed,
            steps_failed: failed,
            current_persisted: persisted,
            skipped: false,
        }
    }

    /// Restart a single container outside the normal diff (health-probe
    /// liveness failure, spec §4.3). Serializes against normal
    /// reconciliation via the same `inflight` guard.
    pub async fn restart_on_liveness_failure(
        &self,
        app: &dsup_core::App,
        service: &Service,
        container_id: &str,
    ) {
        let app_id = app.id;
        let _guard = self.inflight.lock().await;
        let now = self.clock.epoch_ms();

        let crash_looping = {
            let mut runtimes = self.runtimes.lock();
            let entry = runtimes.entry((app_id, service.id)).or_default();
            entry.record_exit(now)
        };

        if crash_looping {
            let mut runtimes = self.runtimes.lock();
            let entry = runtimes.entry((app_id, service.id)).or_default();
            entry.error = Some(ErrorRecord {
                kind: ErrorKind::CrashLoopBackOff,
                message: "container exited 3+ times within 5 minutes".into(),
                timestamp_ms: now,
                retry_count: entry.recent_exit_times_ms.len() as u32,
                next_retry_ms: None,
            });
            tracing::error!(
                app_id = %app_id,
                service_id = %service.id,
                "crash loop detected, withholding restart"
            );
            return;
        }

        if self.runtime.stop_container(container_id).await.is_err() {
            return;
        }
        if self.runtime.remove_container(container_id).await.is_err() {
            return;
        }
        match self.runtime.start_container(app, service).await {
            Ok(new_container_id) => {
                let mut runtimes = self.runtimes.lock();
                let entry = runtimes.entry((app_id, service.id)).or_default();
                entry.container_id = Some(new_container_id.clone());
                entry.status = ServiceStatus::Running;
                entry.error = None;
                if let Some(tx) = &self.probe_tx {
                    let _ = tx.send(ContainerStarted {
                        app_id,
                        service_id: service.id,
                        service_name: service.name.clone(),
                        container_id: new_container_id,
                        probes: service.config.probes.clone(),
                    });
                }
            }
            Err(err) => {
                tracing::error!(error = %err, "restart after liveness failure failed to start");
            }
        }
    }

    async fn execute_step(&self, step: &Step, target: &StateSnapshot) -> Result<(), RuntimeAdapterError> {
        match step {
            Step::DownloadImage { image_ref, .. } => self.runtime.pull_image(image_ref).await,
            Step::CreateVolume { app_id, name } => self.runtime.create_volume(*app_id, name).await,
            Step::CreateNetwork { app_id, name } => self.runtime.create_network(*app_id, name).await,
            Step::StopContainer { container_id, .. } => self.runtime.stop_container(container_id).await,
            Step::RemoveContainer { container_id, .. } => {
                self.runtime.remove_container(container_id).await?;
                Ok(())
            }
            Step::StartContainer { app_id, service } => {
                let app = target.app(*app_id).cloned().unwrap_or_else(|| dsup_core::App {
                    id: *app_id,
                    name: app_id.to_string(),
                    uuid: None,
                    services: vec![(**service).clone()],
                });
                let container_id = self.runtime.start_container(&app, service).await?;
                let mut runtimes = self.runtimes.lock();
                let entry = runtimes.entry((*app_id, service.id)).or_default();
                entry.container_id = Some(container_id.clone());
                entry.status = ServiceStatus::Running;
                entry.error = None;
                drop(runtimes);

                let mut current = self.current.lock();
                let app_entry = current.apps.entry(*app_id).or_insert_with(|| dsup_core::App {
                    id: *app_id,
                    name: app_id.to_string(),
                    uuid: None,
                    services: Vec::new(),
                });
                app_entry.services.retain(|s| s.id != service.id);
                app_entry.services.push((**service).clone());
                drop(current);

                if let Some(tx) = &self.probe_tx {
                    let _ = tx.send(ContainerStarted {
                        app_id: *app_id,
                        service_id: service.id,
                        service_name: service.name.clone(),
                        container_id,
                        probes: service.config.probes.clone(),
                    });
                }
                Ok(())
            }
            Step::RemoveNetwork { app_id, name } => self.runtime.remove_network(*app_id, name).await,
            Step::RemoveVolume { app_id, name } => self.runtime.remove_volume(*app_id, name).await,
            Step::Noop => Ok(()),
        }
        .map(|()| {
            if let Step::RemoveContainer { service_id, .. } = step {
                let mut current = self.current.lock();
                for app in current.apps.values_mut() {
                    app.services.retain(|s| s.id != *service_id);
                }
            }
        })
    }

    /// Resolve the owning `AppId` for a step, for retry-key construction.
    /// `StopContainer`/`RemoveContainer` carry only a `serviceId` in the
    /// step alphabet, so their app is recovered from the live runtime map
    /// (populated for every running service) instead.
    fn resolve_app_id(&self, step: &Step) -> Option<AppId> {
        match step {
            Step::StopContainer { service_id, .. } | Step::RemoveContainer { service_id, .. } => self
                .runtimes
                .lock()
                .keys()
                .find(|(_, sid)| sid == service_id)
                .map(|(app_id, _)| *app_id),
            _ => step_app_id(step),
        }
    }

    fn classify_and_record(
        &self,
        step: &Step,
        err: &RuntimeAdapterError,
        image_owners: &HashMap<(AppId, String), ServiceId>,
        skip_services: &mut HashSet<(AppId, ServiceId)>,
    ) {
        let now = self.clock.epoch_ms();
        match step {
            Step::DownloadImage { app_id, image_ref } => {
                let Some(service_id) = image_owners.get(&(*app_id, image_ref.clone())).copied() else {
                    return;
                };
                skip_services.insert((*app_id, service_id));
                let key = format!("image:{image_ref}");
                let retry_state = self.retries.get(&key);
                let next_retry_ms = retry_state.as_ref().and_then(|r| r.next_retry_time_ms);
                let retry_count = retry_state.as_ref().map(|r| r.failure_count).unwrap_or(0);
                // A retry is scheduled as soon as the first failure is
                // recorded (spec Scenario C), not only once backoff caps out.
                let kind = if retry_count >= 1 && next_retry_ms.is_some() {
                    ErrorKind::ImagePullBackOff
                } else {
                    ErrorKind::ErrImagePull
                };
                let mut runtimes = self.runtimes.lock();
                let entry = runtimes.entry((*app_id, service_id)).or_default();
                entry.status = ServiceStatus::Error;
                entry.error = Some(ErrorRecord {
                    kind,
                    message: err.to_string(),
                    timestamp_ms: now,
                    retry_count,
                    next_retry_ms,
                });
            }
            Step::StartContainer { app_id, service } => {
                let mut runtimes = self.runtimes.lock();
                let entry = runtimes.entry((*app_id, service.id)).or_default();
                entry.status = ServiceStatus::Error;
                entry.error = Some(ErrorRecord {
                    kind: ErrorKind::StartFailure,
                    message: err.to_string(),
                    timestamp_ms: now,
                    retry_count: entry.recent_exit_times_ms.len() as u32,
                    next_retry_ms: None,
                });
            }
            _ => {}
        }
    }
}

fn step_app_id(step: &Step) -> Option<AppId> {
    match step {
        Step::DownloadImage { app_id, .. }
        | Step::CreateVolume { app_id, .. }
        | Step::CreateNetwork { app_id, .. }
        | Step::StartContainer { app_id, .. }
        | Step::RemoveNetwork { app_id, .. }
        | Step::RemoveVolume { app_id, .. } => Some(*app_id),
        // Resolved by `Reconciler::resolve_app_id` via the runtime map instead.
        Step::StopContainer { .. } | Step::RemoveContainer { .. } | Step::Noop => None,
    }
}

/// (appId, imageRef) -> serviceId for every `StartContainer` step in a
/// plan, used to attach a `DownloadImage` failure to the service that
/// would have consumed the image (spec's error-classification table
/// attaches errors "to the service", but `downloadImage` itself is
/// app-scoped).
fn image_owners_for(steps: &[Step]) -> HashMap<(AppId, String), ServiceId> {
    steps
        .iter()
        .filter_map(|s| match s {
            Step::StartContainer { app_id, service } => {
                Some(((*app_id, service.image_ref.clone()), service.id))
            }
            _ => None,
        })
        .collect()
}

#[cfg(test)]
#[path = "reconciler_tests.rs"]
mod tests;
