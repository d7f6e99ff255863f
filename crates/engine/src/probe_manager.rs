// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Health Probe Manager (spec §4.3): one scheduling task per registered
//! probe, gated by a shared startup flag per container. Per-entity
//! `tokio::time` timers feeding a single typed event channel, the same
//! shape as the reference codebase's per-entity timer scheduling
//! (`oj-engine/src/runtime/monitor.rs`).

use dsup_adapters::{ExecRunner, ProbeChecker};
use dsup_core::{HealthProbe, ProbeEvent, ProbeRole, ProbeSet, ProbeState};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

pub struct ProbeManager {
    checker: Arc<ProbeChecker>,
    exec_runner: Arc<dyn ExecRunner>,
    event_tx: mpsc::UnboundedSender<ProbeEvent>,
    shutdown: CancellationToken,
    containers: Mutex<HashMap<String, CancellationToken>>,
}

impl ProbeManager {
    pub fn new(
        checker: Arc<ProbeChecker>,
        exec_runner: Arc<dyn ExecRunner>,
        event_tx: mpsc::UnboundedSender<ProbeEvent>,
        shutdown: CancellationToken,
    ) -> Self {
        Self {
            checker,
            exec_runner,
            event_tx,
            shutdown,
            containers: Mutex::new(HashMap::new()),
        }
    }

    /// Register up to three probes for a newly-started container. Replaces
    /// any prior registration for the same `container_id` (spec §4.3: "must
    /// not retain probes after `stopMonitoring`").
    pub fn register(
        &self,
        container_id: impl Into<String>,
        service_name: impl Into<String>,
        container_ip: impl Into<String>,
        probes: ProbeSet,
    ) {
        let container_id = container_id.into();
        let service_name = service_name.into();
        let container_ip = container_ip.into();

        self.stop_monitoring(&container_id);
        if probes.liveness.is_none() && probes.readiness.is_none() && probes.startup.is_none() {
            return;
        }

        let token = self.shutdown.child_token();
        self.containers
            .lock()
            .insert(container_id.clone(), token.clone());
        // `isStarted` begins true when there is no startup probe (spec §4.3).
        let is_started = Arc::new(AtomicBool::new(probes.startup.is_none()));

        let mut spawn = |role: ProbeRole, probe: HealthProbe| {
            tokio::spawn(run_probe(
                role,
                probe,
                container_id.clone(),
                service_name.clone(),
                container_ip.clone(),
                is_started.clone(),
                self.checker.clone(),
                self.exec_runner.clone(),
                self.event_tx.clone(),
                token.clone(),
            ));
        };

        if let Some(startup) = probes.startup {
            spawn(ProbeRole::Startup, startup);
        }
        if let Some(liveness) = probes.liveness {
            spawn(ProbeRole::Liveness, liveness);
        }
        if let Some(readiness) = probes.readiness {
            spawn(ProbeRole::Readiness, readiness);
        }
    }

    /// Cancel every probe task for `container_id` (spec §4.3: stop/remove/restart).
    pub fn stop_monitoring(&self, container_id: &str) {
        if let Some(token) = self.containers.lock().remove(container_id) {
            token.cancel();
        }
    }

    pub fn monitored_count(&self) -> usize {
        self.containers.lock().len()
    }
}

#[allow(clippy::too_many_arguments)]
async fn run_probe(
    role: ProbeRole,
    probe: HealthProbe,
    container_id: String,
    service_name: String,
    container_ip: String,
    is_started: Arc<AtomicBool>,
    checker: Arc<ProbeChecker>,
    exec_runner: Arc<dyn ExecRunner>,
    event_tx: mpsc::UnboundedSender<ProbeEvent>,
    cancel: CancellationToken,
) {
    let timing = probe.timing;
    tokio::select! {
        _ = tokio::time::sleep(Duration::from_secs(timing.initial_delay_secs as u64)) => {}
        _ = cancel.cancelled() => return,
    }

    let mut state = ProbeState::default();
    let mut interval = tokio::time::interval(Duration::from_secs(timing.period_secs.max(1) as u64));
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => return,
            _ = interval.tick() => {}
        }

        // Startup gating: non-startup checks are rescheduled for a later
        // tick until the startup probe reports healthy.
        if role != ProbeRole::Startup && !is_started.load(Ordering::Acquire) {
            continue;
        }

        let passed = match checker
            .check(
                &probe.kind,
                &container_ip,
                &container_id,
                timing.timeout_secs,
                exec_runner.as_ref(),
            )
            .await
        {
            Ok(passed) => passed,
            Err(err) => {
                tracing::warn!(container_id = %container_id, role = %role, error = %err, "probe check errored");
                false
            }
        };

        if passed {
            state.record_success(&timing);
            tracing::debug!(container_id = %container_id, role = %role, "probe check passed");
        } else {
            state.record_failure(&timing);
            tracing::warn!(container_id = %container_id, role = %role, "probe check failed");
        }

        match role {
            ProbeRole::Liveness => {
                if state.just_became_unhealthy(&timing) {
                    let _ = event_tx.send(ProbeEvent::LivenessFailed {
                        container_id: container_id.clone(),
                        service_name: service_name.clone(),
                        message: "liveness probe exceeded failure threshold".into(),
                    });
                }
            }
            ProbeRole::Readiness => {
                if state.just_became_healthy(&timing) {
                    let _ = event_tx.send(ProbeEvent::ReadinessChanged {
                        container_id: container_id.clone(),
                        is_ready: true,
                    });
                } else if state.just_became_unhealthy(&timing) {
                    let _ = event_tx.send(ProbeEvent::ReadinessChanged {
                        container_id: container_id.clone(),
                        is_ready: false,
                    });
                }
            }
            ProbeRole::Startup => {
                if state.just_became_healthy(&timing) {
                    is_started.store(true, Ordering::Release);
                    let _ = event_tx.send(ProbeEvent::StartupCompleted {
                        container_id: container_id.clone(),
                    });
                    return;
                }
            }
        }
    }
}

#[cfg(test)]
#[path = "probe_manager_tests.rs"]
mod tests;
