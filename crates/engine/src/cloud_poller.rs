// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Cloud Poller / API Binder (spec §4.7): two independent, cancellable
//! loops sharing one [`CloudClient`] — target-state fetch and current-state
//! report — each wrapped in the same backoff machinery as the reconciler
//! (spec §4.1), loop shape modeled on the reference codebase's per-entity
//! timer loops (`oj-engine/src/runtime/handlers/worker/polling.rs`).

use crate::Reconciler;
use dsup_adapters::CloudClient;
use dsup_core::{Clock, RetryTable, SnapshotKind, StateSnapshot};
use dsup_storage::StateStore;
use parking_lot::Mutex;
use std::net::UdpSocket;
use std::sync::Arc;
use std::time::Duration;
use sysinfo::System;
use tokio_util::sync::CancellationToken;

const TARGET_POLL_RETRY_KEY: &str = "cloud:target-poll";
const REPORT_RETRY_KEY: &str = "cloud:report";

pub struct CloudPoller<C: Clock> {
    cloud: Arc<CloudClient>,
    store: Arc<StateStore>,
    reconciler: Arc<Reconciler<C>>,
    retries: RetryTable<C>,
    etag: Mutex<Option<String>>,
}

impl<C: Clock> CloudPoller<C> {
    pub fn new(cloud: Arc<CloudClient>, store: Arc<StateStore>, reconciler: Arc<Reconciler<C>>, clock: C) -> Self {
        Self {
            cloud,
            store,
            reconciler,
            retries: RetryTable::new(clock),
            etag: Mutex::new(None),
        }
    }

    /// Spawns the target-poll and report loops as independent tasks bound
    /// to `shutdown`.
    pub fn spawn(self: &Arc<Self>, poll_interval: Duration, report_interval: Duration, shutdown: &CancellationToken) {
        let target = self.clone();
        let target_token = shutdown.child_token();
        tokio::spawn(async move { target.run_target_poll(poll_interval, target_token).await });

        let report = self.clone();
        let report_token = shutdown.child_token();
        tokio::spawn(async move { report.run_report(report_interval, report_token).await });
    }

    async fn run_target_poll(&self, poll_interval: Duration, shutdown: CancellationToken) {
        loop {
            if !self.retries.is_gated(TARGET_POLL_RETRY_KEY) {
                self.poll_target_once().await;
            }
            tokio::select! {
                _ = shutdown.cancelled() => return,
                _ = tokio::time::sleep(poll_interval) => {}
            }
        }
    }

    async fn poll_target_once(&self) {
        let etag = self.etag.lock().clone();
        match self.cloud.fetch_target_state(etag.as_deref()).await {
            Ok(None) => self.retries.clear(TARGET_POLL_RETRY_KEY),
            Ok(Some((body, new_etag))) => {
                self.retries.clear(TARGET_POLL_RETRY_KEY);
                *self.etag.lock() = new_etag;
                match serde_json::from_value::<StateSnapshot>(body) {
                    Ok(target) => self.adopt_target(target).await,
                    Err(err) => tracing::error!(error = %err, "malformed target-state document"),
                }
            }
            Err(err) => {
                tracing::warn!(error = %err, "target-state fetch failed");
                self.retries.record_failure(TARGET_POLL_RETRY_KEY, err.to_string());
            }
        }
    }

    async fn adopt_target(&self, target: StateSnapshot) {
        match self.store.write(SnapshotKind::Target, &target) {
            Ok(true) => {
                self.reconciler.apply_target(&target).await;
            }
            Ok(false) => {}
            Err(err) => tracing::error!(error = %err, "failed to persist target state"),
        }
    }

    async fn run_report(&self, report_interval: Duration, shutdown: CancellationToken) {
        loop {
            if !self.retries.is_gated(REPORT_RETRY_KEY) {
                self.report_once().await;
            }
            tokio::select! {
                _ = shutdown.cancelled() => return,
                _ = tokio::time::sleep(report_interval) => {}
            }
        }
    }

    async fn report_once(&self) {
        let doc = self.build_report_document();
        match self.cloud.report_current_state(&doc).await {
            Ok(()) => self.retries.clear(REPORT_RETRY_KEY),
            Err(err) => {
                tracing::warn!(error = %err, "current-state report failed");
                self.retries.record_failure(REPORT_RETRY_KEY, err.to_string());
            }
        }
    }

    /// Condensed current-state document (spec §4.7: per-service status,
    /// error, container ID, plus host metrics).
    fn build_report_document(&self) -> serde_json::Value {
        let snapshot = self.reconciler.current_snapshot();
        let runtimes = self.reconciler.runtime_snapshot();
        let services: Vec<_> = snapshot
            .apps
            .values()
            .flat_map(|app| app.services.iter().map(move |service| (app.id, service)))
            .map(|(app_id, service)| {
                let runtime = runtimes.get(&(app_id, service.id)).cloned().unwrap_or_default();
                serde_json::json!({
                    "appId": app_id,
                    "serviceId": service.id,
                    "status": runtime.status.to_string(),
                    "containerId": runtime.container_id,
                    "error": runtime.error,
                })
            })
            .collect();

        serde_json::json!({
            "services": services,
            "host": host_metrics(),
        })
    }
}

/// Best-effort host metrics (spec §4.7: cpu %, memory bytes, ip, uptime).
/// A metrics read failure never blocks the report — missing fields are
/// just `null`.
fn host_metrics() -> serde_json::Value {
    let mut system = System::new();
    system.refresh_cpu();
    system.refresh_memory();

    serde_json::json!({
        "cpuPercent": system.global_cpu_info().cpu_usage(),
        "memoryBytes": system.used_memory(),
        "ip": local_ip(),
        "uptimeSecs": System::uptime(),
    })
}

/// The device's outbound-facing local IP, discovered without sending any
/// packets (connecting a UDP socket only resolves a route).
fn local_ip() -> Option<String> {
    let socket = UdpSocket::bind("0.0.0.0:0").ok()?;
    socket.connect("8.8.8.8:80").ok()?;
    socket.local_addr().ok().map(|addr| addr.ip().to_string())
}

#[cfg(test)]
#[path = "cloud_poller_tests.rs"]
mod tests;
