// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shadow Synchronizer (spec §4.5): subscribes to a shadow's `accepted`,
//! `delta`, and `documents` topics, republishes the reported document after
//! every successfully-applied delta, and publishes an initial snapshot on
//! start. Event-driven dispatch modeled on the reference codebase's
//! `MaterializedState::apply_event` match-by-event-family structure
//! (`oj-storage/src/state/mod.rs`).

use crate::sensor_manager::SensorManager;
use dsup_adapters::{BusClient, BusMessage};
use dsup_core::{Clock, Shadow, ShadowChannel};
use parking_lot::Mutex;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

pub struct ShadowSynchronizer<C: Clock> {
    bus: Arc<dyn BusClient>,
    device_id: String,
    shadow: Mutex<Shadow>,
    sensors: Arc<SensorManager<C>>,
}

impl<C: Clock> ShadowSynchronizer<C> {
    pub fn new(
        bus: Arc<dyn BusClient>,
        device_id: impl Into<String>,
        shadow_name: impl Into<String>,
        sensors: Arc<SensorManager<C>>,
    ) -> Self {
        Self {
            bus,
            device_id: device_id.into(),
            shadow: Mutex::new(Shadow::new(shadow_name)),
            sensors,
        }
    }

    fn topic(&self, channel: ShadowChannel) -> String {
        let name = self.shadow.lock().name.clone();
        channel.topic(&self.device_id, &name)
    }

    /// The base `.../update` topic the device publishes reported documents
    /// to; distinct from the `accepted`/`delta`/`documents` channels it only
    /// subscribes to (spec §4.5 topic grammar).
    fn publish_topic(&self) -> String {
        let name = self.shadow.lock().name.clone();
        format!("iot/device/{}/shadow/name/{}/update", self.device_id, name)
    }

    /// Subscribe to all three channels and publish the initial reported
    /// document (spec §4.5: "on start, after subscribing... publishes the
    /// current reported doc so the cloud has an initial snapshot").
    pub async fn start(&self) {
        for channel in [ShadowChannel::Accepted, ShadowChannel::Delta, ShadowChannel::Documents] {
            if let Err(err) = self.bus.subscribe(&self.topic(channel)).await {
                tracing::warn!(channel = %channel, error = %err, "failed to subscribe to shadow channel");
            }
        }
        self.publish_reported().await;
    }

    /// Drives the inbound message loop until `shutdown` fires or the bus
    /// channel closes.
    pub async fn run(&self, mut inbound: mpsc::UnboundedReceiver<BusMessage>, shutdown: CancellationToken) {
        self.start().await;
        loop {
            tokio::select! {
                _ = shutdown.cancelled() => return,
                message = inbound.recv() => {
                    let Some(message) = message else { return };
                    self.handle_message(&message).await;
                }
            }
        }
    }

    async fn handle_message(&self, message: &BusMessage) {
        let delta_topic = self.topic(ShadowChannel::Delta);
        if message.topic != delta_topic {
            // `accepted`/`documents` are cloud-acknowledgement channels the
            // device only logs (DESIGN.md Open Question 4).
            tracing::debug!(topic = %message.topic, "shadow ack received");
            return;
        }

        let delta: serde_json::Value = match serde_json::from_slice(&message.payload) {
            Ok(value) => value,
            Err(err) => {
                tracing::warn!(error = %err, "malformed shadow delta payload");
                return;
            }
        };

        match self.sensors.apply_config_delta(&delta) {
            Ok(()) => self.publish_reported().await,
            Err(err) => self.publish_error(&err.to_string()).await,
        }
    }

    /// Publish the current reported document, bumping `version` (spec §4.5
    /// envelope: `{state:{reported}, version, timestamp}`).
    async fn publish_reported(&self) {
        let reported = self.sensors.reported_document();
        self.publish_envelope(reported).await;
    }

    async fn publish_error(&self, message: &str) {
        self.publish_envelope(serde_json::json!({ "error": message })).await;
    }

    async fn publish_envelope(&self, reported: serde_json::Value) {
        let timestamp = chrono::Utc::now().to_rfc3339();
        let envelope = {
            let mut shadow = self.shadow.lock();
            shadow.next_reported_envelope(reported, timestamp)
        };
        let topic = self.publish_topic();
        let payload = match serde_json::to_vec(&envelope) {
            Ok(bytes) => bytes,
            Err(err) => {
                tracing::error!(error = %err, "failed to serialize shadow envelope");
                return;
            }
        };
        // QoS-1 publish with no local retry: a disconnected bus drops the
        // publish and relies on reconnect-triggered republish (spec §4.5).
        if let Err(err) = self.bus.publish(&topic, payload).await {
            tracing::warn!(error = %err, "shadow publish failed, will reissue on reconnect");
        }
    }
}

#[cfg(test)]
#[path = "shadow_sync_tests.rs"]
mod tests;
