// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Local pub/sub bus client (spec §4.5, §6) — QoS-1 MQTT publish/subscribe
//! used by the shadow synchronizer and sensor manager.

use async_trait::async_trait;
use rumqttc::{AsyncClient, Event, EventLoop, MqttOptions, Packet, QoS};
use std::time::Duration;
use thiserror::Error;
use tokio::sync::mpsc;

#[derive(Debug, Error)]
pub enum BusError {
    #[error("bus client error: {0}")]
    Client(#[from] rumqttc::ClientError),
    #[error("bus connection lost")]
    Disconnected,
}

/// An inbound message delivered off a subscribed topic.
#[derive(Debug, Clone)]
pub struct BusMessage {
    pub topic: String,
    pub payload: Vec<u8>,
}

/// Bus access surface the shadow synchronizer and sensor manager depend on.
/// Kept narrow — callers never see `rumqttc` types directly, matching the
/// adapter-trait split used for the runtime and probe checker.
#[async_trait]
pub trait BusClient: Send + Sync {
    async fn publish(&self, topic: &str, payload: Vec<u8>) -> Result<(), BusError>;
    async fn subscribe(&self, topic_filter: &str) -> Result<(), BusError>;
}

/// Production client backed by `rumqttc`.
pub struct MqttBusClient {
    client: AsyncClient,
}

impl MqttBusClient {
    /// Connects to `broker_host:broker_port` under the given client id and
    /// spawns the `rumqttc` event loop driver in the background. Returns the
    /// client plus the receiver half of its inbound-message channel — the
    /// same `(client, inbound)` shape as [`fake::FakeBusClient::new`], so
    /// callers depend on `Arc<dyn BusClient>` for publish/subscribe and on
    /// the concrete receiver for inbound delivery.
    pub fn connect(
        broker_host: &str,
        broker_port: u16,
        client_id: &str,
    ) -> (Self, mpsc::UnboundedReceiver<BusMessage>) {
        let mut options = MqttOptions::new(client_id, broker_host, broker_port);
        options.set_keep_alive(Duration::from_secs(30));
        options.set_clean_session(false);
        let (client, event_loop) = AsyncClient::new(options, 64);
        let (tx, rx) = mpsc::unbounded_channel();
        tokio::spawn(drive_event_loop(event_loop, tx));
        (Self { client }, rx)
    }
}

async fn drive_event_loop(mut event_loop: EventLoop, tx: mpsc::UnboundedSender<BusMessage>) {
    loop {
        match event_loop.poll().await {
            Ok(Event::Incoming(Packet::Publish(publish))) => {
                let message = BusMessage {
                    topic: publish.topic,
                    payload: publish.payload.to_vec(),
                };
                if tx.send(message).is_err() {
                    return;
                }
            }
            Ok(_) => continue,
            Err(err) => {
                tracing::warn!(error = %err, "bus event loop error, retrying");
                tokio::time::sleep(Duration::from_secs(1)).await;
            }
        }
    }
}

#[async_trait]
impl BusClient for MqttBusClient {
    async fn publish(&self, topic: &str, payload: Vec<u8>) -> Result<(), BusError> {
        self.client
            .publish(topic, QoS::AtLeastOnce, false, payload)
            .await?;
        Ok(())
    }

    async fn subscribe(&self, topic_filter: &str) -> Result<(), BusError> {
        self.client.subscribe(topic_filter, QoS::AtLeastOnce).await?;
        Ok(())
    }
}

#[cfg(feature = "test-support")]
pub mod fake {
    use super::{BusClient, BusError, BusMessage};
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use std::sync::Arc;
    use tokio::sync::mpsc;

    /// In-memory bus used by reconciler/shadow-sync tests. Publishes are
    /// recorded and, if the topic matches a registered subscription,
    /// echoed back onto the inbound channel — mirroring the local loopback
    /// behavior of a single-broker MQTT bus under test.
    #[derive(Clone)]
    pub struct FakeBusClient {
        inner: Arc<Mutex<Inner>>,
        tx: mpsc::UnboundedSender<BusMessage>,
    }

    struct Inner {
        published: Vec<BusMessage>,
        subscriptions: Vec<String>,
    }

    impl FakeBusClient {
        pub fn new() -> (Self, mpsc::UnboundedReceiver<BusMessage>) {
            let (tx, rx) = mpsc::unbounded_channel();
            let client = Self {
                inner: Arc::new(Mutex::new(Inner {
                    published: Vec::new(),
                    subscriptions: Vec::new(),
                })),
                tx,
            };
            (client, rx)
        }

        pub fn published(&self) -> Vec<BusMessage> {
            self.inner.lock().published.clone()
        }

        /// Simulates an inbound publish from a remote peer (e.g. the cloud
        /// pushing a shadow delta), delivered only if a matching
        /// subscription is on file.
        pub fn inject(&self, topic: &str, payload: Vec<u8>) {
            let matches = self
                .inner
                .lock()
                .subscriptions
                .iter()
                .any(|filter| topic_matches(filter, topic));
            if matches {
                let _ = self.tx.send(BusMessage {
                    topic: topic.to_string(),
                    payload,
                });
            }
        }
    }

    fn topic_matches(filter: &str, topic: &str) -> bool {
        if filter == topic {
            return true;
        }
        if let Some(prefix) = filter.strip_suffix("/#") {
            return topic == prefix || topic.starts_with(&format!("{prefix}/"));
        }
        false
    }

    #[async_trait]
    impl BusClient for FakeBusClient {
        async fn publish(&self, topic: &str, payload: Vec<u8>) -> Result<(), BusError> {
            self.inner.lock().published.push(BusMessage {
                topic: topic.to_string(),
                payload,
            });
            Ok(())
        }

        async fn subscribe(&self, topic_filter: &str) -> Result<(), BusError> {
            self.inner.lock().subscriptions.push(topic_filter.to_string());
            Ok(())
        }
    }
}

#[cfg(test)]
#[path = "bus_tests.rs"]
mod tests;
