// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Sensor transport (spec §4.6): each sensor connects to a local
//! datagram-or-stream socket and reads newline-delimited messages. Kept
//! behind a narrow trait, same adapter split used for the runtime and bus
//! clients, so the sensor manager never touches `tokio::net` directly.

use async_trait::async_trait;
use thiserror::Error;
use tokio::io::AsyncBufReadExt;
use tokio::io::BufReader;

#[derive(Debug, Error)]
pub enum SensorError {
    #[error("sensor io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("sensor disconnected")]
    Disconnected,
}

#[async_trait]
pub trait SensorSource: Send + Sync {
    /// Reads one delimited message from the sensor's local socket
    /// `address`. Implementations reconnect transparently; a transport
    /// failure surfaces as `SensorError` for the caller to record as an
    /// `errorCount`/`lastError` metric without tearing down the manager.
    async fn read_message(&self, address: &str) -> Result<Vec<u8>, SensorError>;
}

/// Production source backed by a Unix domain stream socket. Connects fresh
/// on every read — sensors publish at most once per `publishInterval` (at
/// least one second), so a reconnect-per-read keeps the implementation
/// simple without a persistent-connection state machine.
#[derive(Debug, Clone, Default)]
pub struct UnixSensorSource;

#[async_trait]
impl SensorSource for UnixSensorSource {
    async fn read_message(&self, address: &str) -> Result<Vec<u8>, SensorError> {
        let stream = tokio::net::UnixStream::connect(address).await?;
        let mut reader = BufReader::new(stream);
        let mut line = String::new();
        let n = reader.read_line(&mut line).await?;
        if n == 0 {
            return Err(SensorError::Disconnected);
        }
        Ok(line.trim_end_matches('\n').as_bytes().to_vec())
    }
}

#[cfg(feature = "test-support")]
pub mod fake {
    use super::{SensorError, SensorSource};
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use std::collections::{HashMap, VecDeque};
    use std::sync::Arc;

    /// In-memory source keyed by sensor address. Each address has its own
    /// queue of pending messages and a connectivity flag tests can flip.
    #[derive(Clone, Default)]
    pub struct FakeSensorSource {
        inner: Arc<Mutex<HashMap<String, Queue>>>,
    }

    #[derive(Default)]
    struct Queue {
        messages: VecDeque<Vec<u8>>,
        connected: bool,
    }

    impl FakeSensorSource {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn set_connected(&self, address: &str, connected: bool) {
            self.inner
                .lock()
                .entry(address.to_string())
                .or_default()
                .connected = connected;
        }

        pub fn push_message(&self, address: &str, message: impl Into<Vec<u8>>) {
            let mut inner = self.inner.lock();
            let queue = inner.entry(address.to_string()).or_default();
            queue.connected = true;
            queue.messages.push_back(message.into());
        }
    }

    #[async_trait]
    impl SensorSource for FakeSensorSource {
        async fn read_message(&self, address: &str) -> Result<Vec<u8>, SensorError> {
            let mut inner = self.inner.lock();
            let queue = inner.entry(address.to_string()).or_default();
            if !queue.connected {
                return Err(SensorError::Disconnected);
            }
            queue
                .messages
                .pop_front()
                .ok_or(SensorError::Disconnected)
        }
    }
}

#[cfg(test)]
#[path = "sensor_tests.rs"]
mod tests;
