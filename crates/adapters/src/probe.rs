// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Health probe check implementations (spec §4.3): http/tcp/exec.

use async_trait::async_trait;
use dsup_core::ProbeKind;
use std::time::Duration;
use thiserror::Error;
use tokio::net::TcpStream;
use tokio::time::timeout;

#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("probe timed out after {0:?}")]
    Timeout(Duration),
    #[error("probe transport error: {0}")]
    Transport(String),
    #[error("unexpected status {0}")]
    UnexpectedStatus(u16),
    #[error("exec exited with status {0}")]
    ExecNonZero(i64),
}

/// Runs `exec` probes inside a container; implemented by `dsup-adapters`'
/// Docker runtime adapter in production, faked in tests — mirrors the
/// `RuntimeAdapter` trait split so the probe manager never talks to the
/// runtime directly.
#[async_trait]
pub trait ExecRunner: Send + Sync {
    async fn exec(&self, container_id: &str, command: &[String]) -> Result<i64, ProbeError>;
}

pub struct ProbeChecker {
    http_client: reqwest::Client,
}

impl Default for ProbeChecker {
    fn default() -> Self {
        Self {
            http_client: reqwest::Client::new(),
        }
    }
}

impl ProbeChecker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run a probe against `container_ip`. `exec_runner`/`container_id` are
    /// only consulted for `ProbeKind::Exec`.
    pub async fn check(
        &self,
        kind: &ProbeKind,
        container_ip: &str,
        container_id: &str,
        timeout_secs: u32,
        exec_runner: &dyn ExecRunner,
    ) -> Result<bool, ProbeError> {
        let deadline = Duration::from_secs(timeout_secs as u64);
        match kind {
            ProbeKind::Http {
                path,
                port,
                scheme,
                headers,
                expected_status,
            } => {
                let url = format!("{scheme}://{container_ip}:{port}{path}");
                let mut req = self.http_client.get(&url);
                for (k, v) in headers {
                    req = req.header(k, v);
                }
                let response = timeout(deadline, req.send())
                    .await
                    .map_err(|_| ProbeError::Timeout(deadline))?
                    .map_err(|e| ProbeError::Transport(e.to_string()))?;
                Ok(expected_status.contains(&response.status().as_u16()))
            }
            ProbeKind::Tcp { port } => {
                let addr = format!("{container_ip}:{port}");
                match timeout(deadline, TcpStream::connect(&addr)).await {
                    Ok(Ok(_)) => Ok(true),
                    Ok(Err(_)) => Ok(false),
                    Err(_) => Err(ProbeError::Timeout(deadline)),
                }
            }
            ProbeKind::Exec { command } => {
                let exit = timeout(deadline, exec_runner.exec(container_id, command))
                    .await
                    .map_err(|_| ProbeError::Timeout(deadline))??;
                Ok(exit == 0)
            }
        }
    }
}

#[cfg(test)]
#[path = "probe_tests.rs"]
mod tests;
