// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Health probe definitions and the per-probe state machine.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ProbeKind {
    Http {
        path: String,
        port: u16,
        #[serde(default = "default_scheme")]
        scheme: String,
        #[serde(default)]
        headers: BTreeMap<String, String>,
        #[serde(default = "default_expected_status")]
        expected_status: Vec<u16>,
    },
    Tcp {
        port: u16,
    },
    Exec {
        command: Vec<String>,
    },
}

fn default_scheme() -> String {
    "http".to_string()
}

fn default_expected_status() -> Vec<u16> {
    vec![200]
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthProbeTiming {
    pub initial_delay_secs: u32,
    pub period_secs: u32,
    pub timeout_secs: u32,
    pub success_threshold: u32,
    pub failure_threshold: u32,
}

impl Default for HealthProbeTiming {
    fn default() -> Self {
        Self {
            initial_delay_secs: 0,
            period_secs: 10,
            timeout_secs: 1,
            success_threshold: 1,
            failure_threshold: 3,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthProbe {
    pub kind: ProbeKind,
    #[serde(flatten)]
    pub timing: HealthProbeTiming,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProbeRole {
    #[default]
    Liveness,
    Readiness,
    Startup,
}

crate::simple_display! {
    ProbeRole {
        Liveness => "liveness",
        Readiness => "readiness",
        Startup => "startup",
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProbeStatus {
    #[default]
    Unknown,
    Healthy,
    Unhealthy,
}

/// Per-probe state machine. See spec §4.3: tracks consecutive
/// successes/failures and transitions `unknown -> healthy | unhealthy`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ProbeState {
    pub status: ProbeStatus,
    pub consecutive_successes: u32,
    pub consecutive_failures: u32,
    pub is_started: bool,
}

impl ProbeState {
    /// `is_started` starts `true` when there is no startup probe for the
    /// container (spec §4.3 startup gating).
    pub fn new(has_startup_probe: bool) -> Self {
        Self {
            is_started: !has_startup_probe,
            ..Default::default()
        }
    }

    pub fn record_success(&mut self, timing: &HealthProbeTiming) {
        self.consecutive_successes += 1;
        self.consecutive_failures = 0;
        if self.consecutive_successes >= timing.success_threshold {
            self.status = ProbeStatus::Healthy;
        }
    }

    pub fn record_failure(&mut self, timing: &HealthProbeTiming) {
        self.consecutive_failures += 1;
        self.consecutive_successes = 0;
        if self.consecutive_failures >= timing.failure_threshold {
            self.status = ProbeStatus::Unhealthy;
        }
    }

    pub fn just_became_healthy(&self, timing: &HealthProbeTiming) -> bool {
        self.status == ProbeStatus::Healthy && self.consecutive_successes == timing.success_threshold
    }

    pub fn just_became_unhealthy(&self, timing: &HealthProbeTiming) -> bool {
        self.status == ProbeStatus::Unhealthy
            && self.consecutive_failures == timing.failure_threshold
    }
}

/// Events emitted by the Health Probe Manager onto the single typed channel
/// consumed by the reconciler's event loop (spec §4.3, Design Notes
/// "explicit typed channels").
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeEvent {
    LivenessFailed {
        container_id: String,
        service_name: String,
        message: String,
    },
    ReadinessChanged {
        container_id: String,
        is_ready: bool,
    },
    StartupCompleted {
        container_id: String,
    },
}

impl ProbeEvent {
    pub fn name(&self) -> &'static str {
        match self {
            ProbeEvent::LivenessFailed { .. } => "liveness-failed",
            ProbeEvent::ReadinessChanged { .. } => "readiness-changed",
            ProbeEvent::StartupCompleted { .. } => "startup-completed",
        }
    }
}

#[cfg(test)]
#[path = "health_tests.rs"]
mod tests;
