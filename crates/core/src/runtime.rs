// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Runtime annotations attached to a Service inside the *current* snapshot.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ServiceStatus {
    #[default]
    Pending,
    Running,
    Exited,
    Stopped,
    Dead,
    Error,
}

crate::simple_display! {
    ServiceStatus {
        Pending => "pending",
        Running => "running",
        Exited => "exited",
        Stopped => "stopped",
        Dead => "dead",
        Error => "error",
    }
}

impl ServiceStatus {
    /// Statuses the diff algorithm treats as `containerStopped` (spec §4.1).
    pub fn is_stopped_kind(&self) -> bool {
        matches!(
            self,
            ServiceStatus::Exited | ServiceStatus::Stopped | ServiceStatus::Dead
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    #[default]
    ImagePullBackOff,
    ErrImagePull,
    StartFailure,
    CrashLoopBackOff,
}

crate::simple_display! {
    ErrorKind {
        ImagePullBackOff => "ImagePullBackOff",
        ErrImagePull => "ErrImagePull",
        StartFailure => "StartFailure",
        CrashLoopBackOff => "CrashLoopBackOff",
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorRecord {
    pub kind: ErrorKind,
    pub message: String,
    pub timestamp_ms: u64,
    pub retry_count: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_retry_ms: Option<u64>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceRuntime {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub container_id: Option<String>,
    pub status: ServiceStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorRecord>,
    /// Ring of recent exit timestamps (epoch ms), used to classify
    /// `CrashLoopBackOff` (DESIGN.md Open Question 2: 3+ exits in 5 minutes).
    #[serde(default)]
    pub recent_exit_times_ms: Vec<u64>,
}

pub const CRASH_LOOP_WINDOW_MS: u64 = 5 * 60 * 1000;
pub const CRASH_LOOP_THRESHOLD: usize = 3;

impl ServiceRuntime {
    /// Record a container exit and report whether this now qualifies as a
    /// crash loop (3+ exits within the trailing 5-minute window).
    pub fn record_exit(&mut self, now_ms: u64) -> bool {
        self.recent_exit_times_ms
            .retain(|&t| now_ms.saturating_sub(t) <= CRASH_LOOP_WINDOW_MS);
        self.recent_exit_times_ms.push(now_ms);
        self.recent_exit_times_ms.len() >= CRASH_LOOP_THRESHOLD
    }
}

#[cfg(test)]
#[path = "runtime_tests.rs"]
mod tests;
