// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Job executor model (spec §4.8).

use crate::ids::JobId;
use serde::{Deserialize, Serialize};

/// Cap applied to captured stdout/stderr before a status PATCH is sent;
/// the cloud API is not a log-streaming endpoint (SPEC_FULL §4.8).
pub const STEP_OUTPUT_CAP_BYTES: usize = 64 * 1024;

pub fn truncate_output(s: &str) -> String {
    if s.len() <= STEP_OUTPUT_CAP_BYTES {
        return s.to_string();
    }
    let mut end = STEP_OUTPUT_CAP_BYTES;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...[truncated]", &s[..end])
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobStep {
    pub name: String,
    pub handler: String,
    pub args: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobStatus {
    #[default]
    Queued,
    InProgress,
    Succeeded,
    Failed,
}

crate::simple_display! {
    JobStatus {
        Queued => "QUEUED",
        InProgress => "IN_PROGRESS",
        Succeeded => "SUCCEEDED",
        Failed => "FAILED",
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Job {
    pub id: JobId,
    pub name: String,
    pub document: Vec<JobStep>,
    pub timeout_secs: u64,
    #[serde(default)]
    pub status: JobStatus,
}

/// The result of executing a single step's handler.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepResult {
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
}

impl StepResult {
    pub fn truncated(self) -> Self {
        Self {
            exit_code: self.exit_code,
            stdout: truncate_output(&self.stdout),
            stderr: truncate_output(&self.stderr),
        }
    }
}

/// Aggregate outcome of running a job's full step list (spec §4.8:
/// `SUCCEEDED` iff every step's `exitCode == 0`, else `FAILED`).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JobOutcome {
    pub status: JobStatus,
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
}

pub fn aggregate_results(results: &[StepResult]) -> JobOutcome {
    let exit_code = results.iter().find(|r| r.exit_code != 0).map_or(0, |r| r.exit_code);
    let status = if exit_code == 0 {
        JobStatus::Succeeded
    } else {
        JobStatus::Failed
    };
    let stdout = results
        .iter()
        .map(|r| r.stdout.as_str())
        .collect::<Vec<_>>()
        .join("\n");
    let stderr = results
        .iter()
        .map(|r| r.stderr.as_str())
        .collect::<Vec<_>>()
        .join("\n");
    JobOutcome {
        status,
        exit_code,
        stdout: truncate_output(&stdout),
        stderr: truncate_output(&stderr),
    }
}

#[cfg(test)]
#[path = "job_tests.rs"]
mod tests;
