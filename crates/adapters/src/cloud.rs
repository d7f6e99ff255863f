// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Cloud HTTP API Binder (spec §4.7, §6) — target-state fetch, current-state
//! report, job poll/status PATCH.

use dsup_core::{Job, JobStatus};
use serde::Serialize;
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CloudError {
    #[error("cloud transport error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("unexpected status {0} from cloud")]
    UnexpectedStatus(u16),
}

/// Built once at startup and shared (via `Arc`) across the three cloud
/// loops so connections are pooled (SPEC_FULL §4.7).
#[derive(Clone)]
pub struct CloudClient {
    http: reqwest::Client,
    base_url: String,
    device_uuid: String,
    credential: Arc<String>,
}

impl CloudClient {
    pub fn new(base_url: impl Into<String>, device_uuid: impl Into<String>, credential: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into(),
            device_uuid: device_uuid.into(),
            credential: Arc::new(credential.into()),
        }
    }

    fn authed(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        builder.bearer_auth(self.credential.as_str())
    }

    /// GET `/v1/devices/{uuid}/target-state`. Returns `None` on a 304 (the
    /// cached tag still matches); `Some((body, etag))` on a fresh target.
    pub async fn fetch_target_state(
        &self,
        etag: Option<&str>,
    ) -> Result<Option<(serde_json::Value, Option<String>)>, CloudError> {
        let url = format!("{}/v1/devices/{}/target-state", self.base_url, self.device_uuid);
        let mut req = self.authed(self.http.get(&url));
        if let Some(tag) = etag {
            req = req.header(reqwest::header::IF_NONE_MATCH, tag);
        }
        let response = req.send().await?;
        if response.status() == reqwest::StatusCode::NOT_MODIFIED {
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(CloudError::UnexpectedStatus(response.status().as_u16()));
        }
        let new_etag = response
            .headers()
            .get(reqwest::header::ETAG)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let body = response.json::<serde_json::Value>().await?;
        Ok(Some((body, new_etag)))
    }

    /// PATCH `/v1/devices/{uuid}/state` with a condensed current-state
    /// document plus host metrics.
    pub async fn report_current_state(&self, doc: &serde_json::Value) -> Result<(), CloudError> {
        let url = format!("{}/v1/devices/{}/state", self.base_url, self.device_uuid);
        let response = self.authed(self.http.patch(&url).json(doc)).send().await?;
        if !response.status().is_success() {
            return Err(CloudError::UnexpectedStatus(response.status().as_u16()));
        }
        Ok(())
    }

    /// GET `/v1/devices/{uuid}/jobs/next`. An empty body means no job is
    /// queued.
    pub async fn next_job(&self) -> Result<Option<Job>, CloudError> {
        let url = format!("{}/v1/devices/{}/jobs/next", self.base_url, self.device_uuid);
        let response = self.authed(self.http.get(&url)).send().await?;
        if !response.status().is_success() {
            return Err(CloudError::UnexpectedStatus(response.status().as_u16()));
        }
        let bytes = response.bytes().await?;
        if bytes.is_empty() {
            return Ok(None);
        }
        let job: Job = serde_json::from_slice(&bytes).map_err(|_| CloudError::UnexpectedStatus(200))?;
        Ok(Some(job))
    }

    pub async fn patch_job_status(
        &self,
        job_id: &str,
        status: JobStatus,
        exit_code: Option<i32>,
        stdout: Option<&str>,
        stderr: Option<&str>,
        status_details: Option<&str>,
    ) -> Result<(), CloudError> {
        #[derive(Serialize)]
        struct JobStatusPatch<'a> {
            status: String,
            #[serde(skip_serializing_if = "Option::is_none")]
            exit_code: Option<i32>,
            #[serde(skip_serializing_if = "Option::is_none")]
            stdout: Option<&'a str>,
            #[serde(skip_serializing_if = "Option::is_none")]
            stderr: Option<&'a str>,
            #[serde(skip_serializing_if = "Option::is_none")]
            status_details: Option<&'a str>,
        }

        let url = format!(
            "{}/v1/devices/{}/jobs/{}/status",
            self.base_url, self.device_uuid, job_id
        );
        let body = JobStatusPatch {
            status: status.to_string(),
            exit_code,
            stdout,
            stderr,
            status_details,
        };
        let response = self.authed(self.http.patch(&url).json(&body)).send().await?;
        if !response.status().is_success() {
            return Err(CloudError::UnexpectedStatus(response.status().as_u16()));
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "cloud_tests.rs"]
mod tests;
