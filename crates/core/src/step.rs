// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The reconciler's step alphabet (spec §4.1), modeled on the reference
//! codebase's `Effect` enum: a tagged sum type with `name()`/`fields()` for
//! structured logging rather than ad hoc string formatting at each call
//! site.

use crate::app::Service;
use crate::ids::{AppId, ServiceId};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    DownloadImage {
        app_id: AppId,
        image_ref: String,
    },
    CreateVolume {
        app_id: AppId,
        name: String,
    },
    CreateNetwork {
        app_id: AppId,
        name: String,
    },
    StopContainer {
        service_id: ServiceId,
        container_id: String,
    },
    RemoveContainer {
        service_id: ServiceId,
        container_id: String,
    },
    StartContainer {
        app_id: AppId,
        service: Box<Service>,
    },
    RemoveNetwork {
        app_id: AppId,
        name: String,
    },
    RemoveVolume {
        app_id: AppId,
        name: String,
    },
    Noop,
}

impl Step {
    pub fn name(&self) -> &'static str {
        match self {
            Step::DownloadImage { .. } => "download_image",
            Step::CreateVolume { .. } => "create_volume",
            Step::CreateNetwork { .. } => "create_network",
            Step::StopContainer { .. } => "stop_container",
            Step::RemoveContainer { .. } => "remove_container",
            Step::StartContainer { .. } => "start_container",
            Step::RemoveNetwork { .. } => "remove_network",
            Step::RemoveVolume { .. } => "remove_volume",
            Step::Noop => "noop",
        }
    }

    /// Structured-logging fields for a `tracing` span, matching the
    /// reference codebase's `Effect::fields()` convention.
    pub fn fields(&self) -> Vec<(&'static str, String)> {
        match self {
            Step::DownloadImage { app_id, image_ref } => vec![
                ("app_id", app_id.to_string()),
                ("image_ref", image_ref.clone()),
            ],
            Step::CreateVolume { app_id, name } | Step::RemoveVolume { app_id, name } => {
                vec![("app_id", app_id.to_string()), ("volume", name.clone())]
            }
            Step::CreateNetwork { app_id, name } | Step::RemoveNetwork { app_id, name } => {
                vec![("app_id", app_id.to_string()), ("network", name.clone())]
            }
            Step::StopContainer {
                service_id,
                container_id,
            }
            | Step::RemoveContainer {
                service_id,
                container_id,
            } => vec![
                ("service_id", service_id.to_string()),
                ("container_id", container_id.clone()),
            ],
            Step::StartContainer { app_id, service } => vec![
                ("app_id", app_id.to_string()),
                ("service_id", service.id.to_string()),
            ],
            Step::Noop => vec![],
        }
    }

    /// The dedicated retry-gating key for this step (spec §4.1).
    pub fn retry_key(&self, app_id: AppId) -> Option<String> {
        match self {
            Step::DownloadImage { image_ref, .. } => Some(format!("image:{image_ref}")),
            Step::StartContainer { service, .. } => {
                Some(format!("service:{app_id}:{}", service.id))
            }
            Step::StopContainer { service_id, .. } | Step::RemoveContainer { service_id, .. } => {
                Some(format!("service:{app_id}:{service_id}"))
            }
            Step::CreateVolume { name, .. } | Step::RemoveVolume { name, .. } => {
                Some(format!("volume:{app_id}:{name}"))
            }
            Step::CreateNetwork { name, .. } | Step::RemoveNetwork { name, .. } => {
                Some(format!("network:{app_id}:{name}"))
            }
            Step::Noop => None,
        }
    }
}

#[cfg(test)]
#[path = "step_tests.rs"]
mod tests;
