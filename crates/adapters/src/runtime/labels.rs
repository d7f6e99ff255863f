// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Canonical management labels (spec §6). Every managed-container query
//! filters by these; every create attaches them; anything else is foreign
//! and invisible (Design Notes: "label-based container ownership").

use dsup_core::{App, Service};
use std::collections::HashMap;

pub const MANAGED_LABEL: &str = "managed";
pub const APP_ID_LABEL: &str = "app-id";
pub const APP_NAME_LABEL: &str = "app-name";
pub const SERVICE_ID_LABEL: &str = "service-id";
pub const SERVICE_NAME_LABEL: &str = "service-name";

/// Labels bollard should filter `list_containers` by.
pub fn managed_label_filter() -> HashMap<String, Vec<String>> {
    let mut filters = HashMap::new();
    filters.insert(
        "label".to_string(),
        vec![format!("{MANAGED_LABEL}=true")],
    );
    filters
}

/// Labels attached on container create (spec §6, Invariant 1).
pub fn service_labels(app: &App, service: &Service) -> HashMap<String, String> {
    let mut labels: HashMap<String, String> = service.config.labels.clone().into_iter().collect();
    labels.insert(MANAGED_LABEL.to_string(), "true".to_string());
    labels.insert(APP_ID_LABEL.to_string(), app.id.to_string());
    labels.insert(APP_NAME_LABEL.to_string(), app.name.clone());
    labels.insert(SERVICE_ID_LABEL.to_string(), service.id.to_string());
    labels.insert(SERVICE_NAME_LABEL.to_string(), service.name.clone());
    labels
}

#[cfg(test)]
#[path = "labels_tests.rs"]
mod tests;
