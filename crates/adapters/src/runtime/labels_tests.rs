// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use dsup_core::{AppId, ServiceConfig, ServiceId};

#[test]
fn service_labels_carry_management_tuple() {
    let app = App {
        id: AppId::new(1001),
        name: "web".into(),
        uuid: None,
        services: vec![],
    };
    let service = Service {
        id: ServiceId::new(1),
        name: "nginx".into(),
        image_ref: "nginx:alpine".into(),
        config: ServiceConfig::default(),
    };
    let labels = service_labels(&app, &service);
    assert_eq!(labels.get(MANAGED_LABEL), Some(&"true".to_string()));
    assert_eq!(labels.get(APP_ID_LABEL), Some(&"1001".to_string()));
    assert_eq!(labels.get(SERVICE_ID_LABEL), Some(&"1".to_string()));
    assert_eq!(labels.get(SERVICE_NAME_LABEL), Some(&"nginx".to_string()));
}

#[test]
fn managed_label_filter_requires_true() {
    let filter = managed_label_filter();
    assert_eq!(filter.get("label").unwrap(), &vec!["managed=true".to_string()]);
}
