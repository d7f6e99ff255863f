// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::app::ServiceConfig;

#[test]
fn download_image_retry_key_is_image_scoped() {
    let step = Step::DownloadImage {
        app_id: AppId::new(1001),
        image_ref: "nginx:alpine".into(),
    };
    assert_eq!(step.retry_key(AppId::new(1001)), Some("image:nginx:alpine".to_string()));
    assert_eq!(step.name(), "download_image");
}

#[test]
fn start_container_retry_key_is_service_scoped() {
    let step = Step::StartContainer {
        app_id: AppId::new(1001),
        service: Box::new(Service {
            id: ServiceId::new(1),
            name: "nginx".into(),
            image_ref: "nginx:alpine".into(),
            config: ServiceConfig::default(),
        }),
    };
    assert_eq!(
        step.retry_key(AppId::new(1001)),
        Some("service:1001:1".to_string())
    );
}

#[test]
fn noop_has_no_retry_key() {
    assert_eq!(Step::Noop.retry_key(AppId::new(1)), None);
    assert!(Step::Noop.fields().is_empty());
}
