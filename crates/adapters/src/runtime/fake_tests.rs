// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use dsup_core::{AppId, ServiceConfig, ServiceId};

fn app_and_service() -> (App, Service) {
    (
        App {
            id: AppId::new(1001),
            name: "web".into(),
            uuid: None,
            services: vec![],
        },
        Service {
            id: ServiceId::new(1),
            name: "nginx".into(),
            image_ref: "nginx:alpine".into(),
            config: ServiceConfig {
                image: "nginx:alpine".into(),
                ..Default::default()
            },
        },
    )
}

#[tokio::test]
async fn start_then_inspect_roundtrips() {
    let adapter = FakeRuntimeAdapter::new();
    let (app, service) = app_and_service();
    let id = adapter.start_container(&app, &service).await.unwrap();
    let info = adapter.inspect(&id).await.unwrap();
    assert_eq!(info.info.app_id, app.id);
    assert_eq!(info.info.service_id, service.id);
}

#[tokio::test]
async fn pull_image_fails_for_marked_images() {
    let adapter = FakeRuntimeAdapter::new();
    adapter.fail_image_pull("broken:latest");
    assert!(adapter.pull_image("broken:latest").await.is_err());
    assert!(adapter.pull_image("nginx:alpine").await.is_ok());
}

#[tokio::test]
async fn remove_container_is_idempotent() {
    let adapter = FakeRuntimeAdapter::new();
    adapter.remove_container("does-not-exist").await.unwrap();
}

#[tokio::test]
async fn list_managed_containers_reflects_started() {
    let adapter = FakeRuntimeAdapter::new();
    let (app, service) = app_and_service();
    adapter.start_container(&app, &service).await.unwrap();
    assert_eq!(adapter.list_managed_containers().await.unwrap().len(), 1);
}
