// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::app::{Service, ServiceConfig};
use crate::ids::ServiceId;

fn sample_app() -> App {
    App {
        id: AppId::new(1001),
        name: "web".into(),
        uuid: None,
        services: vec![Service {
            id: ServiceId::new(1),
            name: "nginx".into(),
            image_ref: "nginx:alpine".into(),
            config: ServiceConfig {
                image: "nginx:alpine".into(),
                ..Default::default()
            },
        }],
    }
}

#[test]
fn identical_snapshots_hash_identically() {
    let mut a = StateSnapshot::empty();
    a.apps.insert(AppId::new(1001), sample_app());
    let mut b = StateSnapshot::empty();
    b.apps.insert(AppId::new(1001), sample_app());
    assert_eq!(a.content_hash().to_hex(), b.content_hash().to_hex());
}

#[test]
fn differing_snapshots_hash_differently() {
    let mut a = StateSnapshot::empty();
    a.apps.insert(AppId::new(1001), sample_app());
    let b = StateSnapshot::empty();
    assert_ne!(a.content_hash().to_hex(), b.content_hash().to_hex());
}

#[test]
fn hash_independent_of_insertion_order() {
    let mut app2 = sample_app();
    app2.id = AppId::new(2002);
    let mut a = StateSnapshot::empty();
    a.apps.insert(AppId::new(1001), sample_app());
    a.apps.insert(AppId::new(2002), app2.clone());

    let mut b = StateSnapshot::empty();
    b.apps.insert(AppId::new(2002), app2);
    b.apps.insert(AppId::new(1001), sample_app());

    assert_eq!(a.content_hash().to_hex(), b.content_hash().to_hex());
}
