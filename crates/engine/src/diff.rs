// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Pure current/target diff algorithm (spec §4.1). Kept free of I/O and
//! runtime traits so it can be table-tested in isolation, the same
//! separation the reference codebase draws between `decision_builder`-style
//! pure planning and `executor`-style effectful execution.

use dsup_core::{App, AppId, Service, ServiceId, ServiceRuntime, StateSnapshot, Step, VolumeMount};
use std::collections::{BTreeSet, HashMap};

/// Runtime annotations keyed by `(appId, serviceId)` — not part of `App`
/// itself since the same `App`/`Service` types are shared by current and
/// target snapshots (spec §3: "ServiceRuntime — annotation on Service in
/// *current* state only").
pub type RuntimeMap = HashMap<(AppId, ServiceId), ServiceRuntime>;

fn required_volumes(app: &App) -> BTreeSet<String> {
    app.services
        .iter()
        .flat_map(|s| &s.config.volumes)
        .filter_map(|v| match v {
            VolumeMount::Named { volume, .. } => Some(volume.clone()),
            VolumeMount::Bind { .. } => None,
        })
        .collect()
}

fn required_networks(app: &App) -> BTreeSet<String> {
    app.services
        .iter()
        .flat_map(|s| s.config.networks.iter().cloned())
        .collect()
}

fn container_id_of(runtimes: &RuntimeMap, app_id: AppId, service_id: ServiceId) -> Option<String> {
    runtimes
        .get(&(app_id, service_id))
        .and_then(|r| r.container_id.clone())
}

fn stop_and_remove(steps: &mut Vec<Step>, runtimes: &RuntimeMap, app_id: AppId, service: &Service) {
    if let Some(container_id) = container_id_of(runtimes, app_id, service.id) {
        steps.push(Step::StopContainer {
            service_id: service.id,
            container_id: container_id.clone(),
        });
        steps.push(Step::RemoveContainer {
            service_id: service.id,
            container_id,
        });
    }
}

fn download_and_start(steps: &mut Vec<Step>, app_id: AppId, service: &Service) {
    steps.push(Step::DownloadImage {
        app_id,
        image_ref: service.image_ref.clone(),
    });
    steps.push(Step::StartContainer {
        app_id,
        service: Box::new(service.clone()),
    });
}

/// A service's change set against its current counterpart, per spec §4.1.
/// `networkModeChanged` from the spec's prose has no counterpart in
/// `ServiceConfig` (no distinct network-mode field beyond the `networks`
/// set) and is folded into `networks_changed`.
struct ChangeSet {
    image_changed: bool,
    any_changed: bool,
}

fn compute_change_set(current: &Service, target: &Service, container_stopped: bool) -> ChangeSet {
    let image_changed = current.image_ref != target.image_ref;
    let ports_changed = current.config.ports != target.config.ports;
    // Only keys declared in target are compared; runtime-injected env on
    // the current side is ignored (spec §4.1).
    let env_changed = target
        .config
        .env
        .iter()
        .any(|(k, v)| current.config.env.get(k) != Some(v));
    let volumes_changed = current.config.volumes != target.config.volumes;
    let networks_changed = current.config.networks != target.config.networks;
    let restart_changed = target
        .config
        .restart_policy
        .is_some_and(|policy| current.config.restart_policy != Some(policy));

    let any_changed = image_changed
        || ports_changed
        || env_changed
        || volumes_changed
        || networks_changed
        || restart_changed
        || container_stopped;

    ChangeSet {
        image_changed,
        any_changed,
    }
}

/// Produce the ordered step list that brings `current` to `target` (spec
/// §4.1 diff algorithm). Apps are visited in `AppId` order (`StateSnapshot`
/// stores them in a `BTreeMap`) so the plan is deterministic.
pub fn diff(current: &StateSnapshot, target: &StateSnapshot, runtimes: &RuntimeMap) -> Vec<Step> {
    let mut steps = Vec::new();
    let app_ids: BTreeSet<AppId> = current
        .apps
        .keys()
        .chain(target.apps.keys())
        .copied()
        .collect();

    for app_id in app_ids {
        let cur_app = current.app(app_id);
        let tgt_app = target.app(app_id);

        if let Some(tgt_app) = tgt_app {
            let existing_volumes = cur_app.map(required_volumes).unwrap_or_default();
            let existing_networks = cur_app.map(required_networks).unwrap_or_default();
            for name in required_volumes(tgt_app).difference(&existing_volumes) {
                steps.push(Step::CreateVolume {
                    app_id,
                    name: name.clone(),
                });
            }
            for name in required_networks(tgt_app).difference(&existing_networks) {
                steps.push(Step::CreateNetwork {
                    app_id,
                    name: name.clone(),
                });
            }
        }

        match (cur_app, tgt_app) {
            (None, Some(tgt_app)) => {
                for service in &tgt_app.services {
                    download_and_start(&mut steps, app_id, service);
                }
            }
            (Some(cur_app), None) => {
                for service in &cur_app.services {
                    stop_and_remove(&mut steps, runtimes, app_id, service);
                }
            }
            (Some(cur_app), Some(tgt_app)) => {
                for tgt_service in &tgt_app.services {
                    match cur_app.service(tgt_service.id) {
                        None => download_and_start(&mut steps, app_id, tgt_service),
                        Some(cur_service) => {
                            let container_stopped = runtimes
                                .get(&(app_id, cur_service.id))
                                .is_some_and(|r| r.status.is_stopped_kind());
                            let change = compute_change_set(cur_service, tgt_service, container_stopped);
                            if change.any_changed {
                                if change.image_changed {
                                    steps.push(Step::DownloadImage {
                                        app_id,
                                        image_ref: tgt_service.image_ref.clone(),
                                    });
                                }
                                stop_and_remove(&mut steps, runtimes, app_id, cur_service);
                                steps.push(Step::StartContainer {
                                    app_id,
                                    service: Box::new(tgt_service.clone()),
                                });
                            }
                        }
                    }
                }
                for cur_service in &cur_app.services {
                    if tgt_app.service(cur_service.id).is_none() {
                        stop_and_remove(&mut steps, runtimes, app_id, cur_service);
                    }
                }
            }
            (None, None) => {}
        }

        let existing_volumes = cur_app.map(required_volumes).unwrap_or_default();
        let existing_networks = cur_app.map(required_networks).unwrap_or_default();
        let wanted_volumes = tgt_app.map(required_volumes).unwrap_or_default();
        let wanted_networks = tgt_app.map(required_networks).unwrap_or_default();
        for name in existing_networks.difference(&wanted_networks) {
            steps.push(Step::RemoveNetwork {
                app_id,
                name: name.clone(),
            });
        }
        for name in existing_volumes.difference(&wanted_volumes) {
            steps.push(Step::RemoveVolume {
                app_id,
                name: name.clone(),
            });
        }
    }

    steps
}

#[cfg(test)]
#[path = "diff_tests.rs"]
mod tests;
