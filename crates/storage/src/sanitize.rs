// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Schema-versioned upgrade of a persisted snapshot document to the shape
//! [`dsup_core::StateSnapshot`] expects (spec §4.4, Design Notes item
//! "formal upgrade path with a schema version field").

use serde_json::{Map, Value};

/// The current on-disk schema. Rows persisted at an older version are
/// upgraded by [`sanitize`] on read and rewritten at this version on the
/// next write.
pub const CURRENT_SCHEMA_VERSION: u32 = 1;

/// Upgrade a raw snapshot document in place. Safe to call on an
/// already-current document: every step is idempotent.
pub fn sanitize(doc: &mut Value) {
    let Some(apps) = doc.get_mut("apps").and_then(Value::as_object_mut) else {
        return;
    };
    for (key, app) in apps.iter_mut() {
        coerce_numeric_id(app, "id", key);
        if let Some(services) = app.get_mut("services").and_then(Value::as_array_mut) {
            for service in services {
                sanitize_service(service);
            }
        }
    }
}

fn coerce_numeric_id(obj: &mut Value, field: &str, fallback_key: &str) {
    let Some(map) = obj.as_object_mut() else {
        return;
    };
    let needs_coercion = matches!(map.get(field), Some(Value::String(_)) | None);
    if !needs_coercion {
        return;
    }
    let raw = map
        .get(field)
        .and_then(Value::as_str)
        .unwrap_or(fallback_key);
    if let Ok(n) = raw.parse::<i64>() {
        map.insert(field.to_string(), Value::from(n));
    }
}

const FLAT_SERVICE_FIELDS: &[(&str, &str)] = &[
    ("image", "image"),
    ("environment", "env"),
    ("ports", "ports"),
    ("volumes", "volumes"),
    ("networks", "networks"),
    ("restart", "restart_policy"),
    ("labels", "labels"),
];

fn sanitize_service(service: &mut Value) {
    coerce_numeric_id(service, "id", "0");

    let Some(map) = service.as_object_mut() else {
        return;
    };

    let mut promoted: Map<String, Value> = match map.remove("config") {
        Some(Value::Object(existing)) => existing,
        _ => Map::new(),
    };

    for (flat_key, config_key) in FLAT_SERVICE_FIELDS {
        if let Some(value) = map.remove(*flat_key) {
            promoted.entry(config_key.to_string()).or_insert(value);
        }
    }

    if let Some(Value::Array(ports)) = promoted.get_mut("ports") {
        for port in ports.iter_mut() {
            coerce_port_entry(port);
        }
    }

    if let Some(Value::Object(env)) = promoted.get_mut("env") {
        for (_, value) in env.iter_mut() {
            coerce_to_string(value);
        }
    }

    if !promoted.is_empty() {
        map.insert("config".to_string(), Value::Object(promoted));
    }
}

fn coerce_port_entry(port: &mut Value) {
    match port {
        Value::String(_) => {}
        Value::Object(obj) => {
            if let (Some(host), Some(container)) = (obj.get("host"), obj.get("container")) {
                *port = Value::String(format!("{host}:{container}"));
            }
        }
        _ => {}
    }
}

fn coerce_to_string(value: &mut Value) {
    if matches!(value, Value::String(_)) {
        return;
    }
    let replacement = match value {
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        _ => return,
    };
    *value = Value::String(replacement);
}

#[cfg(test)]
#[path = "sanitize_tests.rs"]
mod tests;
