// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shadow document model (spec §4.5) — a versioned `{reported, desired}`
//! pair synchronized with the cloud over the message bus.

use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Shadow {
    pub name: String,
    pub reported: Value,
    pub desired: Value,
    pub version: u64,
}

impl Shadow {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            reported: Value::Object(Default::default()),
            desired: Value::Object(Default::default()),
            version: 0,
        }
    }

    /// The leaf-level difference `desired \ reported` (spec §3 Delta
    /// definition, structural subtraction).
    pub fn delta(&self) -> Value {
        structural_diff(&self.desired, &self.reported)
    }

    /// Bump `version` and return the wire envelope for a `reported` publish
    /// (spec §4.5: `{state:{reported}, version, timestamp}`).
    pub fn next_reported_envelope(&mut self, reported: Value, timestamp: String) -> Value {
        self.reported = reported.clone();
        self.version += 1;
        serde_json::json!({
            "state": { "reported": reported },
            "version": self.version,
            "timestamp": timestamp,
        })
    }
}

/// Leaf-level structural subtraction: keys/values present in `desired` but
/// absent or different in `reported`, recursing into nested objects.
/// Non-object leaves are compared by value equality.
fn structural_diff(desired: &Value, reported: &Value) -> Value {
    match (desired, reported) {
        (Value::Object(d), Value::Object(r)) => {
            let mut out = serde_json::Map::new();
            for (k, dv) in d {
                match r.get(k) {
                    Some(rv) if dv.is_object() && rv.is_object() => {
                        let nested = structural_diff(dv, rv);
                        if nested.as_object().is_some_and(|m| !m.is_empty()) {
                            out.insert(k.clone(), nested);
                        }
                    }
                    Some(rv) if rv == dv => {}
                    _ => {
                        out.insert(k.clone(), dv.clone());
                    }
                }
            }
            Value::Object(out)
        }
        _ => {
            if desired == reported {
                Value::Object(Default::default())
            } else {
                desired.clone()
            }
        }
    }
}

/// The three logical channels a shadow subscribes to (spec §4.5); the
/// `documents` topic is treated as equivalent to `accepted` per
/// DESIGN.md's Open Question 4 resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShadowChannel {
    Accepted,
    Delta,
    Documents,
}

crate::simple_display! {
    ShadowChannel {
        Accepted => "update/accepted",
        Delta => "update/delta",
        Documents => "update/documents",
    }
}

impl ShadowChannel {
    /// Build the full bus topic for this channel (spec §6 topic grammar).
    pub fn topic(self, device_id: &str, shadow_name: &str) -> String {
        format!("iot/device/{device_id}/shadow/name/{shadow_name}/{self}")
    }
}

#[cfg(test)]
#[path = "shadow_tests.rs"]
mod tests;
