// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! StateSnapshot — the `current`/`target` documents the reconciler diffs.

use crate::app::App;
use crate::ids::AppId;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SnapshotKind {
    Current,
    Target,
}

crate::simple_display! {
    SnapshotKind {
        Current => "current",
        Target => "target",
    }
}

/// A 32-byte content digest over the canonical serialization of a
/// [`StateSnapshot`]. `BTreeMap` keeps `apps` in a stable key order so the
/// digest is deterministic regardless of insertion order.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct ContentHash(pub [u8; 32]);

impl ContentHash {
    pub fn to_hex(self) -> String {
        self.0.iter().map(|b| format!("{b:02x}")).collect()
    }
}

impl fmt::Debug for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ContentHash({})", self.to_hex())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateSnapshot {
    pub apps: BTreeMap<AppId, App>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config: Option<serde_json::Value>,
}

impl StateSnapshot {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn app(&self, id: AppId) -> Option<&App> {
        self.apps.get(&id)
    }

    /// Stable content hash used for write-elision in the state store
    /// (spec §4.4, Testable Property 3).
    pub fn content_hash(&self) -> ContentHash {
        // BTreeMap<AppId, _> serializes as a JSON object; serde_json
        // preserves the map's own (sorted) iteration order, so this is
        // canonical without a separate key-sort pass.
        #[allow(clippy::expect_used)]
        let canonical =
            serde_json::to_vec(self).expect("StateSnapshot serialization cannot fail");
        let digest = Sha256::digest(&canonical);
        let mut bytes = [0u8; 32];
        bytes.copy_from_slice(&digest);
        ContentHash(bytes)
    }
}

#[cfg(test)]
#[path = "snapshot_tests.rs"]
mod tests;
