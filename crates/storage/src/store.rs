// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The persisted `current`/`target` snapshot slots (spec §4.4, §6).
//!
//! Layout on disk mirrors the spec's `state_snapshot` table: one row per
//! [`dsup_core::SnapshotKind`], each carrying `{schema_version, state,
//! state_hash, created_at}`.

use crate::sanitize::{sanitize, CURRENT_SCHEMA_VERSION};
use chrono::{DateTime, Utc};
use dsup_core::{SnapshotKind, StateSnapshot};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("state store io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("state store serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("corrupt row for slot {slot:?}: {reason}")]
    CorruptRow { slot: SnapshotKind, reason: String },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Row {
    schema_version: u32,
    state: serde_json::Value,
    state_hash: String,
    created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct OnDisk {
    rows: HashMap<String, Row>,
}

/// Two-slot state store: `current` (owned exclusively by the Reconciler)
/// and `target` (owned exclusively by the Cloud Poller).
pub struct StateStore {
    path: PathBuf,
}

fn slot_key(kind: SnapshotKind) -> &'static str {
    match kind {
        SnapshotKind::Current => "current",
        SnapshotKind::Target => "target",
    }
}

impl StateStore {
    /// Open (creating if absent) the single local key-value file backing
    /// both slots.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        if !path.exists() {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            let empty = OnDisk::default();
            std::fs::write(&path, serde_json::to_vec_pretty(&empty)?)?;
        }
        Ok(Self { path })
    }

    fn read_all(&self) -> Result<OnDisk, StoreError> {
        let bytes = std::fs::read(&self.path)?;
        if bytes.is_empty() {
            return Ok(OnDisk::default());
        }
        Ok(serde_json::from_slice(&bytes)?)
    }

    fn write_all(&self, disk: &OnDisk) -> Result<(), StoreError> {
        let tmp = self.path.with_extension("tmp");
        std::fs::write(&tmp, serde_json::to_vec_pretty(disk)?)?;
        std::fs::rename(&tmp, &self.path)?;
        Ok(())
    }

    /// Load a slot, sanitizing/upgrading it if it was persisted at an older
    /// schema version. A corrupt row is logged and treated as an empty slot
    /// (spec: the supervisor must still boot and re-fetch from the cloud).
    pub fn load(&self, kind: SnapshotKind) -> Result<Option<StateSnapshot>, StoreError> {
        let disk = self.read_all()?;
        let Some(row) = disk.rows.get(slot_key(kind)) else {
            return Ok(None);
        };

        let mut state = row.state.clone();
        if row.schema_version < CURRENT_SCHEMA_VERSION {
            sanitize(&mut state);
        }

        match serde_json::from_value::<StateSnapshot>(state) {
            Ok(snapshot) => Ok(Some(snapshot)),
            Err(err) => {
                tracing::error!(slot = %kind, error = %err, "corrupt snapshot row, treating as empty slot");
                Ok(None)
            }
        }
    }

    /// Write a slot. Elided (no-op, returns `false`) when the content hash
    /// equals the last-persisted hash (spec Invariant 6, Testable Property
    /// 3).
    pub fn write(&self, kind: SnapshotKind, snapshot: &StateSnapshot) -> Result<bool, StoreError> {
        let hash = snapshot.content_hash().to_hex();
        let mut disk = self.read_all()?;

        if let Some(existing) = disk.rows.get(slot_key(kind)) {
            if existing.state_hash == hash {
                return Ok(false);
            }
        }

        disk.rows.insert(
            slot_key(kind).to_string(),
            Row {
                schema_version: CURRENT_SCHEMA_VERSION,
                state: serde_json::to_value(snapshot)?,
                state_hash: hash,
                created_at: Utc::now(),
            },
        );
        self.write_all(&disk)?;
        Ok(true)
    }
}

#[cfg(test)]
#[path = "store_tests.rs"]
mod tests;
