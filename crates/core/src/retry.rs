// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Retry/backoff state keyed per reconciliation step (spec §4.1).

use crate::clock::Clock;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

pub const BACKOFF_BASE: Duration = Duration::from_secs(10);
pub const BACKOFF_FACTOR: u32 = 2;
pub const BACKOFF_CAP: Duration = Duration::from_secs(5 * 60);

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryState {
    pub failure_count: u32,
    pub last_failure_time_ms: Option<u64>,
    pub next_retry_time_ms: Option<u64>,
    pub last_error: Option<String>,
    current_delay_ms: u64,
}

impl RetryState {
    /// Record a failure at `now_ms`, doubling the backoff delay (capped).
    pub fn record_failure(&mut self, now_ms: u64, error: impl Into<String>) {
        self.failure_count += 1;
        self.last_failure_time_ms = Some(now_ms);
        self.last_error = Some(error.into());

        self.current_delay_ms = if self.current_delay_ms == 0 {
            BACKOFF_BASE.as_millis() as u64
        } else {
            (self.current_delay_ms * BACKOFF_FACTOR as u64).min(BACKOFF_CAP.as_millis() as u64)
        };
        self.next_retry_time_ms = Some(now_ms + self.current_delay_ms);
    }

    pub fn is_gated(&self, now_ms: u64) -> bool {
        matches!(self.next_retry_time_ms, Some(next) if next > now_ms)
    }
}

/// Thread-safe table of [`RetryState`] keyed by the reconciler's dedicated
/// step keys (`image:<ref>`, `service:<appId>:<serviceId>`, ...).
#[derive(Clone)]
pub struct RetryTable<C: Clock> {
    clock: C,
    states: Arc<Mutex<HashMap<String, RetryState>>>,
}

impl<C: Clock> RetryTable<C> {
    pub fn new(clock: C) -> Self {
        Self {
            clock,
            states: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    pub fn is_gated(&self, key: &str) -> bool {
        let now = self.clock.epoch_ms();
        self.states
            .lock()
            .get(key)
            .is_some_and(|s| s.is_gated(now))
    }

    pub fn record_failure(&self, key: &str, error: impl Into<String>) {
        let now = self.clock.epoch_ms();
        self.states
            .lock()
            .entry(key.to_string())
            .or_default()
            .record_failure(now, error);
    }

    pub fn clear(&self, key: &str) {
        self.states.lock().remove(key);
    }

    pub fn get(&self, key: &str) -> Option<RetryState> {
        self.states.lock().get(key).cloned()
    }
}

#[cfg(test)]
#[path = "retry_tests.rs"]
mod tests;
