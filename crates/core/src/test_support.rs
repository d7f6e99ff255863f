// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Re-exports of the `builder!`-generated test builders, gated by the
//! `test-support` feature so `dsup-engine`/`dsup-adapters` dev-dependencies
//! can construct fixtures without duplicating field lists.

pub use crate::app::{AppBuilder, ServiceBuilder};
pub use crate::sensor::SensorBuilder;
