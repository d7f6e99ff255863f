// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Domain types shared by every crate in the device supervisor workspace:
//! App/Service/ServiceConfig, health probes, state snapshots, retry/backoff,
//! shadow documents, sensors, jobs, and the `Clock` abstraction that makes
//! all of the above deterministically testable.

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic, clippy::unwrap_used, clippy::expect_used))]

#[macro_use]
mod macros;

pub mod app;
pub mod clock;
pub mod error;
pub mod health;
pub mod ids;
pub mod job;
pub mod retry;
pub mod runtime;
pub mod sensor;
pub mod shadow;
pub mod snapshot;
pub mod step;

pub use app::{App, ProbeSet, RestartPolicy, ResourceLimits, Service, ServiceConfig, VolumeMount, PortMapping};
pub use clock::{Clock, FakeClock, SystemClock};
pub use error::{PortMappingError, ResourceLimitError, ValidationError};
pub use health::{HealthProbe, HealthProbeTiming, ProbeEvent, ProbeKind, ProbeRole, ProbeState, ProbeStatus};
pub use ids::{AppId, DeviceId, JobId, ServiceId, ShadowName};
pub use job::{aggregate_results, Job, JobOutcome, JobStatus, JobStep, StepResult};
pub use retry::{RetryState, RetryTable};
pub use runtime::{ErrorKind, ErrorRecord, ServiceRuntime, ServiceStatus};
pub use sensor::{validate_publish_interval, Sensor, SensorConfigEntry, SensorMetrics, SensorSeedEntry};
pub use shadow::{Shadow, ShadowChannel};
pub use snapshot::{ContentHash, SnapshotKind, StateSnapshot};
pub use step::Step;

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;
