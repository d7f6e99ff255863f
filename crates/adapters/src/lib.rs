// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Adapter implementations binding the reconciler, probe manager, shadow
//! synchronizer, and cloud poller to concrete external systems: the
//! container runtime, the local pub/sub bus, and the cloud HTTP API.

pub mod bus;
pub mod cloud;
pub mod probe;
pub mod runtime;
pub mod sensor;

pub use bus::{BusClient, BusError, BusMessage, MqttBusClient};
pub use cloud::{CloudClient, CloudError};
pub use probe::{ExecRunner, ProbeChecker, ProbeError};
pub use runtime::{
    ContainerInfo, DockerRuntimeAdapter, FullContainerInfo, RuntimeAdapter, RuntimeAdapterError,
};
pub use sensor::{SensorError, SensorSource, UnixSensorSource};

#[cfg(feature = "test-support")]
pub use bus::fake::FakeBusClient;
#[cfg(feature = "test-support")]
pub use runtime::FakeRuntimeAdapter;
#[cfg(feature = "test-support")]
pub use sensor::fake::FakeSensorSource;
