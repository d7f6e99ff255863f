// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::fake::FakeSensorSource;
use super::*;

#[tokio::test]
async fn read_message_returns_queued_bytes_in_order() {
    let source = FakeSensorSource::new();
    source.push_message("/run/sensors/temp.sock", b"22.5".to_vec());
    source.push_message("/run/sensors/temp.sock", b"22.6".to_vec());

    assert_eq!(
        source.read_message("/run/sensors/temp.sock").await.unwrap(),
        b"22.5"
    );
    assert_eq!(
        source.read_message("/run/sensors/temp.sock").await.unwrap(),
        b"22.6"
    );
}

#[tokio::test]
async fn read_message_errors_when_disconnected() {
    let source = FakeSensorSource::new();
    source.set_connected("/run/sensors/temp.sock", false);

    let err = source.read_message("/run/sensors/temp.sock").await.unwrap_err();
    assert!(matches!(err, SensorError::Disconnected));
}

#[tokio::test]
async fn read_message_errors_on_empty_queue() {
    let source = FakeSensorSource::new();
    source.push_message("/run/sensors/temp.sock", b"1".to_vec());
    let _ = source.read_message("/run/sensors/temp.sock").await.unwrap();

    let err = source.read_message("/run/sensors/temp.sock").await.unwrap_err();
    assert!(matches!(err, SensorError::Disconnected));
}
