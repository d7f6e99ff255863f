// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::fake::FakeBusClient;
use super::*;

#[tokio::test]
async fn publish_is_recorded() {
    let (client, _rx) = FakeBusClient::new();
    client
        .publish("iot/device/d1/shadow/name/main/update", b"{}".to_vec())
        .await
        .unwrap();
    let published = client.published();
    assert_eq!(published.len(), 1);
    assert_eq!(published[0].topic, "iot/device/d1/shadow/name/main/update");
}

#[tokio::test]
async fn injected_message_delivered_only_when_subscribed() {
    let (client, mut rx) = FakeBusClient::new();
    client.inject("iot/device/d1/shadow/name/main/update/delta", b"{}".to_vec());
    assert!(rx.try_recv().is_err());

    client
        .subscribe("iot/device/d1/shadow/name/main/update/#")
        .await
        .unwrap();
    client.inject("iot/device/d1/shadow/name/main/update/delta", b"{\"x\":1}".to_vec());
    let message = rx.recv().await.unwrap();
    assert_eq!(message.topic, "iot/device/d1/shadow/name/main/update/delta");
    assert_eq!(message.payload, b"{\"x\":1}");
}
