// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use dsup_adapters::FakeRuntimeAdapter;
use dsup_core::FakeClock;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

/// One-shot HTTP responder mirroring `dsup-adapters`' `CloudClient` test
/// helper — good enough to exercise the poller loops without a mocking
/// crate the rest of the stack never uses.
async fn one_shot_server(response: &'static str) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        if let Ok((mut socket, _)) = listener.accept().await {
            let mut buf = [0u8; 1024];
            let _ = socket.read(&mut buf).await;
            let _ = socket.write_all(response.as_bytes()).await;
            let _ = socket.shutdown().await;
        }
    });
    format!("http://{addr}")
}

fn poller(base_url: String) -> (tempfile::TempDir, CloudPoller<FakeClock>) {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(StateStore::open(dir.path().join("state.json")).unwrap());
    let clock = FakeClock::new();
    let reconciler = Arc::new(
        Reconciler::new(Arc::new(FakeRuntimeAdapter::new()), store.clone(), clock.clone(), None).unwrap(),
    );
    let cloud = Arc::new(CloudClient::new(base_url, "device-1", "token"));
    (dir, CloudPoller::new(cloud, store, reconciler, clock))
}

#[tokio::test]
async fn poll_target_once_adopts_a_fresh_target_and_runs_the_reconciler() {
    let body = r#"{"apps":{}}"#;
    let response = format!(
        "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nETag: \"v1\"\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        body.len(),
        body
    );
    let response: &'static str = Box::leak(response.into_boxed_str());
    let base_url = one_shot_server(response).await;
    let (_dir, poller) = poller(base_url);

    poller.poll_target_once().await;

    assert_eq!(poller.etag.lock().as_deref(), Some("\"v1\""));
}

#[tokio::test]
async fn poll_target_once_leaves_etag_unset_on_not_modified() {
    let response = "HTTP/1.1 304 Not Modified\r\nConnection: close\r\n\r\n";
    let base_url = one_shot_server(response).await;
    let (_dir, poller) = poller(base_url);

    poller.poll_target_once().await;

    assert!(poller.etag.lock().is_none());
}

#[tokio::test]
async fn transport_failure_gates_the_next_poll_via_backoff() {
    // Nothing is listening on this port: every request fails immediately.
    let (_dir, poller) = poller("http://127.0.0.1:1".to_string());

    poller.poll_target_once().await;

    assert!(poller.retries.is_gated(TARGET_POLL_RETRY_KEY));
}

#[test]
fn report_document_includes_host_metrics_and_is_serializable() {
    let (_dir, poller) = poller("http://127.0.0.1:1".to_string());
    let doc = poller.build_report_document();
    assert!(doc["host"]["uptimeSecs"].is_u64());
    assert!(doc["services"].is_array());
}
