// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

/// Spawns a one-shot HTTP responder that replies `response` to the first
/// connection it accepts, then exits. Good enough to exercise `CloudClient`
/// without pulling in a mocking crate the rest of the stack never uses.
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

#[tokio::test]
async fn fetch_target_state_parses_200_body_and_etag() {
    let body = r#"{"apps":{}}"#;
    let response = format!(
        "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nETag: \"abc123\"\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        body.len(),
        body
    );
    let response: &'static str = Box::leak(response.into_boxed_str());
    let base_url = one_shot_server(response).await;
    let client = CloudClient::new(base_url, "device-1", "token");
    let (value, etag) = client.fetch_target_state(None).await.unwrap().unwrap();
    assert_eq!(value, serde_json::json!({"apps": {}}));
    assert_eq!(etag.as_deref(), Some("\"abc123\""));
}

#[tokio::test]
async fn fetch_target_state_returns_none_on_not_modified() {
    let response = "HTTP/1.1 304 Not Modified\r\nConnection: close\r\n\r\n";
    let base_url = one_shot_server(response).await;
    let client = CloudClient::new(base_url, "device-1", "token");
    let result = client.fetch_target_state(Some("\"abc123\"")).await.unwrap();
    assert!(result.is_none());
}

#[tokio::test]
async fn next_job_returns_none_on_empty_body() {
    let response = "HTTP/1.1 200 OK\r\nContent-Length: 0\r\nConnection: close\r\n\r\n";
    let base_url = one_shot_server(response).await;
    let client = CloudClient::new(base_url, "device-1", "token");
    let job = client.next_job().await.unwrap();
    assert!(job.is_none());
}
