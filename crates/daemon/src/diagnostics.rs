// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Local diagnostic HTTP port (spec §6 supplemental): `GET /healthz` and
//! `GET /status`. Hand-rolled raw-TCP request/response, matching the
//! reference codebase's internal HTTP convention for low-traffic internal
//! endpoints (`oj-adapters/src/agent/docker/http.rs`) rather than pulling in
//! a routing framework for two read-only routes.

use crate::supervisor::Supervisor;
use std::sync::Arc;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio_util::sync::CancellationToken;

pub async fn serve(port: u16, supervisor: Arc<Supervisor>, shutdown: CancellationToken) {
    let listener = match TcpListener::bind(("0.0.0.0", port)).await {
        Ok(listener) => listener,
        Err(err) => {
            tracing::error!(error = %err, port, "failed to bind diagnostic port");
            return;
        }
    };
    tracing::info!(port, "diagnostic port listening");

    loop {
        tokio::select! {
            _ = shutdown.cancelled() => return,
            accepted = listener.accept() => {
                let Ok((socket, _)) = accepted else { continue };
                let supervisor = supervisor.clone();
                tokio::spawn(async move { handle_connection(socket, supervisor).await });
            }
        }
    }
}

async fn handle_connection(mut socket: TcpStream, supervisor: Arc<Supervisor>) {
    let mut buf = [0u8; 2048];
    let n = match socket.read(&mut buf).await {
        Ok(n) => n,
        Err(_) => return,
    };
    let request = String::from_utf8_lossy(&buf[..n]);
    let request_line = request.lines().next().unwrap_or("");
    let path = request_line.split_whitespace().nth(1).unwrap_or("/");

    let response = match path {
        "/healthz" => {
            if supervisor.is_ready() {
                text_response(200, "OK")
            } else {
                text_response(503, "not ready")
            }
        }
        "/status" => {
            let snapshot = supervisor.current_snapshot();
            let body = serde_json::json!({
                "apps": snapshot.apps.len(),
                "ready": supervisor.is_ready(),
            })
            .to_string();
            json_response(200, &body)
        }
        _ => text_response(404, "not found"),
    };

    let _ = socket.write_all(response.as_bytes()).await;
    let _ = socket.shutdown().await;
}

fn text_response(status: u16, body: &str) -> String {
    format!(
        "HTTP/1.1 {} {}\r\nContent-Type: text/plain\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        status,
        status_text(status),
        body.len(),
        body
    )
}

fn json_response(status: u16, body: &str) -> String {
    format!(
        "HTTP/1.1 {} {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        status,
        status_text(status),
        body.len(),
        body
    )
}

fn status_text(status: u16) -> &'static str {
    match status {
        200 => "OK",
        404 => "Not Found",
        503 => "Service Unavailable",
        _ => "Unknown",
    }
}
