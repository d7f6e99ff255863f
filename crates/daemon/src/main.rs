// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Device supervisor entrypoint: wires logging, builds the [`Supervisor`],
//! serves the diagnostic HTTP port, and waits for a termination signal.

mod config;
mod diagnostics;
mod supervisor;

use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

use supervisor::Supervisor;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logging();

    let supervisor = match Supervisor::start().await {
        Ok(supervisor) => Arc::new(supervisor),
        Err(err) => {
            // Fatal per spec §7: cannot open state store / missing
            // credentials. The init system is expected to restart us.
            tracing::error!(error = %err, "fatal startup failure");
            return Err(err.into());
        }
    };

    let diagnostics_token = CancellationToken::new();
    if let Some(port) = config::device_api_port() {
        let supervisor = supervisor.clone();
        let token = diagnostics_token.clone();
        tokio::spawn(async move { diagnostics::serve(port, supervisor, token).await });
    }

    wait_for_shutdown_signal().await;
    tracing::info!("shutdown signal received, draining");
    diagnostics_token.cancel();
    supervisor.shutdown().await;
    Ok(())
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    match config::log_format() {
        config::LogFormat::Json => builder.json().init(),
        config::LogFormat::Pretty => builder.init(),
    }
}

async fn wait_for_shutdown_signal() {
    let ctrl_c = async {
        let _ = tokio::signal::ctrl_c().await;
    };

    #[cfg(unix)]
    let terminate = async {
        let Ok(mut signal) = tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) else {
            return;
        };
        signal.recv().await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
