// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! HTTP entry point: serves `ticketflow-api`'s router over the configured
//! bind address until interrupted.

use anyhow::{Context, Result};
use tracing::info;

use ticketflow_api::{build_router, AppState};
use ticketflow_cli::bootstrap;

#[tokio::main]
async fn main() -> Result<()> {
    bootstrap::init_tracing()?;

    let runtime = bootstrap::build().await?;
    let addr = runtime.config.api_bind_addr.clone();

    let state = AppState {
        store: runtime.store,
        broker: runtime.broker,
        domain: runtime.domain,
        tools: runtime.tools,
    };
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("binding {addr}"))?;
    info!(%addr, "ticketflow-api listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("serving http")?;

    Ok(())
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
    info!("shutdown signal received");
}
