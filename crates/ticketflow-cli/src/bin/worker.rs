// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Worker entry point: runs `TicketWorker::run` until interrupted, letting
//! in-flight deliveries fall back to broker-side redelivery on shutdown.

use anyhow::Result;
use tokio_util::sync::CancellationToken;
use tracing::info;

use ticketflow_core::WorkerId;
use ticketflow_cli::bootstrap;
use ticketflow_worker::TicketWorker;

#[tokio::main]
async fn main() -> Result<()> {
    bootstrap::init_tracing()?;

    let runtime = bootstrap::build().await?;
    let worker_id = WorkerId::new(runtime.config.worker_id.clone());

    let worker = TicketWorker::new(
        runtime.store,
        runtime.broker,
        runtime.workflow,
        worker_id,
        runtime.config.max_retries,
        runtime.config.stale_processing_threshold,
    );

    let shutdown = CancellationToken::new();
    let shutdown_handle = shutdown.clone();
    tokio::spawn(async move {
        let _ = tokio::signal::ctrl_c().await;
        info!("shutdown signal received");
        shutdown_handle.cancel();
    });

    worker.run(shutdown).await;
    Ok(())
}
