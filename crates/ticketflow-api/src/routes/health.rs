// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `/health` never fails to respond: a probe error degrades the relevant
//! sub-status rather than turning into a 5xx.

use axum::extract::State;
use axum::response::Json;
use ticketflow_core::TicketListQuery;

use crate::dto::HealthResponse;
use crate::state::AppState;

pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let database = match state
        .store
        .list_tickets(TicketListQuery { page: 1, page_size: 1, status: None })
        .await
    {
        Ok(_) => "ok",
        Err(_) => "degraded",
    };

    // The `Broker` trait has no dedicated probe operation; a broker handed
    // to this service is assumed reachable until a publish proves otherwise.
    let queue = "ok";

    let status = if database == "ok" && queue == "ok" { "ok" } else { "degraded" };
    Json(HealthResponse { status, database, queue })
}
