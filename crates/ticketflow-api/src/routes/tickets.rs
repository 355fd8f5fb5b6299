// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::Json;
use chrono::Utc;
use ticketflow_core::{Store, TicketId, TicketListQuery};
use ticketflow_ingest::ingest_http;

use crate::dto::{
    CreateTicketRequest, EventResponse, ListTicketsQuery, TicketCreatedResponse, TicketResponse,
};
use crate::error::ApiError;
use crate::state::AppState;

pub async fn create_ticket(
    State(state): State<AppState>,
    Json(req): Json<CreateTicketRequest>,
) -> Result<(StatusCode, Json<TicketCreatedResponse>), ApiError> {
    req.validate()?;
    let outcome = ingest_http(
        state.store.as_ref(),
        state.broker.as_ref(),
        &req.customer_id,
        &req.subject,
        &req.body,
        Utc::now(),
    )
    .await?;
    let status = if outcome.created { StatusCode::CREATED } else { StatusCode::OK };
    Ok((
        status,
        Json(TicketCreatedResponse {
            ticket_id: outcome.ticket_id,
            status: outcome.status,
        }),
    ))
}

pub async fn list_tickets(
    State(state): State<AppState>,
    Query(q): Query<ListTicketsQuery>,
) -> Result<Json<Vec<TicketResponse>>, ApiError> {
    let tickets = state
        .store
        .list_tickets(TicketListQuery {
            page: q.page.unwrap_or(1),
            page_size: q.page_size.unwrap_or(20),
            status: q.status,
        })
        .await?;
    Ok(Json(tickets.into_iter().map(TicketResponse::from).collect()))
}

pub async fn get_ticket(
    State(state): State<AppState>,
    Path(id): Path<TicketId>,
) -> Result<Json<TicketResponse>, ApiError> {
    let ticket = state.store.get_ticket(id).await?.ok_or(ApiError::NotFound)?;
    Ok(Json(ticket.into()))
}

pub async fn get_ticket_events(
    State(state): State<AppState>,
    Path(id): Path<TicketId>,
) -> Result<Json<Vec<EventResponse>>, ApiError> {
    if state.store.get_ticket(id).await?.is_none() {
        return Err(ApiError::NotFound);
    }
    let events = state.store.list_ticket_events(id).await?;
    Ok(Json(events.into_iter().map(EventResponse::from).collect()))
}
