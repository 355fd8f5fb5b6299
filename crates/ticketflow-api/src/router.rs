// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Route table and the `X-Request-ID` / access-log middleware every
//! response carries, including unhandled-error 500s.

use axum::http::{HeaderName, Request};
use axum::routing::{get, post};
use axum::Router;
use tower_http::request_id::{MakeRequestId, PropagateRequestIdLayer, RequestId, SetRequestIdLayer};
use tower_http::trace::TraceLayer;

use crate::routes::{approvals, health, tickets, webhooks};
use crate::state::AppState;

const REQUEST_ID_HEADER: &str = "x-request-id";

#[derive(Clone, Default)]
struct MakeUuidRequestId;

impl MakeRequestId for MakeUuidRequestId {
    fn make_request_id<B>(&mut self, _request: &Request<B>) -> Option<RequestId> {
        let id = uuid::Uuid::new_v4().to_string();
        id.parse().ok().map(RequestId::new)
    }
}

pub fn build_router(state: AppState) -> Router {
    let header = HeaderName::from_static(REQUEST_ID_HEADER);
    Router::new()
        .route("/tickets", post(tickets::create_ticket).get(tickets::list_tickets))
        .route("/tickets/:id", get(tickets::get_ticket))
        .route("/tickets/:id/events", get(tickets::get_ticket_events))
        .route("/approvals", get(approvals::list_pending_approvals))
        .route("/approvals/:id", get(approvals::get_approval))
        .route("/approvals/:id/decide", post(approvals::decide_approval))
        .route("/health", get(health::health))
        .route("/webhooks/email/:provider", post(webhooks::email_webhook))
        .with_state(state)
        .layer(PropagateRequestIdLayer::new(header.clone()))
        .layer(TraceLayer::new_for_http())
        .layer(SetRequestIdLayer::new(header, MakeUuidRequestId))
}
