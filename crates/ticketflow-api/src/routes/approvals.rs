// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use axum::extract::{Path, State};
use axum::response::Json;
use chrono::Utc;
use ticketflow_core::{ApprovalDecision, ApprovalId};

use crate::dto::{ApprovalResponse, DecideApprovalRequest, DecideApprovalResponse};
use crate::error::ApiError;
use crate::state::AppState;

pub async fn list_pending_approvals(
    State(state): State<AppState>,
) -> Result<Json<Vec<ApprovalResponse>>, ApiError> {
    let approvals = state.store.list_pending_approvals().await?;
    Ok(Json(approvals.into_iter().map(ApprovalResponse::from).collect()))
}

pub async fn get_approval(
    State(state): State<AppState>,
    Path(id): Path<ApprovalId>,
) -> Result<Json<ApprovalResponse>, ApiError> {
    let approval = state.store.get_approval(id).await?.ok_or(ApiError::NotFound)?;
    Ok(Json(approval.into()))
}

pub async fn decide_approval(
    State(state): State<AppState>,
    Path(id): Path<ApprovalId>,
    Json(req): Json<DecideApprovalRequest>,
) -> Result<Json<DecideApprovalResponse>, ApiError> {
    let decision = ApprovalDecision {
        approved: req.approved,
        decided_by: req.decided_by,
        reason: req.reason,
    };
    let outcome = ticketflow_approval::decide(
        state.store.as_ref(),
        state.tools.as_ref(),
        state.domain.as_ref(),
        id,
        decision,
        Utc::now(),
    )
    .await?;
    Ok(Json(DecideApprovalResponse {
        approval_id: outcome.approval_id,
        ticket_id: outcome.ticket_id,
        status: outcome.status,
        action_executed: outcome.action_executed,
        message: outcome.message,
    }))
}
