// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Request/response DTOs and the manual bound checks that stand in for a
//! `validator`-derive: subject/body/customer_id length limits.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ticketflow_core::{ApprovalId, ApprovalRequest, ApprovalStatus, Ticket, TicketEvent, TicketId, TicketStatus};

use crate::error::ApiError;

const SUBJECT_MAX: usize = 500;
const BODY_MAX: usize = 10_000;
const CUSTOMER_ID_MAX: usize = 100;

#[derive(Debug, Deserialize)]
pub struct CreateTicketRequest {
    pub subject: String,
    pub body: String,
    pub customer_id: String,
}

impl CreateTicketRequest {
    pub fn validate(&self) -> Result<(), ApiError> {
        if self.subject.is_empty() || self.subject.chars().count() > SUBJECT_MAX {
            return Err(ApiError::BadRequest(format!(
                "subject must be 1-{SUBJECT_MAX} characters"
            )));
        }
        if self.body.is_empty() || self.body.chars().count() > BODY_MAX {
            return Err(ApiError::BadRequest(format!("body must be 1-{BODY_MAX} characters")));
        }
        if self.customer_id.is_empty() || self.customer_id.chars().count() > CUSTOMER_ID_MAX {
            return Err(ApiError::BadRequest(format!(
                "customer_id must be 1-{CUSTOMER_ID_MAX} characters"
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Serialize)]
pub struct TicketCreatedResponse {
    pub ticket_id: TicketId,
    pub status: TicketStatus,
}

#[derive(Debug, Deserialize, Default)]
pub struct ListTicketsQuery {
    pub page: Option<u32>,
    pub page_size: Option<u32>,
    pub status: Option<TicketStatus>,
}

#[derive(Debug, Serialize)]
pub struct TicketResponse {
    pub id: TicketId,
    pub customer_id: String,
    pub subject: String,
    pub body: String,
    pub status: TicketStatus,
    pub result: Option<serde_json::Value>,
    pub worker_id: Option<String>,
    pub attempt_count: u32,
    pub version: i64,
    pub created_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl From<Ticket> for TicketResponse {
    fn from(t: Ticket) -> Self {
        Self {
            id: t.id,
            customer_id: t.customer_id,
            subject: t.subject,
            body: t.body,
            status: t.status,
            result: t.result,
            worker_id: t.worker_id.map(|w| w.to_string()),
            attempt_count: t.attempt_count,
            version: t.version,
            created_at: t.created_at,
            started_at: t.started_at,
            completed_at: t.completed_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct EventResponse {
    pub id: String,
    pub event_type: String,
    pub step_name: Option<String>,
    pub payload: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

impl From<TicketEvent> for EventResponse {
    fn from(e: TicketEvent) -> Self {
        Self {
            id: e.id.to_string(),
            event_type: e.event_type.to_string(),
            step_name: e.step_name,
            payload: serde_json::Value::Object(e.payload),
            created_at: e.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ApprovalResponse {
    pub id: ApprovalId,
    pub ticket_id: TicketId,
    pub action_type: String,
    pub action_params: serde_json::Value,
    pub status: ApprovalStatus,
    pub requested_at: DateTime<Utc>,
    pub decided_at: Option<DateTime<Utc>>,
    pub decided_by: Option<String>,
    pub decision_reason: Option<String>,
}

impl From<ApprovalRequest> for ApprovalResponse {
    fn from(a: ApprovalRequest) -> Self {
        Self {
            id: a.id,
            ticket_id: a.ticket_id,
            action_type: a.action_type,
            action_params: serde_json::Value::Object(a.action_params),
            status: a.status,
            requested_at: a.requested_at,
            decided_at: a.decided_at,
            decided_by: a.decided_by,
            decision_reason: a.decision_reason,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct DecideApprovalRequest {
    pub approved: bool,
    pub decided_by: String,
    pub reason: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct DecideApprovalResponse {
    pub approval_id: ApprovalId,
    pub ticket_id: TicketId,
    pub status: TicketStatus,
    pub action_executed: bool,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub database: &'static str,
    pub queue: &'static str,
}
