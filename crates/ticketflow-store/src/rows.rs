// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Row <-> domain-type conversions for the `sqlx::FromRow` query results.
//!
//! Plain `sqlx::query_as` with hand-written `FromRow` impls (no `query!`
//! macro) so the crate does not need a live database at build time.

use chrono::{DateTime, Utc};
use sqlx::FromRow;
use std::str::FromStr;
use ticketflow_core::{
    ApprovalId, ApprovalRequest, ApprovalStatus, Channel, EventId, EventType, Ticket, TicketEvent,
    TicketId, TicketStatus, WorkerId, WorkflowCheckpoint,
};
use uuid::Uuid;

#[derive(Debug, FromRow)]
pub(crate) struct TicketRow {
    pub id: Uuid,
    pub customer_id: String,
    pub subject: String,
    pub body: String,
    pub channel: String,
    pub metadata: serde_json::Value,
    pub status: String,
    pub result: Option<serde_json::Value>,
    pub worker_id: Option<String>,
    pub attempt_count: i32,
    pub version: i64,
    pub created_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub last_heartbeat: Option<DateTime<Utc>>,
}

impl TicketRow {
    pub(crate) fn into_ticket(self) -> Ticket {
        Ticket {
            id: TicketId::from_uuid(self.id),
            customer_id: self.customer_id,
            subject: self.subject,
            body: self.body,
            channel: Channel::from_str(&self.channel).unwrap_or(Channel::Http),
            metadata: self.metadata.as_object().cloned().unwrap_or_default(),
            status: TicketStatus::from_str(&self.status).unwrap_or(TicketStatus::Pending),
            result: self.result,
            worker_id: self.worker_id.map(WorkerId::new),
            attempt_count: self.attempt_count as u32,
            version: self.version,
            created_at: self.created_at,
            started_at: self.started_at,
            completed_at: self.completed_at,
            last_heartbeat: self.last_heartbeat,
        }
    }
}

#[derive(Debug, FromRow)]
pub(crate) struct EventRow {
    pub id: Uuid,
    pub ticket_id: Uuid,
    pub event_type: String,
    pub step_name: Option<String>,
    pub payload: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

impl EventRow {
    pub(crate) fn into_event(self) -> TicketEvent {
        TicketEvent {
            id: EventId::from_uuid(self.id),
            ticket_id: TicketId::from_uuid(self.ticket_id),
            event_type: EventType::from_str(&self.event_type).unwrap_or(EventType::Error),
            step_name: self.step_name,
            payload: self.payload.as_object().cloned().unwrap_or_default(),
            created_at: self.created_at,
        }
    }
}

#[derive(Debug, FromRow)]
pub(crate) struct CheckpointRow {
    pub ticket_id: Uuid,
    pub state: serde_json::Value,
    pub current_step: String,
    pub updated_at: DateTime<Utc>,
}

impl CheckpointRow {
    pub(crate) fn into_checkpoint(self) -> WorkflowCheckpoint {
        WorkflowCheckpoint {
            ticket_id: TicketId::from_uuid(self.ticket_id),
            state: self.state,
            current_step: self.current_step,
            updated_at: self.updated_at,
        }
    }
}

#[derive(Debug, FromRow)]
pub(crate) struct ApprovalRow {
    pub id: Uuid,
    pub ticket_id: Uuid,
    pub action_type: String,
    pub action_params: serde_json::Value,
    pub status: String,
    pub requested_at: DateTime<Utc>,
    pub decided_at: Option<DateTime<Utc>>,
    pub decided_by: Option<String>,
    pub decision_reason: Option<String>,
}

impl ApprovalRow {
    pub(crate) fn into_approval(self) -> ApprovalRequest {
        ApprovalRequest {
            id: ApprovalId::from_uuid(self.id),
            ticket_id: TicketId::from_uuid(self.ticket_id),
            action_type: self.action_type,
            action_params: self.action_params.as_object().cloned().unwrap_or_default(),
            status: ApprovalStatus::from_str(&self.status).unwrap_or(ApprovalStatus::Pending),
            requested_at: self.requested_at,
            decided_at: self.decided_at,
            decided_by: self.decided_by,
            decision_reason: self.decision_reason,
        }
    }
}
