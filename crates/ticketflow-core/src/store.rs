// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The `Store` trait: transactional record of tickets, events, checkpoints,
//! and approvals, with optimistic-locked updates.

use crate::approval::{ApprovalDecision, ApprovalRequest};
use crate::checkpoint::WorkflowCheckpoint;
use crate::error::StoreError;
use crate::event::TicketEvent;
use crate::ids::{ApprovalId, TicketId, WorkerId};
use crate::ticket::{Ticket, TicketPatch, TicketStatus};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::{Map, Value};

/// A page of tickets, optionally filtered by status.
#[derive(Debug, Clone, Default)]
pub struct TicketListQuery {
    pub page: u32,
    pub page_size: u32,
    pub status: Option<TicketStatus>,
}

#[async_trait]
pub trait Store: Send + Sync {
    /// Insert at version=1, status=pending. Fails with `AlreadyExists` if
    /// `ticket.id` already exists.
    async fn create_ticket(&self, ticket: Ticket) -> Result<Ticket, StoreError>;

    async fn get_ticket(&self, id: TicketId) -> Result<Option<Ticket>, StoreError>;

    async fn list_tickets(&self, query: TicketListQuery) -> Result<Vec<Ticket>, StoreError>;

    /// Look up a ticket whose `metadata.message_ids` array contains
    /// `message_id`, for email thread-reply matching.
    async fn find_ticket_by_thread(&self, message_id: &str) -> Result<Option<Ticket>, StoreError>;

    /// CAS on `version`; fails `VersionConflict` on mismatch, `NotFound` if
    /// absent. Always increments `version` by exactly 1 on success.
    async fn update_ticket(
        &self,
        id: TicketId,
        patch: TicketPatch,
        expected_version: i64,
    ) -> Result<Ticket, StoreError>;

    /// Sets `last_heartbeat` and `worker_id` only, via a dedicated path with
    /// no `version` predicate and no `version` bump.
    /// Must never race a concurrent `update_ticket` issued by the same
    /// worker for the same ticket.
    async fn update_heartbeat(&self, id: TicketId, worker_id: &WorkerId) -> Result<(), StoreError>;

    /// Unconditional insert; events are never mutated or deleted.
    async fn append_event(&self, event: TicketEvent) -> Result<(), StoreError>;

    async fn list_ticket_events(&self, ticket_id: TicketId) -> Result<Vec<TicketEvent>, StoreError>;

    async fn upsert_checkpoint(
        &self,
        ticket_id: TicketId,
        state: Value,
        current_step: String,
        updated_at: DateTime<Utc>,
    ) -> Result<(), StoreError>;

    async fn get_checkpoint(
        &self,
        ticket_id: TicketId,
    ) -> Result<Option<WorkflowCheckpoint>, StoreError>;

    async fn delete_checkpoint(&self, ticket_id: TicketId) -> Result<(), StoreError>;

    async fn create_approval(
        &self,
        ticket_id: TicketId,
        action_type: String,
        action_params: Map<String, Value>,
        requested_at: DateTime<Utc>,
    ) -> Result<ApprovalRequest, StoreError>;

    async fn get_approval(&self, id: ApprovalId) -> Result<Option<ApprovalRequest>, StoreError>;

    async fn list_pending_approvals(&self) -> Result<Vec<ApprovalRequest>, StoreError>;

    /// CAS on `status = pending`; returns `Ok(None)` if the approval was not
    /// still pending (the caller reports this as `AlreadyDecided`).
    async fn decide_approval(
        &self,
        id: ApprovalId,
        decision: ApprovalDecision,
        decided_at: DateTime<Utc>,
    ) -> Result<Option<ApprovalRequest>, StoreError>;
}
