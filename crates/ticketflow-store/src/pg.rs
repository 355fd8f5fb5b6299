// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Postgres-backed [`Store`] implementation.
//!
//! Every mutating operation runs inside a single `sqlx::Transaction` so the
//! event log, checkpoint, and ticket row it touches commit atomically.
//! Queries are plain `sqlx::query`/`query_as` calls rather than the `query!`
//! macro, since the latter needs a live database reachable at build time.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use sqlx::{postgres::PgPoolOptions, PgPool, Postgres, Transaction};
use ticketflow_core::{
    ApprovalDecision, ApprovalId, ApprovalRequest, Store, StoreError, Ticket, TicketEvent,
    TicketId, TicketListQuery, TicketPatch, WorkerId, WorkflowCheckpoint,
};

use crate::rows::{ApprovalRow, CheckpointRow, EventRow, TicketRow};

/// `Store` backed by a Postgres connection pool.
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub async fn connect(database_url: &str) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(10)
            .connect(database_url)
            .await
            .map_err(|e| StoreError::StorageUnavailable(e.to_string()))?;
        Ok(Self { pool })
    }

    pub async fn migrate(&self) -> Result<(), StoreError> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| StoreError::StorageUnavailable(e.to_string()))
    }

    /// The underlying pool, so callers can build a [`crate::PgDomainSource`]
    /// against the same connections instead of opening a second pool.
    pub fn pool(&self) -> PgPool {
        self.pool.clone()
    }

    async fn begin(&self) -> Result<Transaction<'_, Postgres>, StoreError> {
        self.pool
            .begin()
            .await
            .map_err(|e| StoreError::StorageUnavailable(e.to_string()))
    }
}

pub(crate) fn classify(err: sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(ref db) = err {
        if db.is_unique_violation() {
            return StoreError::AlreadyExists;
        }
    }
    StoreError::StorageUnavailable(err.to_string())
}

#[async_trait]
impl Store for PgStore {
    async fn create_ticket(&self, ticket: Ticket) -> Result<Ticket, StoreError> {
        let mut tx = self.begin().await?;
        let row: TicketRow = sqlx::query_as(
            r#"
            INSERT INTO tickets
                (id, customer_id, subject, body, channel, metadata, status,
                 result, worker_id, attempt_count, version, created_at,
                 started_at, completed_at, last_heartbeat)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)
            RETURNING *
            "#,
        )
        .bind(ticket.id.as_uuid())
        .bind(&ticket.customer_id)
        .bind(&ticket.subject)
        .bind(&ticket.body)
        .bind(ticket.channel.to_string())
        .bind(Value::Object(ticket.metadata.clone()))
        .bind(ticket.status.to_string())
        .bind(&ticket.result)
        .bind(ticket.worker_id.as_ref().map(WorkerId::as_str))
        .bind(ticket.attempt_count as i32)
        .bind(ticket.version)
        .bind(ticket.created_at)
        .bind(ticket.started_at)
        .bind(ticket.completed_at)
        .bind(ticket.last_heartbeat)
        .fetch_one(&mut *tx)
        .await
        .map_err(classify)?;

        tx.commit()
            .await
            .map_err(|e| StoreError::StorageUnavailable(e.to_string()))?;
        Ok(row.into_ticket())
    }

    async fn get_ticket(&self, id: TicketId) -> Result<Option<Ticket>, StoreError> {
        let row: Option<TicketRow> = sqlx::query_as("SELECT * FROM tickets WHERE id = $1")
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(classify)?;
        Ok(row.map(TicketRow::into_ticket))
    }

    async fn list_tickets(&self, query: TicketListQuery) -> Result<Vec<Ticket>, StoreError> {
        let page_size = query.page_size.max(1) as i64;
        let offset = (query.page.max(1) - 1) as i64 * page_size;
        let rows: Vec<TicketRow> = match query.status {
            Some(status) => {
                sqlx::query_as(
                    "SELECT * FROM tickets WHERE status = $1 \
                     ORDER BY created_at DESC LIMIT $2 OFFSET $3",
                )
                .bind(status.to_string())
                .bind(page_size)
                .bind(offset)
                .fetch_all(&self.pool)
                .await
            }
            None => {
                sqlx::query_as("SELECT * FROM tickets ORDER BY created_at DESC LIMIT $1 OFFSET $2")
                    .bind(page_size)
                    .bind(offset)
                    .fetch_all(&self.pool)
                    .await
            }
        }
        .map_err(classify)?;
        Ok(rows.into_iter().map(TicketRow::into_ticket).collect())
    }

    async fn find_ticket_by_thread(&self, message_id: &str) -> Result<Option<Ticket>, StoreError> {
        let row: Option<TicketRow> = sqlx::query_as(
            "SELECT * FROM tickets WHERE metadata -> 'message_ids' ? $1 LIMIT 1",
        )
        .bind(message_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(classify)?;
        Ok(row.map(TicketRow::into_ticket))
    }

    async fn update_ticket(
        &self,
        id: TicketId,
        patch: TicketPatch,
        expected_version: i64,
    ) -> Result<Ticket, StoreError> {
        let mut tx = self.begin().await?;

        let current: Option<TicketRow> =
            sqlx::query_as("SELECT * FROM tickets WHERE id = $1 FOR UPDATE")
                .bind(id.as_uuid())
                .fetch_optional(&mut *tx)
                .await
                .map_err(classify)?;
        let current = current.ok_or(StoreError::NotFound)?;
        if current.version != expected_version {
            return Err(StoreError::VersionConflict {
                expected: expected_version,
                actual: current.version,
            });
        }

        let mut metadata = current.metadata.as_object().cloned().unwrap_or_default();
        if let Some(merge) = patch.metadata_merge {
            for (k, v) in merge {
                metadata.insert(k, v);
            }
        }

        let status = patch
            .status
            .map(|s| s.to_string())
            .unwrap_or(current.status);
        let worker_id = patch
            .worker_id
            .map(|w| w.as_str().to_string())
            .or(current.worker_id);
        let result = patch.result.or(current.result);
        let attempt_count = patch
            .attempt_count
            .map(|n| n as i32)
            .unwrap_or(current.attempt_count);
        let started_at = patch.started_at.or(current.started_at);
        let completed_at = patch.completed_at.or(current.completed_at);
        let last_heartbeat = patch.last_heartbeat.or(current.last_heartbeat);

        let row: TicketRow = sqlx::query_as(
            r#"
            UPDATE tickets SET
                status = $1, worker_id = $2, result = $3, attempt_count = $4,
                started_at = $5, completed_at = $6, last_heartbeat = $7,
                metadata = $8, version = version + 1
            WHERE id = $9
            RETURNING *
            "#,
        )
        .bind(status)
        .bind(worker_id)
        .bind(result)
        .bind(attempt_count)
        .bind(started_at)
        .bind(completed_at)
        .bind(last_heartbeat)
        .bind(Value::Object(metadata))
        .bind(id.as_uuid())
        .fetch_one(&mut *tx)
        .await
        .map_err(classify)?;

        tx.commit()
            .await
            .map_err(|e| StoreError::StorageUnavailable(e.to_string()))?;
        Ok(row.into_ticket())
    }

    async fn update_heartbeat(&self, id: TicketId, worker_id: &WorkerId) -> Result<(), StoreError> {
        let result = sqlx::query(
            "UPDATE tickets SET last_heartbeat = now(), worker_id = $1 WHERE id = $2",
        )
        .bind(worker_id.as_str())
        .bind(id.as_uuid())
        .execute(&self.pool)
        .await
        .map_err(classify)?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    async fn append_event(&self, event: TicketEvent) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO ticket_events (id, ticket_id, event_type, step_name, payload, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(event.id.as_uuid())
        .bind(event.ticket_id.as_uuid())
        .bind(event.event_type.to_string())
        .bind(event.step_name)
        .bind(Value::Object(event.payload))
        .bind(event.created_at)
        .execute(&self.pool)
        .await
        .map_err(classify)?;
        Ok(())
    }

    async fn list_ticket_events(&self, ticket_id: TicketId) -> Result<Vec<TicketEvent>, StoreError> {
        let rows: Vec<EventRow> = sqlx::query_as(
            "SELECT * FROM ticket_events WHERE ticket_id = $1 ORDER BY created_at ASC",
        )
        .bind(ticket_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(classify)?;
        Ok(rows.into_iter().map(EventRow::into_event).collect())
    }

    async fn upsert_checkpoint(
        &self,
        ticket_id: TicketId,
        state: Value,
        current_step: String,
        updated_at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO workflow_checkpoints (ticket_id, state, current_step, updated_at)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (ticket_id) DO UPDATE SET
                state = EXCLUDED.state,
                current_step = EXCLUDED.current_step,
                updated_at = EXCLUDED.updated_at
            "#,
        )
        .bind(ticket_id.as_uuid())
        .bind(state)
        .bind(current_step)
        .bind(updated_at)
        .execute(&self.pool)
        .await
        .map_err(classify)?;
        Ok(())
    }

    async fn get_checkpoint(
        &self,
        ticket_id: TicketId,
    ) -> Result<Option<WorkflowCheckpoint>, StoreError> {
        let row: Option<CheckpointRow> =
            sqlx::query_as("SELECT * FROM workflow_checkpoints WHERE ticket_id = $1")
                .bind(ticket_id.as_uuid())
                .fetch_optional(&self.pool)
                .await
                .map_err(classify)?;
        Ok(row.map(CheckpointRow::into_checkpoint))
    }

    async fn delete_checkpoint(&self, ticket_id: TicketId) -> Result<(), StoreError> {
        sqlx::query("DELETE FROM workflow_checkpoints WHERE ticket_id = $1")
            .bind(ticket_id.as_uuid())
            .execute(&self.pool)
            .await
            .map_err(classify)?;
        Ok(())
    }

    async fn create_approval(
        &self,
        ticket_id: TicketId,
        action_type: String,
        action_params: Map<String, Value>,
        requested_at: DateTime<Utc>,
    ) -> Result<ApprovalRequest, StoreError> {
        let approval = ApprovalRequest::new(ticket_id, action_type, action_params, requested_at);
        let row: ApprovalRow = sqlx::query_as(
            r#"
            INSERT INTO approval_requests
                (id, ticket_id, action_type, action_params, status, requested_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(approval.id.as_uuid())
        .bind(approval.ticket_id.as_uuid())
        .bind(&approval.action_type)
        .bind(Value::Object(approval.action_params.clone()))
        .bind(approval.status.to_string())
        .bind(approval.requested_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db) = e {
                if db.is_unique_violation() {
                    return StoreError::AlreadyExists;
                }
            }
            StoreError::StorageUnavailable(e.to_string())
        })?;
        Ok(row.into_approval())
    }

    async fn get_approval(&self, id: ApprovalId) -> Result<Option<ApprovalRequest>, StoreError> {
        let row: Option<ApprovalRow> = sqlx::query_as("SELECT * FROM approval_requests WHERE id = $1")
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(classify)?;
        Ok(row.map(ApprovalRow::into_approval))
    }

    async fn list_pending_approvals(&self) -> Result<Vec<ApprovalRequest>, StoreError> {
        let rows: Vec<ApprovalRow> = sqlx::query_as(
            "SELECT * FROM approval_requests WHERE status = 'pending' ORDER BY requested_at ASC",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(classify)?;
        Ok(rows.into_iter().map(ApprovalRow::into_approval).collect())
    }

    async fn decide_approval(
        &self,
        id: ApprovalId,
        decision: ApprovalDecision,
        decided_at: DateTime<Utc>,
    ) -> Result<Option<ApprovalRequest>, StoreError> {
        let status = if decision.approved { "approved" } else { "rejected" };
        let row: Option<ApprovalRow> = sqlx::query_as(
            r#"
            UPDATE approval_requests SET
                status = $1, decided_at = $2, decided_by = $3, decision_reason = $4
            WHERE id = $5 AND status = 'pending'
            RETURNING *
            "#,
        )
        .bind(status)
        .bind(decided_at)
        .bind(&decision.decided_by)
        .bind(&decision.reason)
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(classify)?;
        Ok(row.map(ApprovalRow::into_approval))
    }
}
