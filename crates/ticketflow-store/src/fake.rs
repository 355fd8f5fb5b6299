// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-memory [`Store`] double for tests that do not need a live Postgres
//! instance. Mirrors `PgStore`'s CAS and heartbeat semantics exactly.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::Arc;
use ticketflow_core::{
    ApprovalDecision, ApprovalId, ApprovalRequest, Store, StoreError, Ticket, TicketEvent,
    TicketId, TicketListQuery, TicketPatch, WorkerId, WorkflowCheckpoint,
};

#[derive(Default)]
struct Inner {
    tickets: HashMap<TicketId, Ticket>,
    events: HashMap<TicketId, Vec<TicketEvent>>,
    checkpoints: HashMap<TicketId, WorkflowCheckpoint>,
    approvals: HashMap<ApprovalId, ApprovalRequest>,
}

/// Thread-safe in-memory `Store`. Cheap to clone (shares state via `Arc`).
#[derive(Clone, Default)]
pub struct FakeStore {
    inner: Arc<Mutex<Inner>>,
}

impl FakeStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Store for FakeStore {
    async fn create_ticket(&self, ticket: Ticket) -> Result<Ticket, StoreError> {
        let mut inner = self.inner.lock();
        if inner.tickets.contains_key(&ticket.id) {
            return Err(StoreError::AlreadyExists);
        }
        inner.tickets.insert(ticket.id, ticket.clone());
        Ok(ticket)
    }

    async fn get_ticket(&self, id: TicketId) -> Result<Option<Ticket>, StoreError> {
        Ok(self.inner.lock().tickets.get(&id).cloned())
    }

    async fn list_tickets(&self, query: TicketListQuery) -> Result<Vec<Ticket>, StoreError> {
        let inner = self.inner.lock();
        let mut tickets: Vec<Ticket> = inner
            .tickets
            .values()
            .filter(|t| query.status.map(|s| s == t.status).unwrap_or(true))
            .cloned()
            .collect();
        tickets.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        let page_size = query.page_size.max(1) as usize;
        let offset = (query.page.max(1) - 1) as usize * page_size;
        Ok(tickets.into_iter().skip(offset).take(page_size).collect())
    }

    async fn find_ticket_by_thread(&self, message_id: &str) -> Result<Option<Ticket>, StoreError> {
        Ok(self.inner.lock().tickets.values().find(|t| {
            t.metadata
                .get("message_ids")
                .and_then(|v| v.as_array())
                .map(|ids| ids.iter().any(|id| id.as_str() == Some(message_id)))
                .unwrap_or(false)
        }).cloned())
    }

    async fn update_ticket(
        &self,
        id: TicketId,
        patch: TicketPatch,
        expected_version: i64,
    ) -> Result<Ticket, StoreError> {
        let mut inner = self.inner.lock();
        let ticket = inner.tickets.get_mut(&id).ok_or(StoreError::NotFound)?;
        if ticket.version != expected_version {
            return Err(StoreError::VersionConflict {
                expected: expected_version,
                actual: ticket.version,
            });
        }
        if let Some(status) = patch.status {
            ticket.status = status;
        }
        if let Some(worker_id) = patch.worker_id {
            ticket.worker_id = Some(worker_id);
        }
        if let Some(result) = patch.result {
            ticket.result = Some(result);
        }
        if let Some(n) = patch.attempt_count {
            ticket.attempt_count = n;
        }
        if let Some(at) = patch.started_at {
            ticket.started_at = Some(at);
        }
        if let Some(at) = patch.completed_at {
            ticket.completed_at = Some(at);
        }
        if let Some(at) = patch.last_heartbeat {
            ticket.last_heartbeat = Some(at);
        }
        if let Some(merge) = patch.metadata_merge {
            for (k, v) in merge {
                ticket.metadata.insert(k, v);
            }
        }
        ticket.version += 1;
        Ok(ticket.clone())
    }

    async fn update_heartbeat(&self, id: TicketId, worker_id: &WorkerId) -> Result<(), StoreError> {
        let mut inner = self.inner.lock();
        let ticket = inner.tickets.get_mut(&id).ok_or(StoreError::NotFound)?;
        ticket.last_heartbeat = Some(Utc::now());
        ticket.worker_id = Some(worker_id.clone());
        Ok(())
    }

    async fn append_event(&self, event: TicketEvent) -> Result<(), StoreError> {
        self.inner
            .lock()
            .events
            .entry(event.ticket_id)
            .or_default()
            .push(event);
        Ok(())
    }

    async fn list_ticket_events(&self, ticket_id: TicketId) -> Result<Vec<TicketEvent>, StoreError> {
        Ok(self
            .inner
            .lock()
            .events
            .get(&ticket_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn upsert_checkpoint(
        &self,
        ticket_id: TicketId,
        state: Value,
        current_step: String,
        updated_at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        self.inner.lock().checkpoints.insert(
            ticket_id,
            WorkflowCheckpoint {
                ticket_id,
                state,
                current_step,
                updated_at,
            },
        );
        Ok(())
    }

    async fn get_checkpoint(
        &self,
        ticket_id: TicketId,
    ) -> Result<Option<WorkflowCheckpoint>, StoreError> {
        Ok(self.inner.lock().checkpoints.get(&ticket_id).cloned())
    }

    async fn delete_checkpoint(&self, ticket_id: TicketId) -> Result<(), StoreError> {
        self.inner.lock().checkpoints.remove(&ticket_id);
        Ok(())
    }

    async fn create_approval(
        &self,
        ticket_id: TicketId,
        action_type: String,
        action_params: Map<String, Value>,
        requested_at: DateTime<Utc>,
    ) -> Result<ApprovalRequest, StoreError> {
        let mut inner = self.inner.lock();
        if inner
            .approvals
            .values()
            .any(|a| a.ticket_id == ticket_id && a.is_pending())
        {
            return Err(StoreError::AlreadyExists);
        }
        let approval = ApprovalRequest::new(ticket_id, action_type, action_params, requested_at);
        inner.approvals.insert(approval.id, approval.clone());
        Ok(approval)
    }

    async fn get_approval(&self, id: ApprovalId) -> Result<Option<ApprovalRequest>, StoreError> {
        Ok(self.inner.lock().approvals.get(&id).cloned())
    }

    async fn list_pending_approvals(&self) -> Result<Vec<ApprovalRequest>, StoreError> {
        Ok(self
            .inner
            .lock()
            .approvals
            .values()
            .filter(|a| a.is_pending())
            .cloned()
            .collect())
    }

    async fn decide_approval(
        &self,
        id: ApprovalId,
        decision: ApprovalDecision,
        decided_at: DateTime<Utc>,
    ) -> Result<Option<ApprovalRequest>, StoreError> {
        let mut inner = self.inner.lock();
        let approval = match inner.approvals.get_mut(&id) {
            Some(a) if a.is_pending() => a,
            _ => return Ok(None),
        };
        approval.status = if decision.approved {
            ticketflow_core::ApprovalStatus::Approved
        } else {
            ticketflow_core::ApprovalStatus::Rejected
        };
        approval.decided_at = Some(decided_at);
        approval.decided_by = Some(decision.decided_by);
        approval.decision_reason = decision.reason;
        Ok(Some(approval.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Map;
    use ticketflow_core::{Channel, TicketStatus};

    fn ticket() -> Ticket {
        Ticket::new(
            TicketId::new(),
            "cust_1".into(),
            "subject".into(),
            "body".into(),
            Channel::Http,
            Map::new(),
            Utc::now(),
        )
    }

    #[tokio::test]
    async fn create_then_get_round_trips() {
        let store = FakeStore::new();
        let t = ticket();
        store.create_ticket(t.clone()).await.unwrap();
        let fetched = store.get_ticket(t.id).await.unwrap().unwrap();
        assert_eq!(fetched.id, t.id);
        assert_eq!(fetched.version, 1);
    }

    #[tokio::test]
    async fn duplicate_create_rejected() {
        let store = FakeStore::new();
        let t = ticket();
        store.create_ticket(t.clone()).await.unwrap();
        let err = store.create_ticket(t).await.unwrap_err();
        assert!(matches!(err, StoreError::AlreadyExists));
    }

    #[tokio::test]
    async fn update_with_stale_version_conflicts() {
        let store = FakeStore::new();
        let t = ticket();
        store.create_ticket(t.clone()).await.unwrap();
        store
            .update_ticket(t.id, TicketPatch::default().status(TicketStatus::Processing), 1)
            .await
            .unwrap();
        let err = store
            .update_ticket(t.id, TicketPatch::default().status(TicketStatus::Completed), 1)
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::VersionConflict { expected: 1, actual: 2 }));
    }

    #[tokio::test]
    async fn heartbeat_does_not_bump_version() {
        let store = FakeStore::new();
        let t = ticket();
        store.create_ticket(t.clone()).await.unwrap();
        store
            .update_heartbeat(t.id, &WorkerId::new("worker-1"))
            .await
            .unwrap();
        let fetched = store.get_ticket(t.id).await.unwrap().unwrap();
        assert_eq!(fetched.version, 1);
        assert!(fetched.last_heartbeat.is_some());
    }

    #[tokio::test]
    async fn second_pending_approval_for_same_ticket_rejected() {
        let store = FakeStore::new();
        let t = ticket();
        store.create_ticket(t.clone()).await.unwrap();
        store
            .create_approval(t.id, "process_refund".into(), Map::new(), Utc::now())
            .await
            .unwrap();
        let err = store
            .create_approval(t.id, "process_refund".into(), Map::new(), Utc::now())
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::AlreadyExists));
    }

    #[tokio::test]
    async fn default_first_page_returns_newest_tickets() {
        let store = FakeStore::new();
        for _ in 0..25 {
            store.create_ticket(ticket()).await.unwrap();
        }
        let page1 = store
            .list_tickets(TicketListQuery { page: 1, page_size: 20, status: None })
            .await
            .unwrap();
        assert_eq!(page1.len(), 20);
        let page2 = store
            .list_tickets(TicketListQuery { page: 2, page_size: 20, status: None })
            .await
            .unwrap();
        assert_eq!(page2.len(), 5);
        assert!(page1.iter().all(|a| page2.iter().all(|b| a.id != b.id)));
    }

    #[tokio::test]
    async fn decide_approval_twice_second_call_returns_none() {
        let store = FakeStore::new();
        let t = ticket();
        store.create_ticket(t.clone()).await.unwrap();
        let approval = store
            .create_approval(t.id, "process_refund".into(), Map::new(), Utc::now())
            .await
            .unwrap();
        let decision = ApprovalDecision {
            approved: true,
            decided_by: "agent_1".into(),
            reason: None,
        };
        let first = store
            .decide_approval(approval.id, decision.clone(), Utc::now())
            .await
            .unwrap();
        assert!(first.is_some());
        let second = store.decide_approval(approval.id, decision, Utc::now()).await.unwrap();
        assert!(second.is_none());
    }
}
