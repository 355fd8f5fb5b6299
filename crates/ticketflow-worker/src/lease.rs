// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Steps 1–4 of the envelope handling sequence: fetch, the idempotency
//! gate, the staleness check, and CAS lease acquisition.

use chrono::{DateTime, Utc};
use ticketflow_core::{Store, Ticket, TicketPatch, TicketStatus, WorkerId};

use crate::error::WorkerError;

/// What the caller should do with the envelope before driving a workflow.
pub enum LeaseOutcome {
    /// Ticket missing, or already terminal/awaiting_approval: ack and drop.
    Drop,
    /// Another worker's lease looks fresh: reject with requeue.
    Contended,
    /// This worker now owns the ticket at the returned version.
    Acquired(Ticket),
}

pub async fn acquire(
    store: &dyn Store,
    ticket_id: ticketflow_core::TicketId,
    worker_id: &WorkerId,
    now: DateTime<Utc>,
    stale_processing_threshold: chrono::Duration,
) -> Result<LeaseOutcome, WorkerError> {
    let Some(ticket) = store.get_ticket(ticket_id).await? else {
        return Ok(LeaseOutcome::Drop);
    };

    if ticket.status.is_worker_terminal() {
        return Ok(LeaseOutcome::Drop);
    }

    if ticket.status == TicketStatus::Processing {
        if let Some(last_heartbeat) = ticket.last_heartbeat {
            if now - last_heartbeat < stale_processing_threshold {
                return Ok(LeaseOutcome::Contended);
            }
        }
    }

    let mut patch = TicketPatch::default().status(TicketStatus::Processing);
    patch.worker_id = Some(worker_id.clone());
    patch.last_heartbeat = Some(now);
    if ticket.started_at.is_none() {
        patch = patch.started_at(now);
    }

    match store.update_ticket(ticket_id, patch, ticket.version).await {
        Ok(leased) => Ok(LeaseOutcome::Acquired(leased)),
        Err(ticketflow_core::StoreError::VersionConflict { .. }) => Ok(LeaseOutcome::Contended),
        Err(e) => Err(e.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use serde_json::Map;
    use ticketflow_core::{Channel, TicketId};
    use ticketflow_store::FakeStore;

    fn ticket(status: TicketStatus, now: DateTime<Utc>) -> Ticket {
        let mut t = Ticket::new(
            TicketId::new(),
            "cust_1".into(),
            "subject".into(),
            "body".into(),
            Channel::Http,
            Map::new(),
            now,
        );
        t.status = status;
        t
    }

    #[tokio::test]
    async fn missing_ticket_drops() {
        let store = FakeStore::new();
        let worker_id = WorkerId::new("worker-1");
        let outcome = acquire(&store, TicketId::new(), &worker_id, Utc::now(), Duration::seconds(300))
            .await
            .unwrap();
        assert!(matches!(outcome, LeaseOutcome::Drop));
    }

    #[tokio::test]
    async fn completed_ticket_drops() {
        let store = FakeStore::new();
        let now = Utc::now();
        let t = ticket(TicketStatus::Completed, now);
        store.create_ticket(t.clone()).await.unwrap();
        let worker_id = WorkerId::new("worker-1");
        let outcome = acquire(&store, t.id, &worker_id, now, Duration::seconds(300))
            .await
            .unwrap();
        assert!(matches!(outcome, LeaseOutcome::Drop));
    }

    #[tokio::test]
    async fn fresh_processing_lease_is_contended() {
        let store = FakeStore::new();
        let now = Utc::now();
        let mut t = ticket(TicketStatus::Processing, now);
        t.last_heartbeat = Some(now);
        store.create_ticket(t.clone()).await.unwrap();
        let worker_id = WorkerId::new("worker-2");
        let outcome = acquire(&store, t.id, &worker_id, now, Duration::seconds(300))
            .await
            .unwrap();
        assert!(matches!(outcome, LeaseOutcome::Contended));
    }

    #[tokio::test]
    async fn stale_processing_lease_is_reclaimed() {
        let store = FakeStore::new();
        let now = Utc::now();
        let mut t = ticket(TicketStatus::Processing, now);
        t.last_heartbeat = Some(now - Duration::seconds(600));
        store.create_ticket(t.clone()).await.unwrap();
        let worker_id = WorkerId::new("worker-2");
        let outcome = acquire(&store, t.id, &worker_id, now, Duration::seconds(300))
            .await
            .unwrap();
        assert!(matches!(outcome, LeaseOutcome::Acquired(_)));
    }

    #[tokio::test]
    async fn pending_ticket_is_acquired() {
        let store = FakeStore::new();
        let now = Utc::now();
        let t = ticket(TicketStatus::Pending, now);
        store.create_ticket(t.clone()).await.unwrap();
        let worker_id = WorkerId::new("worker-1");
        let outcome = acquire(&store, t.id, &worker_id, now, Duration::seconds(300))
            .await
            .unwrap();
        match outcome {
            LeaseOutcome::Acquired(leased) => {
                assert_eq!(leased.status, TicketStatus::Processing);
                assert_eq!(leased.worker_id, Some(worker_id));
            }
            _ => panic!("expected Acquired"),
        }
    }
}
