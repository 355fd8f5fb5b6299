// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Step 8: what happens when the workflow itself errors out. Strategy (a)
//! — publish a fresh envelope at `attempt + 1` and ack the current one —
//! is used throughout, since it records the attempt number in the
//! envelope rather than leaving it implicit in broker redelivery counts.

use chrono::{DateTime, Utc};
use serde_json::{json, Map};
use ticketflow_core::{Broker, Envelope, EventType, Store, TicketEvent, TicketPatch, TicketStatus};

use crate::error::WorkerError;

pub enum RetryOutcome {
    Retried,
    DeadLettered,
}

pub async fn handle_workflow_error(
    store: &dyn Store,
    broker: &dyn Broker,
    envelope: &Envelope,
    max_retries: u32,
    error: &WorkerError,
    now: DateTime<Utc>,
) -> Result<RetryOutcome, WorkerError> {
    let ticket = store
        .get_ticket(envelope.ticket_id)
        .await?
        .ok_or(ticketflow_core::StoreError::NotFound)?;

    let mut payload = Map::new();
    payload.insert("error".into(), json!(error.to_string()));
    payload.insert("attempt".into(), json!(envelope.attempt));

    if envelope.attempt >= max_retries {
        store
            .update_ticket(
                envelope.ticket_id,
                TicketPatch::default().status(TicketStatus::FailedPermanent),
                ticket.version,
            )
            .await?;
        store
            .append_event(TicketEvent::new(
                envelope.ticket_id,
                EventType::Error,
                None,
                payload,
                now,
            ))
            .await?;
        return Ok(RetryOutcome::DeadLettered);
    }

    store
        .update_ticket(
            envelope.ticket_id,
            TicketPatch::default()
                .status(TicketStatus::Pending)
                .attempt_count(ticket.attempt_count + 1),
            ticket.version,
        )
        .await?;
    store
        .append_event(TicketEvent::new(
            envelope.ticket_id,
            EventType::Retry,
            None,
            payload,
            now,
        ))
        .await?;
    broker.publish(envelope.next_attempt(now)).await?;
    Ok(RetryOutcome::Retried)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Map as JsonMap;
    use ticketflow_broker::FakeBroker;
    use ticketflow_core::{Channel, Ticket, TicketId};
    use ticketflow_store::FakeStore;

    fn envelope(ticket_id: TicketId, attempt: u32, now: DateTime<Utc>) -> Envelope {
        Envelope {
            ticket_id,
            attempt,
            enqueued_at: now,
        }
    }

    #[tokio::test]
    async fn retries_when_under_max() {
        let store = FakeStore::new();
        let broker = FakeBroker::new();
        let now = Utc::now();
        let t = Ticket::new(
            TicketId::new(),
            "cust_1".into(),
            "subject".into(),
            "body".into(),
            Channel::Http,
            JsonMap::new(),
            now,
        );
        store.create_ticket(t.clone()).await.unwrap();
        let env = envelope(t.id, 1, now);
        let err = WorkerError::LeaseLost;
        let outcome = handle_workflow_error(&store, &broker, &env, 3, &err, now).await.unwrap();
        assert!(matches!(outcome, RetryOutcome::Retried));
        let updated = store.get_ticket(t.id).await.unwrap().unwrap();
        assert_eq!(updated.status, TicketStatus::Pending);
        assert_eq!(updated.attempt_count, 1);
    }

    #[tokio::test]
    async fn dead_letters_when_retries_exhausted() {
        let store = FakeStore::new();
        let broker = FakeBroker::new();
        let now = Utc::now();
        let t = Ticket::new(
            TicketId::new(),
            "cust_1".into(),
            "subject".into(),
            "body".into(),
            Channel::Http,
            JsonMap::new(),
            now,
        );
        store.create_ticket(t.clone()).await.unwrap();
        let env = envelope(t.id, 3, now);
        let err = WorkerError::LeaseLost;
        let outcome = handle_workflow_error(&store, &broker, &env, 3, &err, now).await.unwrap();
        assert!(matches!(outcome, RetryOutcome::DeadLettered));
        let updated = store.get_ticket(t.id).await.unwrap().unwrap();
        assert_eq!(updated.status, TicketStatus::FailedPermanent);
    }
}
