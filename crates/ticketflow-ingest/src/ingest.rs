// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The shared idempotent-create-then-publish routine behind both ingest
//! paths: look up the deterministic id, return the existing ticket on a
//! repeat request, otherwise persist, log, and enqueue exactly once.

use chrono::{DateTime, Utc};
use serde_json::{json, Map, Value};
use ticketflow_core::{
    Broker, Channel, Envelope, EventType, Store, Ticket, TicketEvent, TicketId, TicketStatus,
};
use tracing::info;

use crate::email::{extract_customer_id, ParsedEmail};
use crate::error::IngestError;
use crate::identity;

/// Result of an ingest call. `created = false` means the request was a
/// duplicate (same deterministic id, or a thread reply folded into an
/// existing ticket) and no new envelope was published.
#[derive(Debug, Clone)]
pub struct IngestOutcome {
    pub ticket_id: TicketId,
    pub status: TicketStatus,
    pub created: bool,
}

pub async fn ingest_http(
    store: &dyn Store,
    broker: &dyn Broker,
    customer_id: &str,
    subject: &str,
    body: &str,
    now: DateTime<Utc>,
) -> Result<IngestOutcome, IngestError> {
    let ticket_id = identity::ticket_id(customer_id, subject, body);

    if let Some(existing) = store.get_ticket(ticket_id).await? {
        info!(ticket_id = %ticket_id, "duplicate_ticket_request");
        return Ok(IngestOutcome {
            ticket_id,
            status: existing.status,
            created: false,
        });
    }

    let ticket = Ticket::new(
        ticket_id,
        customer_id.to_string(),
        subject.to_string(),
        body.to_string(),
        Channel::Http,
        Map::new(),
        now,
    );
    create_and_enqueue(store, broker, ticket, "http", customer_id, subject, now).await
}

pub async fn ingest_email(
    store: &dyn Store,
    broker: &dyn Broker,
    parsed: ParsedEmail,
    now: DateTime<Utc>,
) -> Result<IngestOutcome, IngestError> {
    if let Some(in_reply_to) = parsed.in_reply_to.as_deref() {
        if let Some(existing) = store.find_ticket_by_thread(in_reply_to).await? {
            info!(
                ticket_id = %existing.id,
                message_id = parsed.message_id.as_deref().unwrap_or(""),
                "email_thread_reply"
            );
            let mut payload = Map::new();
            payload.insert("message_id".into(), json!(parsed.message_id));
            payload.insert("from".into(), json!(parsed.from_email));
            payload.insert("subject".into(), json!(parsed.subject));
            payload.insert(
                "body_preview".into(),
                json!(parsed.body.as_deref().map(|b| b.chars().take(200).collect::<String>())),
            );
            store
                .append_event(TicketEvent::new(
                    existing.id,
                    EventType::StatusChange,
                    Some("email_reply_received".into()),
                    payload,
                    now,
                ))
                .await?;
            return Ok(IngestOutcome {
                ticket_id: existing.id,
                status: existing.status,
                created: false,
            });
        }
    }

    let message_id = parsed.message_id.clone().unwrap_or_default();
    let ticket_id = identity::email_ticket_id(&message_id, &parsed.from_email, &parsed.subject);

    if let Some(existing) = store.get_ticket(ticket_id).await? {
        info!(ticket_id = %ticket_id, "duplicate_email_ticket");
        return Ok(IngestOutcome {
            ticket_id,
            status: existing.status,
            created: false,
        });
    }

    let customer_id = extract_customer_id(&parsed.from_email);
    let subject = if parsed.subject.is_empty() {
        "(No subject)".to_string()
    } else {
        parsed.subject.clone()
    };
    let body = parsed
        .body
        .clone()
        .or_else(|| parsed.html.clone())
        .unwrap_or_else(|| "(Empty email)".to_string());

    let mut metadata = Map::new();
    metadata.insert("message_ids".into(), json!([message_id]));
    metadata.insert("from_email".into(), json!(parsed.from_email));
    metadata.insert("from_name".into(), json!(parsed.from_name));
    metadata.insert("to_email".into(), json!(parsed.to_email));
    metadata.insert("in_reply_to".into(), json!(parsed.in_reply_to));
    metadata.insert(
        "attachments".into(),
        Value::Array(
            parsed
                .attachments
                .iter()
                .map(|a| json!({"filename": a.filename, "content_type": a.content_type}))
                .collect(),
        ),
    );

    let ticket = Ticket::new(
        ticket_id,
        customer_id.clone(),
        subject.clone(),
        body,
        Channel::Email,
        metadata,
        now,
    );
    create_and_enqueue(store, broker, ticket, "email", &customer_id, &subject, now).await
}

async fn create_and_enqueue(
    store: &dyn Store,
    broker: &dyn Broker,
    ticket: Ticket,
    channel: &str,
    customer_id: &str,
    subject: &str,
    now: DateTime<Utc>,
) -> Result<IngestOutcome, IngestError> {
    let ticket_id = ticket.id;
    let created = match store.create_ticket(ticket).await {
        Ok(t) => t,
        Err(ticketflow_core::StoreError::AlreadyExists) => {
            return match store.get_ticket(ticket_id).await? {
                Some(existing) => Ok(IngestOutcome {
                    ticket_id,
                    status: existing.status,
                    created: false,
                }),
                None => Err(ticketflow_core::StoreError::NotFound.into()),
            };
        }
        Err(e) => return Err(e.into()),
    };

    let mut payload = Map::new();
    payload.insert("channel".into(), json!(channel));
    payload.insert("customer_id".into(), json!(customer_id));
    payload.insert("subject".into(), json!(subject));
    store
        .append_event(TicketEvent::new(
            ticket_id,
            EventType::Created,
            None,
            payload,
            now,
        ))
        .await?;

    broker
        .publish(Envelope::first_attempt(ticket_id, now))
        .await?;

    info!(ticket_id = %ticket_id, channel, "ticket_created");
    Ok(IngestOutcome {
        ticket_id,
        status: created.status,
        created: true,
    })
}
