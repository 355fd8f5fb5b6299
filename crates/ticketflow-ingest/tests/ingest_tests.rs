// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::unwrap_used, clippy::expect_used)]

use chrono::Utc;
use ticketflow_broker::FakeBroker;
use ticketflow_core::{Broker, Store, TicketStatus};
use ticketflow_ingest::{ingest_email, ingest_http, ParsedEmail};
use ticketflow_store::FakeStore;

#[tokio::test]
async fn duplicate_http_request_is_idempotent() {
    let store = FakeStore::new();
    let broker = FakeBroker::new();
    let now = Utc::now();

    let first = ingest_http(&store, &broker, "cust_1", "subject", "body", now)
        .await
        .unwrap();
    assert!(first.created);
    assert_eq!(first.status, TicketStatus::Pending);

    let second = ingest_http(&store, &broker, "cust_1", "subject", "body", now)
        .await
        .unwrap();
    assert!(!second.created);
    assert_eq!(second.ticket_id, first.ticket_id);

    let events = store.list_ticket_events(first.ticket_id).await.unwrap();
    assert_eq!(events.len(), 1);
}

#[tokio::test]
async fn distinct_bodies_create_distinct_tickets() {
    let store = FakeStore::new();
    let broker = FakeBroker::new();
    let now = Utc::now();

    let a = ingest_http(&store, &broker, "cust_1", "subject", "body a", now)
        .await
        .unwrap();
    let b = ingest_http(&store, &broker, "cust_1", "subject", "body b", now)
        .await
        .unwrap();
    assert_ne!(a.ticket_id, b.ticket_id);
}

#[tokio::test]
async fn http_ingest_publishes_one_envelope() {
    let store = FakeStore::new();
    let broker = FakeBroker::new();
    let now = Utc::now();

    ingest_http(&store, &broker, "cust_1", "subject", "body", now)
        .await
        .unwrap();

    let delivery = broker.next_delivery().await.unwrap().unwrap();
    assert_eq!(delivery.envelope().attempt, 1);
}

fn email(message_id: &str, in_reply_to: Option<&str>) -> ParsedEmail {
    ParsedEmail {
        message_id: Some(message_id.to_string()),
        in_reply_to: in_reply_to.map(str::to_string),
        from_email: "Customer@Example.com".to_string(),
        from_name: Some("Customer".to_string()),
        to_email: Some("support@example.com".to_string()),
        subject: "Help with my order".to_string(),
        body: Some("My order is late".to_string()),
        html: None,
        attachments: vec![],
    }
}

#[tokio::test]
async fn email_ingest_creates_ticket_with_lowercased_customer_id() {
    let store = FakeStore::new();
    let broker = FakeBroker::new();
    let now = Utc::now();

    let outcome = ingest_email(&store, &broker, email("<m1@mail>", None), now)
        .await
        .unwrap();
    assert!(outcome.created);

    let ticket = store.get_ticket(outcome.ticket_id).await.unwrap().unwrap();
    assert_eq!(ticket.customer_id, "customer@example.com");
}

#[tokio::test]
async fn email_reply_folds_into_existing_ticket_without_new_envelope() {
    let store = FakeStore::new();
    let broker = FakeBroker::new();
    let now = Utc::now();

    let original = ingest_email(&store, &broker, email("<m1@mail>", None), now)
        .await
        .unwrap();
    broker.next_delivery().await.unwrap().unwrap().ack().await.unwrap();

    let reply = ingest_email(&store, &broker, email("<m2@mail>", Some("<m1@mail>")), now)
        .await
        .unwrap();
    assert!(!reply.created);
    assert_eq!(reply.ticket_id, original.ticket_id);

    let events = store.list_ticket_events(original.ticket_id).await.unwrap();
    assert_eq!(events.len(), 2);
}

#[tokio::test]
async fn duplicate_email_request_is_idempotent() {
    let store = FakeStore::new();
    let broker = FakeBroker::new();
    let now = Utc::now();

    let first = ingest_email(&store, &broker, email("<m1@mail>", None), now)
        .await
        .unwrap();
    let second = ingest_email(&store, &broker, email("<m1@mail>", None), now)
        .await
        .unwrap();
    assert_eq!(first.ticket_id, second.ticket_id);
    assert!(!second.created);
}
