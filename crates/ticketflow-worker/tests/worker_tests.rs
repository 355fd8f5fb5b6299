// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use serde_json::Map;
use serde_json::json;
use ticketflow_broker::FakeBroker;
use ticketflow_core::{Broker, Channel, Envelope, Store, Ticket, TicketId, TicketStatus, WorkerId};
use ticketflow_store::{FakeDomainSource, FakeStore};
use ticketflow_worker::TicketWorker;
use ticketflow_workflow::{
    AgentGraph, LegacyPipeline, LlmResponse, MockLlmClient, NullBugTracker, ToolCall, ToolRegistry,
};
use tokio_util::sync::CancellationToken;

async fn seed_ticket(store: &FakeStore, broker: &FakeBroker) -> TicketId {
    let now = Utc::now();
    let ticket = Ticket::new(
        TicketId::new(),
        "cust_1".into(),
        "subject".into(),
        "body".into(),
        Channel::Http,
        Map::new(),
        now,
    );
    let id = ticket.id;
    store.create_ticket(ticket).await.unwrap();
    broker.publish(Envelope::first_attempt(id, now)).await.unwrap();
    id
}

#[tokio::test]
async fn legacy_pipeline_completes_ticket_end_to_end() {
    let store = FakeStore::new();
    let broker = FakeBroker::new();
    let ticket_id = seed_ticket(&store, &broker).await;

    let responses = (0..6).map(|i| LlmResponse::text(format!("stage {i} output")));
    let llm = Arc::new(MockLlmClient::new(responses));
    let workflow = Arc::new(LegacyPipeline::new(llm, Duration::from_secs(5), 0));

    let worker = TicketWorker::new(
        Arc::new(store.clone()),
        Arc::new(broker.clone()),
        workflow,
        WorkerId::new("worker-1"),
        3,
        Duration::from_secs(300),
    );

    let shutdown = CancellationToken::new();
    let broker_for_task = broker.clone();
    let shutdown_clone = shutdown.clone();
    let handle = tokio::spawn(async move { worker.run(shutdown_clone).await });

    // Give the worker a moment to consume and finish the single queued
    // envelope before shutting it down.
    tokio::time::sleep(Duration::from_millis(50)).await;
    shutdown.cancel();
    handle.await.unwrap();

    let ticket = store.get_ticket(ticket_id).await.unwrap().unwrap();
    assert_eq!(ticket.status, TicketStatus::Completed);
    assert!(broker_for_task.dead_letters().is_empty());
}

#[tokio::test]
async fn agent_graph_suspends_ticket_for_approval() {
    let store = FakeStore::new();
    let broker = FakeBroker::new();
    let ticket_id = seed_ticket(&store, &broker).await;

    let response = LlmResponse {
        content: None,
        tool_calls: vec![ToolCall {
            id: "call_1".into(),
            name: "process_refund".into(),
            args: json!({ "order_id": "ord_1", "amount_cents": 500 }),
        }],
    };
    let llm = Arc::new(MockLlmClient::new([response]));
    let tools = Arc::new(ToolRegistry::canonical(Arc::new(NullBugTracker)));
    let domain = Arc::new(FakeDomainSource::new());
    let workflow = Arc::new(AgentGraph::new(llm, tools, domain, Duration::from_secs(5), 0));

    let worker = TicketWorker::new(
        Arc::new(store.clone()),
        Arc::new(broker.clone()),
        workflow,
        WorkerId::new("worker-1"),
        3,
        Duration::from_secs(300),
    );

    let shutdown = CancellationToken::new();
    let broker_for_task = broker.clone();
    let shutdown_clone = shutdown.clone();
    let handle = tokio::spawn(async move { worker.run(shutdown_clone).await });

    tokio::time::sleep(Duration::from_millis(50)).await;
    shutdown.cancel();
    handle.await.unwrap();

    let ticket = store.get_ticket(ticket_id).await.unwrap().unwrap();
    assert_eq!(ticket.status, TicketStatus::AwaitingApproval);
    assert!(broker_for_task.dead_letters().is_empty());

    let pending = store.list_pending_approvals().await.unwrap();
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].ticket_id, ticket_id);
    assert_eq!(pending[0].action_type, "process_refund");
}
