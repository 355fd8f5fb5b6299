// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Steps 5–6: load a persisted checkpoint if one exists, otherwise
//! construct a fresh workflow state from the ticket; persist after every
//! step along with a `step_complete` event and a heartbeat.

use chrono::{DateTime, Utc};
use ticketflow_core::{EventType, Store, Ticket, TicketEvent, WorkerId};
use ticketflow_workflow::WorkflowState;

use crate::error::WorkerError;

pub async fn load_or_construct(
    store: &dyn Store,
    ticket: &Ticket,
) -> Result<WorkflowState, WorkerError> {
    if let Some(checkpoint) = store.get_checkpoint(ticket.id).await? {
        if let Ok(state) = serde_json::from_value::<WorkflowState>(checkpoint.state) {
            return Ok(state);
        }
    }
    Ok(WorkflowState::new(
        ticket.id,
        ticket.customer_id.clone(),
        ticket.subject.clone(),
        ticket.body.clone(),
    ))
}

/// Persist the checkpoint, append the `step_complete` event, and refresh
/// the heartbeat — the three things that must happen after every step so
/// a crashed worker can resume exactly where it left off.
pub async fn record_step(
    store: &dyn Store,
    state: &WorkflowState,
    step_name: &str,
    worker_id: &WorkerId,
    now: DateTime<Utc>,
) -> Result<(), WorkerError> {
    let encoded = serde_json::to_value(state).unwrap_or(serde_json::Value::Null);
    store
        .upsert_checkpoint(state.ticket_id, encoded, step_name.to_string(), now)
        .await?;
    store
        .append_event(TicketEvent::new(
            state.ticket_id,
            EventType::StepComplete,
            Some(step_name.to_string()),
            serde_json::Map::new(),
            now,
        ))
        .await?;
    store.update_heartbeat(state.ticket_id, worker_id).await?;
    Ok(())
}
