// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Step 7: what happens once a workflow run reaches a stopping point —
//! either the ticket is done, or it is suspended pending a human decision.

use chrono::{DateTime, Utc};
use serde_json::json;
use ticketflow_core::{Store, TicketPatch, TicketStatus};
use ticketflow_workflow::WorkflowState;

use crate::error::WorkerError;

pub async fn finalize_completed(
    store: &dyn Store,
    state: &WorkflowState,
    now: DateTime<Utc>,
) -> Result<(), WorkerError> {
    let result = json!({
        "final_response": state.final_response,
        "actions_taken": state.actions_taken,
    });
    let patch = TicketPatch::default()
        .status(TicketStatus::Completed)
        .result(result)
        .completed_at(now);
    let ticket = store.get_ticket(state.ticket_id).await?.ok_or(ticketflow_core::StoreError::NotFound)?;
    store.update_ticket(state.ticket_id, patch, ticket.version).await?;
    store.delete_checkpoint(state.ticket_id).await?;
    Ok(())
}

pub async fn finalize_awaiting_approval(
    store: &dyn Store,
    state: &WorkflowState,
    now: DateTime<Utc>,
) -> Result<(), WorkerError> {
    let Some(pending) = &state.pending_approval else {
        return Err(WorkerError::Workflow(ticketflow_workflow::WorkflowError::Tool(
            "awaiting_approval route with no pending_approval set".into(),
        )));
    };

    let mut action_params = serde_json::Map::new();
    action_params.insert("args".into(), pending.args.clone());
    action_params.insert("tool_call_id".into(), json!(pending.tool_call_id));
    store
        .create_approval(state.ticket_id, pending.tool.clone(), action_params, now)
        .await?;

    let result = json!({ "final_response": state.final_response });
    let patch = TicketPatch::default().status(TicketStatus::AwaitingApproval).result(result);
    let ticket = store.get_ticket(state.ticket_id).await?.ok_or(ticketflow_core::StoreError::NotFound)?;
    store.update_ticket(state.ticket_id, patch, ticket.version).await?;
    // Checkpoint is retained so the approval service can resume the run.
    Ok(())
}
