// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The six-step decision transaction: CAS the approval, log the decision,
//! run the gated tool (or not), and close the ticket out of
//! `awaiting_approval` regardless of which way the decision went.

use chrono::{DateTime, Utc};
use serde_json::{json, Map, Value};
use tracing::{info, warn};

use ticketflow_core::{
    ApprovalDecision, ApprovalId, DomainSource, EventType, Store, StoreError, TicketEvent,
    TicketId, TicketPatch, TicketStatus,
};
use ticketflow_workflow::{ActionTaken, ToolRegistry, WorkflowState};

use crate::error::ApprovalError;

/// What a decision produced, in the shape the HTTP layer returns verbatim.
#[derive(Debug, Clone)]
pub struct DecideOutcome {
    pub approval_id: ApprovalId,
    pub ticket_id: TicketId,
    pub status: TicketStatus,
    pub action_executed: bool,
    pub message: String,
}

async fn load_state(store: &dyn Store, ticket_id: TicketId) -> Result<Option<WorkflowState>, ApprovalError> {
    let Some(checkpoint) = store.get_checkpoint(ticket_id).await? else {
        return Ok(None);
    };
    Ok(serde_json::from_value(checkpoint.state).ok())
}

pub async fn decide(
    store: &dyn Store,
    tools: &ToolRegistry,
    domain: &dyn DomainSource,
    approval_id: ApprovalId,
    decision: ApprovalDecision,
    now: DateTime<Utc>,
) -> Result<DecideOutcome, ApprovalError> {
    let approved = decision.approved;
    let decided_by = decision.decided_by.clone();
    let reason = decision.reason.clone();

    // Step 1: CAS the approval row out of `pending`.
    let approval = store
        .decide_approval(approval_id, decision, now)
        .await?
        .ok_or(ApprovalError::AlreadyDecided)?;

    // Step 2: log the decision against the ticket.
    let mut decision_payload = Map::new();
    decision_payload.insert("approval_id".into(), json!(approval_id));
    decision_payload.insert("approved".into(), json!(approved));
    decision_payload.insert("decided_by".into(), json!(decided_by));
    decision_payload.insert("reason".into(), json!(reason));
    store
        .append_event(TicketEvent::new(
            approval.ticket_id,
            EventType::StatusChange,
            Some("approval_decided".into()),
            decision_payload,
            now,
        ))
        .await?;

    let state = load_state(store, approval.ticket_id).await?;
    let mut actions_taken = state.as_ref().map(|s| s.actions_taken.clone()).unwrap_or_default();

    // Steps 3-4: execute the gated tool on approval, or record a rejection.
    let (action_executed, final_response) = if approved {
        let args = approval
            .action_params
            .get("args")
            .cloned()
            .unwrap_or_else(|| Value::Object(approval.action_params.clone()));
        match tools.get(&approval.action_type) {
            Some(tool) => match tool.invoke(domain, &args).await {
                Ok(_) => {
                    actions_taken.push(ActionTaken {
                        tool: approval.action_type.clone(),
                        args,
                    });
                    (
                        true,
                        format!("Your request has been approved and the {} action has been completed.", approval.action_type),
                    )
                }
                Err(e) => {
                    warn!(ticket_id = %approval.ticket_id, error = %e, "approved_tool_execution_failed");
                    (
                        false,
                        format!(
                            "Your request was approved, but completing the {} action failed: {e}",
                            approval.action_type
                        ),
                    )
                }
            },
            None => (
                false,
                format!("Your request was approved, but {} is not a recognized action.", approval.action_type),
            ),
        }
    } else {
        let message = match &reason {
            Some(r) => format!("Your request was not approved: {r}"),
            None => "Your request was not approved.".to_string(),
        };
        (false, message)
    };

    let result = json!({
        "final_response": final_response,
        "actions_taken": actions_taken,
    });

    // Step 5: transition awaiting_approval -> completed, retrying once on
    // a version conflict since the decision itself is already durable.
    let patch = TicketPatch::default()
        .status(TicketStatus::Completed)
        .result(result)
        .completed_at(now);
    let ticket = store.get_ticket(approval.ticket_id).await?.ok_or(StoreError::NotFound)?;
    let ticket = match store.update_ticket(approval.ticket_id, patch.clone(), ticket.version).await {
        Ok(t) => t,
        Err(StoreError::VersionConflict { .. }) => {
            let retried = store.get_ticket(approval.ticket_id).await?.ok_or(StoreError::NotFound)?;
            store.update_ticket(approval.ticket_id, patch, retried.version).await?
        }
        Err(e) => return Err(e.into()),
    };

    // Step 6: the run is over, drop the checkpoint.
    store.delete_checkpoint(approval.ticket_id).await?;

    info!(ticket_id = %ticket.id, approval_id = %approval_id, approved, "approval_decided");
    Ok(DecideOutcome {
        approval_id,
        ticket_id: ticket.id,
        status: ticket.status,
        action_executed,
        message: final_response,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Map as JsonMap;
    use ticketflow_core::{Channel, Ticket, TicketId};
    use ticketflow_store::{FakeDomainSource, FakeStore};
    use ticketflow_workflow::NullBugTracker;
    use std::sync::Arc;

    async fn seed(store: &FakeStore, now: DateTime<Utc>) -> (TicketId, ApprovalId) {
        let ticket = Ticket::new(
            TicketId::new(),
            "cust_1".into(),
            "subject".into(),
            "body".into(),
            Channel::Http,
            JsonMap::new(),
            now,
        );
        let id = ticket.id;
        store.create_ticket(ticket).await.unwrap();

        let mut params = JsonMap::new();
        params.insert("order_id".into(), json!("ord_1"));
        params.insert("amount_cents".into(), json!(500));
        let approval = store
            .create_approval(id, "process_refund".into(), params, now)
            .await
            .unwrap();

        let patch = TicketPatch::default().status(TicketStatus::AwaitingApproval);
        store.update_ticket(id, patch, 1).await.unwrap();
        (id, approval.id)
    }

    #[tokio::test]
    async fn approval_executes_tool_and_completes_ticket() {
        let store = FakeStore::new();
        let domain = FakeDomainSource::new();
        let tools = ToolRegistry::canonical(Arc::new(NullBugTracker));
        let now = Utc::now();
        let (ticket_id, approval_id) = seed(&store, now).await;

        let decision = ApprovalDecision {
            approved: true,
            decided_by: "admin".into(),
            reason: None,
        };
        let outcome = decide(&store, &tools, &domain, approval_id, decision, now).await.unwrap();

        assert_eq!(outcome.status, TicketStatus::Completed);
        assert!(outcome.action_executed);
        let ticket = store.get_ticket(ticket_id).await.unwrap().unwrap();
        assert_eq!(ticket.status, TicketStatus::Completed);
        assert!(store.get_checkpoint(ticket_id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn rejection_completes_ticket_without_executing_tool() {
        let store = FakeStore::new();
        let domain = FakeDomainSource::new();
        let tools = ToolRegistry::canonical(Arc::new(NullBugTracker));
        let now = Utc::now();
        let (ticket_id, approval_id) = seed(&store, now).await;

        let decision = ApprovalDecision {
            approved: false,
            decided_by: "admin".into(),
            reason: Some("Insufficient evidence".into()),
        };
        let outcome = decide(&store, &tools, &domain, approval_id, decision, now).await.unwrap();

        assert_eq!(outcome.status, TicketStatus::Completed);
        assert!(!outcome.action_executed);
        assert!(outcome.message.contains("Insufficient evidence"));
        let ticket = store.get_ticket(ticket_id).await.unwrap().unwrap();
        assert_eq!(ticket.status, TicketStatus::Completed);
    }

    #[tokio::test]
    async fn deciding_twice_reports_already_decided() {
        let store = FakeStore::new();
        let domain = FakeDomainSource::new();
        let tools = ToolRegistry::canonical(Arc::new(NullBugTracker));
        let now = Utc::now();
        let (_, approval_id) = seed(&store, now).await;

        let first = ApprovalDecision {
            approved: true,
            decided_by: "admin".into(),
            reason: None,
        };
        decide(&store, &tools, &domain, approval_id, first, now).await.unwrap();

        let second = ApprovalDecision {
            approved: true,
            decided_by: "admin".into(),
            reason: None,
        };
        let err = decide(&store, &tools, &domain, approval_id, second, now).await.unwrap_err();
        assert!(matches!(err, ApprovalError::AlreadyDecided));
    }
}
