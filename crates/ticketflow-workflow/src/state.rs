// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Workflow state passed between steps.
//!
//! The typed core covers the fields every step reads or writes; the
//! `metadata` map is an escape hatch for step-local or provider-specific
//! scratch values that don't belong in the shared contract.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use ticketflow_core::TicketId;

/// A single turn in the conversation driving a workflow.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
    /// Present on an assistant message that invoked a tool.
    #[serde(default)]
    pub tool_calls: Vec<ToolCall>,
    /// Present on a message that is the result of a tool invocation.
    #[serde(default)]
    pub tool_call_id: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    System,
    User,
    Assistant,
    Tool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCall {
    pub id: String,
    pub name: String,
    pub args: Value,
}

/// An action a step or tool actually performed, recorded for the audit
/// trail surfaced back to the customer and support agents.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionTaken {
    pub tool: String,
    pub args: Value,
}

/// A gated tool call awaiting a human decision before it can run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PendingApproval {
    pub tool: String,
    pub args: Value,
    pub tool_call_id: String,
}

/// The full state threaded through a workflow run. Constructed once per
/// ticket and replayed from the persisted checkpoint after a worker
/// restart or an `awaiting_approval` resume.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowState {
    pub ticket_id: TicketId,
    pub customer_id: String,
    pub subject: String,
    pub body: String,
    #[serde(default)]
    pub messages: Vec<Message>,
    #[serde(default)]
    pub final_response: Option<String>,
    #[serde(default)]
    pub actions_taken: Vec<ActionTaken>,
    #[serde(default)]
    pub pending_approval: Option<PendingApproval>,
    /// Step-local scratch data (classification labels, extracted entities,
    /// draft text, agent iteration counters) that doesn't need a dedicated
    /// typed field.
    #[serde(default)]
    pub metadata: Map<String, Value>,
}

impl WorkflowState {
    pub fn new(ticket_id: TicketId, customer_id: String, subject: String, body: String) -> Self {
        Self {
            ticket_id,
            customer_id,
            subject,
            body,
            messages: Vec::new(),
            final_response: None,
            actions_taken: Vec::new(),
            pending_approval: None,
            metadata: Map::new(),
        }
    }

    pub fn is_done(&self) -> bool {
        self.final_response.is_some()
    }
}

/// A named field update applied to [`WorkflowState`] after a step runs.
/// Any field left `None`/empty is left unchanged.
#[derive(Debug, Clone, Default)]
pub struct StatePatch {
    pub push_messages: Vec<Message>,
    pub final_response: Option<String>,
    pub push_actions: Vec<ActionTaken>,
    pub pending_approval: Option<Option<PendingApproval>>,
    pub metadata_merge: Map<String, Value>,
}

impl StatePatch {
    pub fn apply(self, state: &mut WorkflowState) {
        state.messages.extend(self.push_messages);
        if let Some(response) = self.final_response {
            state.final_response = Some(response);
        }
        state.actions_taken.extend(self.push_actions);
        if let Some(pending) = self.pending_approval {
            state.pending_approval = pending;
        }
        for (k, v) in self.metadata_merge {
            state.metadata.insert(k, v);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn patch_merges_metadata_without_clobbering_existing_keys() {
        let mut state = WorkflowState::new(
            TicketId::new(),
            "cust_1".into(),
            "subject".into(),
            "body".into(),
        );
        state.metadata.insert("category".into(), "account".into());

        let mut patch = StatePatch::default();
        patch.metadata_merge.insert("step".into(), "classify".into());
        patch.apply(&mut state);

        assert_eq!(state.metadata.get("category").unwrap(), "account");
        assert_eq!(state.metadata.get("step").unwrap(), "classify");
    }

    #[test]
    fn final_response_marks_state_done() {
        let mut state = WorkflowState::new(
            TicketId::new(),
            "cust_1".into(),
            "subject".into(),
            "body".into(),
        );
        assert!(!state.is_done());
        let mut patch = StatePatch::default();
        patch.final_response = Some("resolved".into());
        patch.apply(&mut state);
        assert!(state.is_done());
    }
}
