// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `agent -> {tools -> agent | finalize | await_approval}`: a ReAct-style
//! loop where the model decides, per turn, whether to answer directly,
//! call a tool, or — if the tool is gated — hand off to a human.
//!
//! Bounded at [`MAX_AGENT_ITERATIONS`] reasoning turns; exceeding it forces
//! `finalize` with a fixed fallback response rather than looping forever.

use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use ticketflow_core::DomainSource;
use tracing::info;

use crate::llm::{call_with_retry, LlmClient, ToolSpec};
use crate::state::{ActionTaken, Message, PendingApproval, Role, StatePatch, WorkflowState};
use crate::step::{Route, StepOutput, WorkflowError};
use crate::tools::ToolRegistry;
use crate::workflow::Workflow;

pub const MAX_AGENT_ITERATIONS: u32 = 8;

const FALLBACK_RESPONSE: &str = "I apologize, but I was unable to process your request. \
A human agent will review your ticket shortly.";

fn await_approval_message(tool: &str) -> String {
    format!("Your request requires approval. A support manager will review and approve the {tool} shortly.")
}

const NODE_KEY: &str = "agent_node";
const ITERATIONS_KEY: &str = "agent_iterations";

fn current_node(state: &WorkflowState) -> String {
    state
        .metadata
        .get(NODE_KEY)
        .and_then(Value::as_str)
        .unwrap_or("agent")
        .to_string()
}

fn iteration_count(state: &WorkflowState) -> u32 {
    state
        .metadata
        .get(ITERATIONS_KEY)
        .and_then(Value::as_u64)
        .unwrap_or(0) as u32
}

pub struct AgentGraph {
    llm: Arc<dyn LlmClient>,
    tools: Arc<ToolRegistry>,
    domain: Arc<dyn DomainSource>,
    llm_timeout: Duration,
    llm_max_retries: u32,
}

impl AgentGraph {
    pub fn new(
        llm: Arc<dyn LlmClient>,
        tools: Arc<ToolRegistry>,
        domain: Arc<dyn DomainSource>,
        llm_timeout: Duration,
        llm_max_retries: u32,
    ) -> Self {
        Self {
            llm,
            tools,
            domain,
            llm_timeout,
            llm_max_retries,
        }
    }

    fn tool_specs(&self) -> Vec<ToolSpec> {
        self.tools
            .specs()
            .into_iter()
            .map(|name| ToolSpec {
                name: name.to_string(),
                description: String::new(),
                parameters_schema: json!({}),
            })
            .collect()
    }

    async fn run_agent_node(&self, state: &WorkflowState) -> Result<StepOutput, WorkflowError> {
        let iterations = iteration_count(state) + 1;
        if iterations > MAX_AGENT_ITERATIONS {
            info!(ticket_id = %state.ticket_id, iterations, "agent_iteration_limit_exceeded");
            let mut patch = StatePatch {
                final_response: Some(FALLBACK_RESPONSE.to_string()),
                ..Default::default()
            };
            patch
                .metadata_merge
                .insert(ITERATIONS_KEY.into(), json!(iterations));
            return Ok(StepOutput::new(patch, Route::Finalize));
        }

        let response = call_with_retry(
            self.llm.as_ref(),
            &state.messages,
            &self.tool_specs(),
            self.llm_timeout,
            self.llm_max_retries,
        )
        .await?;

        let assistant_message = Message {
            role: Role::Assistant,
            content: response.content.clone().unwrap_or_default(),
            tool_calls: response.tool_calls.clone(),
            tool_call_id: None,
        };

        let mut patch = StatePatch {
            push_messages: vec![assistant_message],
            ..Default::default()
        };
        patch
            .metadata_merge
            .insert(ITERATIONS_KEY.into(), json!(iterations));

        if response.tool_calls.is_empty() {
            patch.final_response = response.content.or(Some(FALLBACK_RESPONSE.to_string()));
            return Ok(StepOutput::new(patch, Route::Finalize));
        }

        if let Some(gated) = response
            .tool_calls
            .iter()
            .find(|tc| self.tools.requires_approval(&tc.name))
        {
            info!(ticket_id = %state.ticket_id, tool = %gated.name, "agent_approval_required");
            patch.pending_approval = Some(Some(PendingApproval {
                tool: gated.name.clone(),
                args: gated.args.clone(),
                tool_call_id: gated.id.clone(),
            }));
            patch.final_response = Some(await_approval_message(&gated.name));
            return Ok(StepOutput::new(patch, Route::AwaitApproval));
        }

        patch
            .metadata_merge
            .insert(NODE_KEY.into(), json!("tools"));
        Ok(StepOutput::new(patch, Route::Next("tools".to_string())))
    }

    async fn run_tools_node(&self, state: &WorkflowState) -> Result<StepOutput, WorkflowError> {
        let Some(last) = state.messages.last() else {
            return Err(WorkflowError::Tool("tools node reached with no messages".into()));
        };

        let mut push_messages = Vec::new();
        let mut push_actions = Vec::new();
        for call in &last.tool_calls {
            let Some(tool) = self.tools.get(&call.name) else {
                return Err(WorkflowError::Tool(format!("unknown tool: {}", call.name)));
            };
            let result = tool
                .invoke(self.domain.as_ref(), &call.args)
                .await
                .map_err(|e| WorkflowError::Tool(e.to_string()))?;

            push_actions.push(ActionTaken {
                tool: call.name.clone(),
                args: call.args.clone(),
            });
            push_messages.push(Message {
                role: Role::Tool,
                content: result.to_string(),
                tool_calls: Vec::new(),
                tool_call_id: Some(call.id.clone()),
            });
        }

        let mut patch = StatePatch {
            push_messages,
            push_actions,
            ..Default::default()
        };
        patch
            .metadata_merge
            .insert(NODE_KEY.into(), json!("agent"));
        Ok(StepOutput::new(patch, Route::Next("agent".to_string())))
    }
}

#[async_trait]
impl Workflow for AgentGraph {
    async fn step(&self, state: &WorkflowState) -> Result<StepOutput, WorkflowError> {
        match current_node(state).as_str() {
            "tools" => self.run_tools_node(state).await,
            _ => self.run_agent_node(state).await,
        }
    }

    fn entry_step(&self) -> &'static str {
        "agent"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::{LlmResponse, MockLlmClient};
    use crate::state::ToolCall;
    use crate::tools::NullBugTracker;
    use ticketflow_core::TicketId;
    use ticketflow_store::FakeDomainSource;

    fn state() -> WorkflowState {
        WorkflowState::new(TicketId::new(), "cust_1".into(), "subject".into(), "body".into())
    }

    #[tokio::test]
    async fn direct_answer_finalizes_immediately() {
        let llm = MockLlmClient::single(LlmResponse::text("Here is your answer."));
        let graph = AgentGraph::new(
            llm,
            Arc::new(ToolRegistry::canonical(Arc::new(NullBugTracker))),
            Arc::new(FakeDomainSource::new()),
            Duration::from_secs(5),
            1,
        );
        let output = graph.step(&state()).await.unwrap();
        assert_eq!(output.route, Route::Finalize);
        assert_eq!(output.patch.final_response.as_deref(), Some("Here is your answer."));
    }

    #[tokio::test]
    async fn gated_tool_call_awaits_approval() {
        let response = LlmResponse {
            content: None,
            tool_calls: vec![ToolCall {
                id: "call_1".into(),
                name: "process_refund".into(),
                args: json!({ "order_id": "ord_1", "amount_cents": 500 }),
            }],
        };
        let llm = MockLlmClient::single(response);
        let graph = AgentGraph::new(
            llm,
            Arc::new(ToolRegistry::canonical(Arc::new(NullBugTracker))),
            Arc::new(FakeDomainSource::new()),
            Duration::from_secs(5),
            1,
        );
        let output = graph.step(&state()).await.unwrap();
        assert_eq!(output.route, Route::AwaitApproval);
        assert!(output.patch.pending_approval.flatten().is_some());
    }

    #[tokio::test]
    async fn auto_tool_call_routes_to_tools_node() {
        let response = LlmResponse {
            content: None,
            tool_calls: vec![ToolCall {
                id: "call_1".into(),
                name: "lookup_product".into(),
                args: json!({}),
            }],
        };
        let llm = MockLlmClient::single(response);
        let graph = AgentGraph::new(
            llm,
            Arc::new(ToolRegistry::canonical(Arc::new(NullBugTracker))),
            Arc::new(FakeDomainSource::new()),
            Duration::from_secs(5),
            1,
        );
        let output = graph.step(&state()).await.unwrap();
        assert_eq!(output.route, Route::Next("tools".to_string()));
    }

    #[tokio::test]
    async fn exceeding_iteration_limit_forces_fallback() {
        let llm = MockLlmClient::single(LlmResponse::text("irrelevant"));
        let graph = AgentGraph::new(
            llm,
            Arc::new(ToolRegistry::canonical(Arc::new(NullBugTracker))),
            Arc::new(FakeDomainSource::new()),
            Duration::from_secs(5),
            1,
        );
        let mut s = state();
        s.metadata
            .insert(ITERATIONS_KEY.into(), json!(MAX_AGENT_ITERATIONS));
        let output = graph.step(&s).await.unwrap();
        assert_eq!(output.route, Route::Finalize);
        assert_eq!(output.patch.final_response.as_deref(), Some(FALLBACK_RESPONSE));
    }

    #[tokio::test]
    async fn tools_node_executes_pending_tool_calls() {
        let graph = AgentGraph::new(
            MockLlmClient::single(LlmResponse::text("unused")),
            Arc::new(ToolRegistry::canonical(Arc::new(NullBugTracker))),
            Arc::new(FakeDomainSource::new()),
            Duration::from_secs(5),
            1,
        );
        let mut s = state();
        s.messages.push(Message {
            role: Role::Assistant,
            content: String::new(),
            tool_calls: vec![ToolCall {
                id: "call_1".into(),
                name: "lookup_product".into(),
                args: json!({}),
            }],
            tool_call_id: None,
        });
        s.metadata.insert(NODE_KEY.into(), json!("tools"));
        let output = graph.step(&s).await.unwrap();
        assert_eq!(output.route, Route::Next("agent".to_string()));
        assert_eq!(output.patch.push_actions.len(), 1);
    }
}
