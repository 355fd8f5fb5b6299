// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `classify -> extract -> research -> draft -> review -> finalize`: the
//! older, narrowly-scoped pipeline. Each stage is one bounded LLM call
//! rather than a free-running reasoning loop, so there is no iteration
//! limit to enforce — the step sequence itself is the bound.

use async_trait::async_trait;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

use crate::llm::{call_with_retry, LlmClient};
use crate::state::{Message, Role, StatePatch, WorkflowState};
use crate::step::{Route, Step, StepOutput, WorkflowError};
use crate::workflow::Workflow;

const CURRENT_STEP_KEY: &str = "pipeline_step";

fn prompt_message(role: Role, content: impl Into<String>) -> Message {
    Message {
        role,
        content: content.into(),
        tool_calls: Vec::new(),
        tool_call_id: None,
    }
}

struct StageStep {
    name: &'static str,
    next: Option<&'static str>,
    instruction: &'static str,
    llm: Arc<dyn LlmClient>,
    timeout: Duration,
    max_retries: u32,
}

#[async_trait]
impl Step for StageStep {
    fn name(&self) -> &'static str {
        self.name
    }

    async fn run(&self, state: &WorkflowState) -> Result<StepOutput, WorkflowError> {
        let mut messages = state.messages.clone();
        messages.push(prompt_message(Role::User, self.instruction));

        let response = call_with_retry(self.llm.as_ref(), &messages, &[], self.timeout, self.max_retries).await?;
        let content = response.content.unwrap_or_default();

        let mut patch = StatePatch {
            push_messages: vec![prompt_message(Role::Assistant, content.clone())],
            ..Default::default()
        };
        patch
            .metadata_merge
            .insert(self.name.to_string(), json!(content));

        match self.next {
            Some(next) => {
                patch
                    .metadata_merge
                    .insert(CURRENT_STEP_KEY.into(), json!(next));
                Ok(StepOutput::new(patch, Route::Next(next.to_string())))
            }
            None => {
                patch.final_response = Some(content);
                Ok(StepOutput::new(patch, Route::Finalize))
            }
        }
    }
}

/// The six-stage legacy pipeline: classify, extract, research, draft,
/// review, finalize. Ungated — there is no tool-calling or approval
/// surface in this path, only sequential LLM calls.
pub struct LegacyPipeline {
    stages: Vec<StageStep>,
}

impl LegacyPipeline {
    pub fn new(llm: Arc<dyn LlmClient>, timeout: Duration, max_retries: u32) -> Self {
        let make = |name, next, instruction| StageStep {
            name,
            next,
            instruction,
            llm: llm.clone(),
            timeout,
            max_retries,
        };
        Self {
            stages: vec![
                make(
                    "classify",
                    Some("extract"),
                    "Classify this support ticket by category and urgency.",
                ),
                make(
                    "extract",
                    Some("research"),
                    "Extract the key entities: order numbers, product names, dates.",
                ),
                make(
                    "research",
                    Some("draft"),
                    "Research relevant help articles and order context for this ticket.",
                ),
                make(
                    "draft",
                    Some("review"),
                    "Draft a response to the customer based on the research so far.",
                ),
                make(
                    "review",
                    Some("finalize"),
                    "Review the draft response for accuracy and tone.",
                ),
                make(
                    "finalize",
                    None,
                    "Produce the final customer-facing response.",
                ),
            ],
        }
    }

    fn stage(&self, name: &str) -> Option<&StageStep> {
        self.stages.iter().find(|s| s.name == name)
    }
}

#[async_trait]
impl Workflow for LegacyPipeline {
    async fn step(&self, state: &WorkflowState) -> Result<StepOutput, WorkflowError> {
        let current = state
            .metadata
            .get(CURRENT_STEP_KEY)
            .and_then(|v| v.as_str())
            .unwrap_or(self.entry_step())
            .to_string();

        let stage = self
            .stage(&current)
            .ok_or_else(|| WorkflowError::UnknownStep(current.clone()))?;
        stage.run(state).await
    }

    fn entry_step(&self) -> &'static str {
        "classify"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::{LlmResponse, MockLlmClient};
    use ticketflow_core::TicketId;

    fn state() -> WorkflowState {
        WorkflowState::new(TicketId::new(), "cust_1".into(), "subject".into(), "body".into())
    }

    #[tokio::test]
    async fn runs_all_six_stages_in_order() {
        let responses = (0..6).map(|i| LlmResponse::text(format!("stage {i}")));
        let llm = Arc::new(MockLlmClient::new(responses));
        let pipeline = LegacyPipeline::new(llm, Duration::from_secs(5), 0);

        let mut s = state();
        let mut last_route = Route::Next(pipeline.entry_step().to_string());
        for _ in 0..6 {
            let output = pipeline.step(&s).await.unwrap();
            output.patch.apply(&mut s);
            last_route = match &output.route {
                Route::Next(n) => Route::Next(n.clone()),
                other => other.clone(),
            };
        }
        assert_eq!(last_route, Route::Finalize);
        assert!(s.final_response.is_some());
    }
}
