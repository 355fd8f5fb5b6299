// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The `Step` trait and the common vocabulary every workflow graph routes
//! through: a step returns a state patch plus where to go next.

use async_trait::async_trait;
use thiserror::Error;

use crate::state::{StatePatch, WorkflowState};

#[derive(Debug, Error)]
pub enum WorkflowError {
    #[error("llm call failed: {0}")]
    Llm(#[from] crate::llm::LlmError),

    #[error("tool invocation failed: {0}")]
    Tool(String),

    #[error("unknown step: {0}")]
    UnknownStep(String),
}

/// Where the workflow interpreter should go after a step completes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    /// Continue to the named next step.
    Next(String),
    /// The workflow has produced a final response; stop driving it.
    Finalize,
    /// The workflow is suspended pending a human decision; stop driving it
    /// until `ticketflow-approval` resumes from the persisted checkpoint.
    AwaitApproval,
}

/// The result of running one step: a patch to apply to the shared state,
/// and where the interpreter should route next.
#[derive(Debug, Clone)]
pub struct StepOutput {
    pub patch: StatePatch,
    pub route: Route,
}

impl StepOutput {
    pub fn new(patch: StatePatch, route: Route) -> Self {
        Self { patch, route }
    }
}

/// A single named unit of work in a workflow graph.
#[async_trait]
pub trait Step: Send + Sync {
    fn name(&self) -> &'static str;

    async fn run(&self, state: &WorkflowState) -> Result<StepOutput, WorkflowError>;
}
