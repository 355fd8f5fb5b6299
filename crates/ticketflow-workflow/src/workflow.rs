// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The `Workflow` trait: a plain step-driven interpreter the worker calls
//! one step at a time, rather than a graph engine that owns its own loop.
//! Each call is a single, checkpoint-able unit of progress.

use async_trait::async_trait;

use crate::state::WorkflowState;
use crate::step::{StepOutput, WorkflowError};

/// A workflow graph advanced one step per call. The caller (`ticketflow-worker`)
/// persists a checkpoint after every `step` and reads `state.metadata["current_step"]`
/// (or an equivalent cursor the implementation maintains) to resume after a
/// restart.
#[async_trait]
pub trait Workflow: Send + Sync {
    /// Run whichever step the current state indicates comes next, returning
    /// the patch to apply and where to route after.
    async fn step(&self, state: &WorkflowState) -> Result<StepOutput, WorkflowError>;

    /// The step name a fresh `WorkflowState` should start at.
    fn entry_step(&self) -> &'static str;
}
