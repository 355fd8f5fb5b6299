// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Worker-local error taxonomy. The worker never surfaces a panic for a
//! single ticket's failure; every outcome is one of these variants, each
//! mapped to a specific envelope disposition in `run_loop`.

use thiserror::Error;
use ticketflow_core::{BrokerError, StoreError};
use ticketflow_workflow::WorkflowError;

#[derive(Debug, Error)]
pub enum WorkerError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Broker(#[from] BrokerError),

    #[error(transparent)]
    Workflow(#[from] WorkflowError),

    #[error("ticket leased by another worker, requeueing")]
    LeaseLost,
}
