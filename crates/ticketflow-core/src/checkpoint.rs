// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-ticket workflow checkpoint.

use crate::ids::TicketId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A persisted snapshot of workflow state, upserted after every step
/// completes and deleted after successful terminal completion.
/// Retained across an `awaiting_approval` suspension so the workflow can
/// resume exactly where it left off once a decision is recorded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowCheckpoint {
    pub ticket_id: TicketId,
    pub state: Value,
    pub current_step: String,
    pub updated_at: DateTime<Utc>,
}
