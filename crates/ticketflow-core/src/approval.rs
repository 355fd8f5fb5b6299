// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Human-in-the-loop approval requests for gated tool invocations.

use crate::ids::{ApprovalId, TicketId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApprovalStatus {
    Pending,
    Approved,
    Rejected,
}

crate::simple_display! {
    ApprovalStatus {
        Pending => "pending",
        Approved => "approved",
        Rejected => "rejected",
    }
}

impl std::str::FromStr for ApprovalStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(ApprovalStatus::Pending),
            "approved" => Ok(ApprovalStatus::Approved),
            "rejected" => Ok(ApprovalStatus::Rejected),
            other => Err(format!("unknown approval status: {other}")),
        }
    }
}

/// A gate that suspends a ticket until a human authorizes a specific tool
/// invocation. At most one pending approval exists per ticket at any moment;
/// decisions are CAS-guarded on `status = pending`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApprovalRequest {
    pub id: ApprovalId,
    pub ticket_id: TicketId,
    pub action_type: String,
    pub action_params: Map<String, Value>,
    pub status: ApprovalStatus,
    pub requested_at: DateTime<Utc>,
    pub decided_at: Option<DateTime<Utc>>,
    pub decided_by: Option<String>,
    pub decision_reason: Option<String>,
}

impl ApprovalRequest {
    pub fn new(
        ticket_id: TicketId,
        action_type: String,
        action_params: Map<String, Value>,
        requested_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: ApprovalId::new(),
            ticket_id,
            action_type,
            action_params,
            status: ApprovalStatus::Pending,
            requested_at,
            decided_at: None,
            decided_by: None,
            decision_reason: None,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.status == ApprovalStatus::Pending
    }
}

/// A human decision on a pending approval.
#[derive(Debug, Clone, Deserialize)]
pub struct ApprovalDecision {
    pub approved: bool,
    pub decided_by: String,
    pub reason: Option<String>,
}
