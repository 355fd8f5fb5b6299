// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Append-only ticket event log entries.

use crate::ids::{EventId, TicketId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    Created,
    StatusChange,
    StepComplete,
    Error,
    Retry,
}

crate::simple_display! {
    EventType {
        Created => "created",
        StatusChange => "status_change",
        StepComplete => "step_complete",
        Error => "error",
        Retry => "retry",
    }
}

impl std::str::FromStr for EventType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "created" => Ok(EventType::Created),
            "status_change" => Ok(EventType::StatusChange),
            "step_complete" => Ok(EventType::StepComplete),
            "error" => Ok(EventType::Error),
            "retry" => Ok(EventType::Retry),
            other => Err(format!("unknown event type: {other}")),
        }
    }
}

/// A single append-only audit entry for a ticket. Never mutated, never
/// deleted, regardless of which component appended it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TicketEvent {
    pub id: EventId,
    pub ticket_id: TicketId,
    pub event_type: EventType,
    pub step_name: Option<String>,
    pub payload: Map<String, Value>,
    pub created_at: DateTime<Utc>,
}

impl TicketEvent {
    pub fn new(
        ticket_id: TicketId,
        event_type: EventType,
        step_name: Option<String>,
        payload: Map<String, Value>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: EventId::new(),
            ticket_id,
            event_type,
            step_name,
            payload,
            created_at,
        }
    }
}
