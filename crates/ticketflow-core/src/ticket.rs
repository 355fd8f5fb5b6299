// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Ticket identity, status, and the `Ticket` record itself.

use crate::ids::{TicketId, WorkerId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Status of a ticket as it moves through the processing pipeline.
///
/// `Completed` and `FailedPermanent` are terminal: once reached, no further
/// status transition is ever persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TicketStatus {
    Pending,
    Processing,
    AwaitingApproval,
    Completed,
    FailedPermanent,
}

crate::simple_display! {
    TicketStatus {
        Pending => "pending",
        Processing => "processing",
        AwaitingApproval => "awaiting_approval",
        Completed => "completed",
        FailedPermanent => "failed_permanent",
    }
}

impl std::str::FromStr for TicketStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(TicketStatus::Pending),
            "processing" => Ok(TicketStatus::Processing),
            "awaiting_approval" => Ok(TicketStatus::AwaitingApproval),
            "completed" => Ok(TicketStatus::Completed),
            "failed_permanent" => Ok(TicketStatus::FailedPermanent),
            other => Err(format!("unknown ticket status: {other}")),
        }
    }
}

impl TicketStatus {
    /// Terminal statuses never transition further.
    pub fn is_terminal(self) -> bool {
        matches!(self, TicketStatus::Completed | TicketStatus::FailedPermanent)
    }

    /// `awaiting_approval` is quasi-terminal for the worker: only the
    /// approval service transitions out of it.
    pub fn is_worker_terminal(self) -> bool {
        self.is_terminal() || matches!(self, TicketStatus::AwaitingApproval)
    }
}

/// Ingestion channel a ticket arrived through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Channel {
    Http,
    Email,
}

crate::simple_display! {
    Channel {
        Http => "http",
        Email => "email",
    }
}

impl std::str::FromStr for Channel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "http" => Ok(Channel::Http),
            "email" => Ok(Channel::Email),
            other => Err(format!("unknown channel: {other}")),
        }
    }
}

/// A durable unit of customer request flowing through the pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ticket {
    pub id: TicketId,
    pub customer_id: String,
    pub subject: String,
    pub body: String,
    pub channel: Channel,
    /// Opaque map for channel-specific data (e.g. email threading headers).
    #[serde(default)]
    pub metadata: Map<String, Value>,
    pub status: TicketStatus,
    /// Present iff status is terminal or `awaiting_approval`.
    pub result: Option<Value>,
    pub worker_id: Option<WorkerId>,
    pub attempt_count: u32,
    /// Strictly increments on every mutating update.
    pub version: i64,
    pub created_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub last_heartbeat: Option<DateTime<Utc>>,
}

impl Ticket {
    /// Construct a brand-new ticket at version 1, status `pending`, as
    /// `Store::create_ticket` does on insert.
    pub fn new(
        id: TicketId,
        customer_id: String,
        subject: String,
        body: String,
        channel: Channel,
        metadata: Map<String, Value>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            customer_id,
            subject,
            body,
            channel,
            metadata,
            status: TicketStatus::Pending,
            result: None,
            worker_id: None,
            attempt_count: 0,
            version: 1,
            created_at,
            started_at: None,
            completed_at: None,
            last_heartbeat: None,
        }
    }
}

/// A named, partial update to a ticket, applied under a CAS on `version`.
///
/// Any field left `None` is left unchanged; `Store::update_ticket` increments
/// `version` by exactly 1 regardless of how many fields the patch touches.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TicketPatch {
    pub status: Option<TicketStatus>,
    pub worker_id: Option<WorkerId>,
    pub result: Option<Value>,
    pub attempt_count: Option<u32>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub last_heartbeat: Option<DateTime<Utc>>,
    /// Merge-patch onto the existing metadata map rather than replace it.
    pub metadata_merge: Option<Map<String, Value>>,
}

impl TicketPatch {
    pub fn status(mut self, status: TicketStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn worker_id(mut self, worker_id: WorkerId) -> Self {
        self.worker_id = Some(worker_id);
        self
    }

    pub fn result(mut self, result: Value) -> Self {
        self.result = Some(result);
        self
    }

    pub fn attempt_count(mut self, n: u32) -> Self {
        self.attempt_count = Some(n);
        self
    }

    pub fn started_at(mut self, at: DateTime<Utc>) -> Self {
        self.started_at = Some(at);
        self
    }

    pub fn completed_at(mut self, at: DateTime<Utc>) -> Self {
        self.completed_at = Some(at);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn terminal_statuses() {
        assert!(TicketStatus::Completed.is_terminal());
        assert!(TicketStatus::FailedPermanent.is_terminal());
        assert!(!TicketStatus::Processing.is_terminal());
        assert!(!TicketStatus::AwaitingApproval.is_terminal());
        assert!(TicketStatus::AwaitingApproval.is_worker_terminal());
    }

    #[test]
    fn new_ticket_starts_pending_at_version_one() {
        let t = Ticket::new(
            TicketId::new(),
            "cust_1".into(),
            "subj".into(),
            "body".into(),
            Channel::Http,
            Map::new(),
            Utc::now(),
        );
        assert_eq!(t.version, 1);
        assert_eq!(t.status, TicketStatus::Pending);
        assert!(t.worker_id.is_none());
    }
}
