// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The `Broker` trait: a durable FIFO queue with a bound dead-letter
//! destination. One envelope is carried per in-flight processing attempt;
//! consumer prefetch is 1.

use crate::error::BrokerError;
use crate::ids::TicketId;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Envelope payload carried by the broker.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Envelope {
    pub ticket_id: TicketId,
    pub attempt: u32,
    pub enqueued_at: DateTime<Utc>,
}

impl Envelope {
    pub fn first_attempt(ticket_id: TicketId, enqueued_at: DateTime<Utc>) -> Self {
        Self {
            ticket_id,
            attempt: 1,
            enqueued_at,
        }
    }

    pub fn next_attempt(&self, enqueued_at: DateTime<Utc>) -> Self {
        Self {
            ticket_id: self.ticket_id,
            attempt: self.attempt + 1,
            enqueued_at,
        }
    }
}

/// A single in-flight envelope that must be explicitly acknowledged or
/// rejected. Dropping a `Delivery` without calling either is a logic error
/// in any real backend (the broker will eventually redeliver on consumer
/// timeout), but is not itself unsafe.
#[async_trait]
pub trait Delivery: Send + Sync {
    fn envelope(&self) -> &Envelope;

    /// Acknowledge successful processing; the broker may discard the message.
    async fn ack(self: Box<Self>) -> Result<(), BrokerError>;

    /// Reject the message. `requeue = true` asks the broker to redeliver it
    /// (e.g. to another consumer); `requeue = false` routes it to the bound
    /// dead-letter destination.
    async fn reject(self: Box<Self>, requeue: bool) -> Result<(), BrokerError>;
}

#[async_trait]
pub trait Broker: Send + Sync {
    /// Publish a new envelope. Persistent across broker restarts.
    async fn publish(&self, envelope: Envelope) -> Result<(), BrokerError>;

    /// Pull the next envelope for this consumer, honoring prefetch=1: the
    /// caller must ack/reject the returned delivery before calling this
    /// again. Returns `None` on graceful shutdown / consumer close.
    async fn next_delivery(&self) -> Result<Option<Box<dyn Delivery>>, BrokerError>;
}
