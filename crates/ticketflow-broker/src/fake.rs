// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-process [`Broker`] double backed by a `tokio::sync::mpsc` channel, for
//! tests that do not need a live AMQP broker. `reject(requeue=false)` routes
//! the envelope to an in-memory dead-letter list instead of a bound exchange.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::Arc;
use ticketflow_core::{Broker, BrokerError, Delivery, Envelope};
use tokio::sync::mpsc;

/// Cheap to clone; all clones share the same underlying queue.
#[derive(Clone)]
pub struct FakeBroker {
    sender: mpsc::UnboundedSender<Envelope>,
    receiver: Arc<tokio::sync::Mutex<mpsc::UnboundedReceiver<Envelope>>>,
    dead_letters: Arc<Mutex<Vec<Envelope>>>,
}

impl FakeBroker {
    pub fn new() -> Self {
        let (sender, receiver) = mpsc::unbounded_channel();
        Self {
            sender,
            receiver: Arc::new(tokio::sync::Mutex::new(receiver)),
            dead_letters: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn dead_letters(&self) -> Vec<Envelope> {
        self.dead_letters.lock().clone()
    }
}

impl Default for FakeBroker {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Broker for FakeBroker {
    async fn publish(&self, envelope: Envelope) -> Result<(), BrokerError> {
        self.sender
            .send(envelope)
            .map_err(|e| BrokerError::PublishFailed(e.to_string()))
    }

    async fn next_delivery(&self) -> Result<Option<Box<dyn Delivery>>, BrokerError> {
        let mut receiver = self.receiver.lock().await;
        match receiver.recv().await {
            Some(envelope) => Ok(Some(Box::new(FakeDelivery {
                envelope,
                requeue_to: self.sender.clone(),
                dead_letters: self.dead_letters.clone(),
            }))),
            None => Ok(None),
        }
    }
}

struct FakeDelivery {
    envelope: Envelope,
    requeue_to: mpsc::UnboundedSender<Envelope>,
    dead_letters: Arc<Mutex<Vec<Envelope>>>,
}

#[async_trait]
impl Delivery for FakeDelivery {
    fn envelope(&self) -> &Envelope {
        &self.envelope
    }

    async fn ack(self: Box<Self>) -> Result<(), BrokerError> {
        Ok(())
    }

    async fn reject(self: Box<Self>, requeue: bool) -> Result<(), BrokerError> {
        if requeue {
            self.requeue_to
                .send(self.envelope)
                .map_err(|e| BrokerError::PublishFailed(e.to_string()))
        } else {
            self.dead_letters.lock().push(self.envelope);
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use ticketflow_core::TicketId;

    #[tokio::test]
    async fn publish_then_next_delivery_round_trips() {
        let broker = FakeBroker::new();
        let envelope = Envelope::first_attempt(TicketId::new(), Utc::now());
        broker.publish(envelope.clone()).await.unwrap();
        let delivery = broker.next_delivery().await.unwrap().unwrap();
        assert_eq!(delivery.envelope().ticket_id, envelope.ticket_id);
        delivery.ack().await.unwrap();
    }

    #[tokio::test]
    async fn reject_without_requeue_dead_letters() {
        let broker = FakeBroker::new();
        let envelope = Envelope::first_attempt(TicketId::new(), Utc::now());
        broker.publish(envelope.clone()).await.unwrap();
        let delivery = broker.next_delivery().await.unwrap().unwrap();
        delivery.reject(false).await.unwrap();
        assert_eq!(broker.dead_letters().len(), 1);
    }

    #[tokio::test]
    async fn reject_with_requeue_is_redelivered() {
        let broker = FakeBroker::new();
        let envelope = Envelope::first_attempt(TicketId::new(), Utc::now());
        broker.publish(envelope.clone()).await.unwrap();
        let delivery = broker.next_delivery().await.unwrap().unwrap();
        delivery.reject(true).await.unwrap();
        let redelivered = broker.next_delivery().await.unwrap().unwrap();
        assert_eq!(redelivered.envelope().ticket_id, envelope.ticket_id);
    }
}
