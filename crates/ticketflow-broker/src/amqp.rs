// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! AMQP-backed [`Broker`] built on `lapin`.
//!
//! One durable queue bound to one dead-letter exchange/queue pair. Consumer
//! prefetch is configured via `basic_qos`; `reject(requeue=false)` routes the
//! message to the DLX via AMQP's native dead-lettering instead of re-encoding
//! it by hand.

use async_trait::async_trait;
use lapin::options::{
    BasicAckOptions, BasicConsumeOptions, BasicNackOptions, BasicPublishOptions, BasicQosOptions,
    ExchangeDeclareOptions, QueueBindOptions, QueueDeclareOptions,
};
use lapin::types::FieldTable;
use lapin::{BasicProperties, Channel, Connection, ConnectionProperties, Consumer, ExchangeKind};
use ticketflow_core::{Broker, BrokerError, Delivery, Envelope};
use tokio::sync::Mutex;
use tokio_stream::StreamExt;

/// Broker connected to a single RabbitMQ-compatible AMQP server.
pub struct AmqpBroker {
    channel: Channel,
    queue_name: String,
    consumer: Mutex<Option<Consumer>>,
}

impl AmqpBroker {
    pub async fn connect(
        amqp_url: &str,
        queue_name: &str,
        dlx_name: &str,
        prefetch_count: u16,
    ) -> Result<Self, BrokerError> {
        let conn = Connection::connect(amqp_url, ConnectionProperties::default())
            .await
            .map_err(|e| BrokerError::Unavailable(e.to_string()))?;
        let channel = conn
            .create_channel()
            .await
            .map_err(|e| BrokerError::Unavailable(e.to_string()))?;

        channel
            .exchange_declare(
                dlx_name,
                ExchangeKind::Fanout,
                ExchangeDeclareOptions {
                    durable: true,
                    ..Default::default()
                },
                FieldTable::default(),
            )
            .await
            .map_err(|e| BrokerError::Unavailable(e.to_string()))?;

        let dead_letter_queue = format!("{dlx_name}.queue");
        channel
            .queue_declare(
                &dead_letter_queue,
                QueueDeclareOptions {
                    durable: true,
                    ..Default::default()
                },
                FieldTable::default(),
            )
            .await
            .map_err(|e| BrokerError::Unavailable(e.to_string()))?;
        channel
            .queue_bind(
                &dead_letter_queue,
                dlx_name,
                "",
                QueueBindOptions::default(),
                FieldTable::default(),
            )
            .await
            .map_err(|e| BrokerError::Unavailable(e.to_string()))?;

        let mut queue_args = FieldTable::default();
        queue_args.insert("x-dead-letter-exchange".into(), dlx_name.into());
        channel
            .queue_declare(
                queue_name,
                QueueDeclareOptions {
                    durable: true,
                    ..Default::default()
                },
                queue_args,
            )
            .await
            .map_err(|e| BrokerError::Unavailable(e.to_string()))?;

        channel
            .basic_qos(prefetch_count, BasicQosOptions::default())
            .await
            .map_err(|e| BrokerError::Unavailable(e.to_string()))?;

        Ok(Self {
            channel,
            queue_name: queue_name.to_string(),
            consumer: Mutex::new(None),
        })
    }
}

#[async_trait]
impl Broker for AmqpBroker {
    async fn publish(&self, envelope: Envelope) -> Result<(), BrokerError> {
        let body = serde_json::to_vec(&envelope)
            .map_err(|e| BrokerError::PublishFailed(e.to_string()))?;
        self.channel
            .basic_publish(
                "",
                &self.queue_name,
                BasicPublishOptions::default(),
                &body,
                BasicProperties::default().with_delivery_mode(2),
            )
            .await
            .map_err(|e| BrokerError::PublishFailed(e.to_string()))?
            .await
            .map_err(|e| BrokerError::PublishFailed(e.to_string()))?;
        Ok(())
    }

    async fn next_delivery(&self) -> Result<Option<Box<dyn Delivery>>, BrokerError> {
        let mut guard = self.consumer.lock().await;
        let consumer = match guard.as_mut() {
            Some(c) => c,
            None => {
                let consumer = self
                    .channel
                    .basic_consume(
                        &self.queue_name,
                        "ticketflow-worker",
                        BasicConsumeOptions::default(),
                        FieldTable::default(),
                    )
                    .await
                    .map_err(|e| BrokerError::Unavailable(e.to_string()))?;
                guard.get_or_insert(consumer)
            }
        };

        match consumer.next().await {
            Some(Ok(delivery)) => {
                let envelope: Envelope = serde_json::from_slice(&delivery.data)
                    .map_err(|e| BrokerError::Unavailable(e.to_string()))?;
                Ok(Some(Box::new(AmqpDelivery { envelope, delivery })))
            }
            Some(Err(e)) => Err(BrokerError::Unavailable(e.to_string())),
            None => Ok(None),
        }
    }
}

struct AmqpDelivery {
    envelope: Envelope,
    delivery: lapin::message::Delivery,
}

#[async_trait]
impl Delivery for AmqpDelivery {
    fn envelope(&self) -> &Envelope {
        &self.envelope
    }

    async fn ack(self: Box<Self>) -> Result<(), BrokerError> {
        self.delivery
            .ack(BasicAckOptions::default())
            .await
            .map_err(|e| BrokerError::Unavailable(e.to_string()))
    }

    async fn reject(self: Box<Self>, requeue: bool) -> Result<(), BrokerError> {
        self.delivery
            .nack(BasicNackOptions {
                requeue,
                ..Default::default()
            })
            .await
            .map_err(|e| BrokerError::Unavailable(e.to_string()))
    }
}
