// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `TicketWorker`: the outer consume loop plus step 9 — distinguishing a
//! workflow-level error (handled by `retry`, always acks) from an
//! infrastructure error surfaced by the broker or store directly around
//! it (nack-no-requeue once retries are exhausted, requeue otherwise).

use std::sync::Arc;
use std::time::Duration as StdDuration;

use chrono::Utc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use ticketflow_core::{Broker, Delivery, Envelope, Store, WorkerId};
use ticketflow_workflow::{Route, Workflow};

use crate::error::WorkerError;
use crate::finalize::{finalize_awaiting_approval, finalize_completed};
use crate::lease::{acquire, LeaseOutcome};
use crate::retry::{handle_workflow_error, RetryOutcome};
use crate::state_checkpoint::{load_or_construct, record_step};

/// A single ticket processing run blew up somewhere that isn't the
/// workflow itself — a `Store`/`Broker` call around it failed. These
/// follow step 9's policy rather than step 8's.
struct InfraFailure(WorkerError);

/// What `process_envelope` did with the delivery, for the cases that
/// aren't a plain ack or an `InfraFailure`.
enum ProcessOutcome {
    /// Ticket handled to completion (or dropped); ack the delivery.
    Done,
    /// Another worker holds a live lease on this ticket. Per step 3 this
    /// is a benign race, not a failure — requeue unconditionally, with no
    /// regard to `attempt`/`max_retries`.
    LeaseContended,
}

pub struct TicketWorker {
    store: Arc<dyn Store>,
    broker: Arc<dyn Broker>,
    workflow: Arc<dyn Workflow>,
    worker_id: WorkerId,
    max_retries: u32,
    stale_processing_threshold: chrono::Duration,
}

impl TicketWorker {
    pub fn new(
        store: Arc<dyn Store>,
        broker: Arc<dyn Broker>,
        workflow: Arc<dyn Workflow>,
        worker_id: WorkerId,
        max_retries: u32,
        stale_processing_threshold: StdDuration,
    ) -> Self {
        Self {
            store,
            broker,
            workflow,
            worker_id,
            max_retries,
            stale_processing_threshold: chrono::Duration::from_std(stale_processing_threshold)
                .unwrap_or(chrono::Duration::seconds(300)),
        }
    }

    /// Consume envelopes until `shutdown` is cancelled. In-flight
    /// deliveries are left un-acked on cancellation for broker-side
    /// redelivery, per the graceful-shutdown contract.
    pub async fn run(&self, shutdown: CancellationToken) {
        loop {
            let delivery = tokio::select! {
                _ = shutdown.cancelled() => {
                    info!(worker_id = %self.worker_id, "worker_shutdown");
                    return;
                }
                delivery = self.broker.next_delivery() => delivery,
            };

            let delivery = match delivery {
                Ok(Some(d)) => d,
                Ok(None) => {
                    info!(worker_id = %self.worker_id, "broker_consumer_closed");
                    return;
                }
                Err(e) => {
                    error!(worker_id = %self.worker_id, error = %e, "broker_receive_error");
                    continue;
                }
            };

            let envelope = delivery.envelope().clone();
            match self.process_envelope(&envelope).await {
                Ok(ProcessOutcome::Done) => {
                    if let Err(e) = delivery.ack().await {
                        error!(ticket_id = %envelope.ticket_id, error = %e, "ack_failed");
                    }
                }
                Ok(ProcessOutcome::LeaseContended) => {
                    // Another live worker holds this lease. Unrelated to the
                    // ticket's retry budget: always give it back to the queue.
                    if let Err(e) = delivery.reject(true).await {
                        error!(ticket_id = %envelope.ticket_id, error = %e, "reject_failed");
                    }
                }
                Err(InfraFailure(err)) => {
                    warn!(ticket_id = %envelope.ticket_id, error = %err, "infra_failure");
                    let requeue = envelope.attempt < self.max_retries;
                    if let Err(e) = delivery.reject(requeue).await {
                        error!(ticket_id = %envelope.ticket_id, error = %e, "reject_failed");
                    }
                }
            }
        }
    }

    async fn process_envelope(&self, envelope: &Envelope) -> Result<ProcessOutcome, InfraFailure> {
        let now = Utc::now();
        let outcome = acquire(
            self.store.as_ref(),
            envelope.ticket_id,
            &self.worker_id,
            now,
            self.stale_processing_threshold,
        )
        .await
        .map_err(InfraFailure)?;

        let ticket = match outcome {
            LeaseOutcome::Drop => return Ok(ProcessOutcome::Done),
            LeaseOutcome::Contended => return Ok(ProcessOutcome::LeaseContended),
            LeaseOutcome::Acquired(ticket) => ticket,
        };

        let mut state = load_or_construct(self.store.as_ref(), &ticket)
            .await
            .map_err(InfraFailure)?;

        loop {
            let step_result = self.workflow.step(&state).await;
            let output = match step_result {
                Ok(output) => output,
                Err(workflow_err) => {
                    let worker_err: WorkerError = workflow_err.into();
                    let retry_outcome = handle_workflow_error(
                        self.store.as_ref(),
                        self.broker.as_ref(),
                        envelope,
                        self.max_retries,
                        &worker_err,
                        now,
                    )
                    .await
                    .map_err(InfraFailure)?;
                    match retry_outcome {
                        RetryOutcome::Retried | RetryOutcome::DeadLettered => {
                            return Ok(ProcessOutcome::Done)
                        }
                    }
                }
            };

            let route = output.route.clone();
            output.patch.apply(&mut state);
            let step_name = match &route {
                Route::Next(name) => name.clone(),
                Route::Finalize => "finalize".to_string(),
                Route::AwaitApproval => "await_approval".to_string(),
            };
            record_step(self.store.as_ref(), &state, &step_name, &self.worker_id, now)
                .await
                .map_err(InfraFailure)?;

            match route {
                Route::Next(_) => continue,
                Route::Finalize => {
                    finalize_completed(self.store.as_ref(), &state, now)
                        .await
                        .map_err(InfraFailure)?;
                    return Ok(ProcessOutcome::Done);
                }
                Route::AwaitApproval => {
                    finalize_awaiting_approval(self.store.as_ref(), &state, now)
                        .await
                        .map_err(InfraFailure)?;
                    return Ok(ProcessOutcome::Done);
                }
            }
        }
    }
}
