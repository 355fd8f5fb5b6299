// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! AMQP implementation of `ticketflow_core::Broker`, plus an in-process
//! `FakeBroker` double for tests that avoid a live broker.

#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used))]

pub mod amqp;

#[cfg(any(test, feature = "test-support"))]
pub mod fake;

pub use amqp::AmqpBroker;

#[cfg(any(test, feature = "test-support"))]
pub use fake::FakeBroker;
