// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Postgres-backed implementation of `ticketflow_core::Store`, plus an
//! in-memory `FakeStore` double for tests that avoid a live database.

#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used))]

mod rows;

pub mod domain;
pub mod pg;

#[cfg(any(test, feature = "test-support"))]
pub mod fake;

#[cfg(any(test, feature = "test-support"))]
pub mod fake_domain;

pub use domain::PgDomainSource;
pub use pg::PgStore;

#[cfg(any(test, feature = "test-support"))]
pub use fake::FakeStore;

#[cfg(any(test, feature = "test-support"))]
pub use fake_domain::FakeDomainSource;
