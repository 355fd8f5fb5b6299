// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared process wiring for the `ticketflow-api` and `ticketflow-worker`
//! binaries: logging init and construction of the `Store`/`Broker`/
//! `DomainSource`/`Workflow` stack from `Config`.

pub mod bootstrap;
