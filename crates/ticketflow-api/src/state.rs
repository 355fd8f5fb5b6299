// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::sync::Arc;
use ticketflow_core::{Broker, DomainSource, Store};
use ticketflow_workflow::ToolRegistry;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub broker: Arc<dyn Broker>,
    pub domain: Arc<dyn DomainSource>,
    pub tools: Arc<ToolRegistry>,
}
