// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The canonical set of tools an agent-style workflow may call: four
//! read-only information lookups, and four action tools, two of which
//! (`process_refund`) require a human approval before they run.

mod actions;
mod info;

pub use actions::{BugTracker, NullBugTracker};

use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use ticketflow_core::DomainSource;

#[derive(Debug, Error)]
pub enum ToolError {
    #[error("missing required argument: {0}")]
    MissingArgument(&'static str),

    #[error("domain lookup failed: {0}")]
    Domain(#[from] ticketflow_core::StoreError),
}

/// Whether a tool may run immediately, or must wait for a human decision
/// before `ticketflow-approval` invokes it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApprovalClass {
    Auto,
    RequiresApproval,
}

/// A single named capability the agent workflow can invoke.
#[async_trait]
pub trait Tool: Send + Sync {
    fn name(&self) -> &'static str;

    fn approval_class(&self) -> ApprovalClass;

    /// Run the tool with JSON-encoded arguments, returning a JSON-encoded
    /// result to fold back into the conversation as a tool message.
    async fn invoke(&self, domain: &dyn DomainSource, args: &Value) -> Result<Value, ToolError>;
}

/// The fixed set of tools available to an agent workflow, keyed by name.
pub struct ToolRegistry {
    tools: HashMap<&'static str, Arc<dyn Tool>>,
}

impl ToolRegistry {
    /// Build the canonical registry: the four information tools, password
    /// reset, refund (gated), bug reporting against `bug_tracker`, and
    /// escalation.
    pub fn canonical(bug_tracker: Arc<dyn BugTracker>) -> Self {
        let tools: Vec<Arc<dyn Tool>> = vec![
            Arc::new(info::QueryHelpArticles),
            Arc::new(info::CheckOrderStatus),
            Arc::new(info::GetCustomerHistory),
            Arc::new(info::LookupProduct),
            Arc::new(actions::ResetPassword),
            Arc::new(actions::ProcessRefund),
            Arc::new(actions::CreateBugReport::new(bug_tracker)),
            Arc::new(actions::EscalateToHuman),
        ];
        Self {
            tools: tools.into_iter().map(|t| (t.name(), t)).collect(),
        }
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn Tool>> {
        self.tools.get(name)
    }

    pub fn requires_approval(&self, name: &str) -> bool {
        self.tools
            .get(name)
            .map(|t| t.approval_class() == ApprovalClass::RequiresApproval)
            .unwrap_or(false)
    }

    pub fn specs(&self) -> Vec<&'static str> {
        self.tools.keys().copied().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonical_registry_has_eight_tools() {
        let registry = ToolRegistry::canonical(Arc::new(NullBugTracker));
        assert_eq!(registry.specs().len(), 8);
    }

    #[test]
    fn only_process_refund_requires_approval() {
        let registry = ToolRegistry::canonical(Arc::new(NullBugTracker));
        for name in registry.specs() {
            let expects_approval = name == "process_refund";
            assert_eq!(registry.requires_approval(name), expects_approval, "{name}");
        }
    }
}
