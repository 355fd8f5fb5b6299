// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Action tools: two fire-and-record stubs (`reset_password`,
//! `escalate_to_human`), the approval-gated `process_refund`, and
//! `create_bug_report`, which delegates to an out-of-scope issue-tracker
//! collaborator.

use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::Arc;
use ticketflow_core::DomainSource;

use super::{ApprovalClass, Tool, ToolError};

fn str_arg<'a>(args: &'a Value, key: &str) -> Option<&'a str> {
    args.get(key).and_then(Value::as_str)
}

pub struct ResetPassword;

#[async_trait]
impl Tool for ResetPassword {
    fn name(&self) -> &'static str {
        "reset_password"
    }

    fn approval_class(&self) -> ApprovalClass {
        ApprovalClass::Auto
    }

    async fn invoke(&self, _domain: &dyn DomainSource, args: &Value) -> Result<Value, ToolError> {
        let customer_id =
            str_arg(args, "customer_id").ok_or(ToolError::MissingArgument("customer_id"))?;
        Ok(json!({ "sent": true, "customer_id": customer_id }))
    }
}

pub struct ProcessRefund;

#[async_trait]
impl Tool for ProcessRefund {
    fn name(&self) -> &'static str {
        "process_refund"
    }

    fn approval_class(&self) -> ApprovalClass {
        ApprovalClass::RequiresApproval
    }

    async fn invoke(&self, domain: &dyn DomainSource, args: &Value) -> Result<Value, ToolError> {
        let order_id = str_arg(args, "order_id").ok_or(ToolError::MissingArgument("order_id"))?;
        let amount_cents = args
            .get("amount_cents")
            .and_then(Value::as_i64)
            .ok_or(ToolError::MissingArgument("amount_cents"))?;
        let reason = str_arg(args, "reason").unwrap_or("");

        let order = domain.get_order(order_id).await?;
        Ok(json!({
            "refunded": true,
            "order_id": order_id,
            "amount_cents": amount_cents,
            "reason": reason,
            "order_found": order.is_some(),
        }))
    }
}

/// Out-of-scope issue-tracker collaborator `create_bug_report` delegates
/// to. No concrete implementation ships in this workspace.
#[async_trait]
pub trait BugTracker: Send + Sync {
    async fn file_issue(&self, summary: &str, priority: &str) -> Result<String, ToolError>;
}

/// Records nothing and returns a synthetic issue id. Used for tests and
/// the demo binary, where no real tracker is configured.
pub struct NullBugTracker;

#[async_trait]
impl BugTracker for NullBugTracker {
    async fn file_issue(&self, _summary: &str, _priority: &str) -> Result<String, ToolError> {
        Ok("issue-unfiled".to_string())
    }
}

pub struct CreateBugReport {
    tracker: Arc<dyn BugTracker>,
}

impl CreateBugReport {
    pub fn new(tracker: Arc<dyn BugTracker>) -> Self {
        Self { tracker }
    }
}

#[async_trait]
impl Tool for CreateBugReport {
    fn name(&self) -> &'static str {
        "create_bug_report"
    }

    fn approval_class(&self) -> ApprovalClass {
        ApprovalClass::Auto
    }

    async fn invoke(&self, _domain: &dyn DomainSource, args: &Value) -> Result<Value, ToolError> {
        let summary = str_arg(args, "summary").ok_or(ToolError::MissingArgument("summary"))?;
        let priority = str_arg(args, "priority").unwrap_or("medium");
        let issue_id = self.tracker.file_issue(summary, priority).await?;
        Ok(json!({ "issue_id": issue_id, "priority": priority }))
    }
}

pub struct EscalateToHuman;

#[async_trait]
impl Tool for EscalateToHuman {
    fn name(&self) -> &'static str {
        "escalate_to_human"
    }

    fn approval_class(&self) -> ApprovalClass {
        ApprovalClass::Auto
    }

    async fn invoke(&self, _domain: &dyn DomainSource, args: &Value) -> Result<Value, ToolError> {
        let reason = str_arg(args, "reason").unwrap_or("unspecified");
        Ok(json!({ "escalated": true, "reason": reason }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ticketflow_store::FakeDomainSource;

    #[tokio::test]
    async fn process_refund_is_gated() {
        assert_eq!(ProcessRefund.approval_class(), ApprovalClass::RequiresApproval);
    }

    #[tokio::test]
    async fn create_bug_report_uses_tracker() {
        let domain = FakeDomainSource::new();
        let tool = CreateBugReport::new(Arc::new(NullBugTracker));
        let result = tool
            .invoke(&domain, &json!({ "summary": "checkout crashes", "priority": "high" }))
            .await
            .unwrap();
        assert_eq!(result["issue_id"], "issue-unfiled");
    }
}
