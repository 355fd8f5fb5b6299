// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Read-only information tools: FAQ search, order lookup, customer
//! history, and product lookup. None of these mutate state, so all are
//! [`ApprovalClass::Auto`].

use async_trait::async_trait;
use serde_json::{json, Value};
use ticketflow_core::DomainSource;

use super::{ApprovalClass, Tool, ToolError};

fn str_arg<'a>(args: &'a Value, key: &str) -> Option<&'a str> {
    args.get(key).and_then(Value::as_str)
}

pub struct QueryHelpArticles;

#[async_trait]
impl Tool for QueryHelpArticles {
    fn name(&self) -> &'static str {
        "query_help_articles"
    }

    fn approval_class(&self) -> ApprovalClass {
        ApprovalClass::Auto
    }

    async fn invoke(&self, domain: &dyn DomainSource, args: &Value) -> Result<Value, ToolError> {
        let category = str_arg(args, "category");
        let search_term = str_arg(args, "search_term");
        let articles = domain.search_help_articles(category, search_term).await?;
        Ok(json!({ "articles": articles }))
    }
}

pub struct CheckOrderStatus;

#[async_trait]
impl Tool for CheckOrderStatus {
    fn name(&self) -> &'static str {
        "check_order_status"
    }

    fn approval_class(&self) -> ApprovalClass {
        ApprovalClass::Auto
    }

    async fn invoke(&self, domain: &dyn DomainSource, args: &Value) -> Result<Value, ToolError> {
        let order_id = str_arg(args, "order_id").ok_or(ToolError::MissingArgument("order_id"))?;
        match domain.get_order(order_id).await? {
            Some(order) => Ok(serde_json::to_value(order).unwrap_or(Value::Null)),
            None => Ok(json!({ "error": "order not found", "order_id": order_id })),
        }
    }
}

pub struct GetCustomerHistory;

#[async_trait]
impl Tool for GetCustomerHistory {
    fn name(&self) -> &'static str {
        "get_customer_history"
    }

    fn approval_class(&self) -> ApprovalClass {
        ApprovalClass::Auto
    }

    async fn invoke(&self, domain: &dyn DomainSource, args: &Value) -> Result<Value, ToolError> {
        let customer_id =
            str_arg(args, "customer_id").ok_or(ToolError::MissingArgument("customer_id"))?;
        let customer = domain.get_customer(customer_id).await?;
        let recent_tickets = domain.recent_tickets_for_customer(customer_id, 5).await?;
        Ok(json!({ "customer": customer, "recent_tickets": recent_tickets }))
    }
}

pub struct LookupProduct;

#[async_trait]
impl Tool for LookupProduct {
    fn name(&self) -> &'static str {
        "lookup_product"
    }

    fn approval_class(&self) -> ApprovalClass {
        ApprovalClass::Auto
    }

    async fn invoke(&self, domain: &dyn DomainSource, args: &Value) -> Result<Value, ToolError> {
        let product_id = str_arg(args, "product_id");
        let name_search = str_arg(args, "name_search");
        let products = domain.lookup_product(product_id, name_search).await?;
        Ok(json!({ "products": products }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ticketflow_store::FakeDomainSource;

    #[tokio::test]
    async fn check_order_status_reports_missing_order() {
        let domain = FakeDomainSource::new();
        let result = CheckOrderStatus
            .invoke(&domain, &json!({ "order_id": "ord_missing" }))
            .await
            .unwrap();
        assert_eq!(result["error"], "order not found");
    }

    #[tokio::test]
    async fn check_order_status_missing_argument_errors() {
        let domain = FakeDomainSource::new();
        let err = CheckOrderStatus.invoke(&domain, &json!({})).await.unwrap_err();
        assert!(matches!(err, ToolError::MissingArgument("order_id")));
    }
}
