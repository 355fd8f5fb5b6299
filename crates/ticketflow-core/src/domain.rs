// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Read-only access to the support domain (orders, products, customers,
//! help articles) that the workflow engine's information-gathering tools
//! query. Kept separate from [`crate::Store`], which owns ticket pipeline
//! state rather than the surrounding business data.

use crate::error::StoreError;
use crate::ids::TicketId;
use crate::ticket::TicketStatus;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HelpArticle {
    pub id: String,
    pub category: String,
    pub title: String,
    pub body: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderItem {
    pub product_id: String,
    pub quantity: i32,
    pub unit_price_cents: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderDetails {
    pub id: String,
    pub customer_id: String,
    pub status: String,
    pub total_cents: i64,
    pub tracking_number: Option<String>,
    pub created_at: DateTime<Utc>,
    pub items: Vec<OrderItem>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    pub id: String,
    pub name: String,
    pub sku: String,
    pub description: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Customer {
    pub id: String,
    pub name: String,
    pub email: String,
    pub tier: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TicketSummary {
    pub id: TicketId,
    pub subject: String,
    pub status: TicketStatus,
    pub created_at: DateTime<Utc>,
}

#[async_trait]
pub trait DomainSource: Send + Sync {
    async fn search_help_articles(
        &self,
        category: Option<&str>,
        search_term: Option<&str>,
    ) -> Result<Vec<HelpArticle>, StoreError>;

    async fn get_order(&self, order_id: &str) -> Result<Option<OrderDetails>, StoreError>;

    async fn get_customer(&self, customer_id: &str) -> Result<Option<Customer>, StoreError>;

    async fn recent_tickets_for_customer(
        &self,
        customer_id: &str,
        limit: i64,
    ) -> Result<Vec<TicketSummary>, StoreError>;

    async fn lookup_product(
        &self,
        product_id: Option<&str>,
        name_search: Option<&str>,
    ) -> Result<Vec<Product>, StoreError>;
}
