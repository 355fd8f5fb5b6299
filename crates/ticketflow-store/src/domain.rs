// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Postgres-backed [`DomainSource`] over the `customers`, `products`,
//! `orders`, `order_items`, and `help_articles` tables.

use async_trait::async_trait;
use sqlx::{FromRow, PgPool};
use ticketflow_core::{
    Customer, DomainSource, HelpArticle, OrderDetails, OrderItem, Product, StoreError,
    TicketSummary,
};

use crate::pg::classify;

pub struct PgDomainSource {
    pool: PgPool,
}

impl PgDomainSource {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(FromRow)]
struct OrderRow {
    id: String,
    customer_id: String,
    status: String,
    total_cents: i64,
    tracking_number: Option<String>,
    created_at: chrono::DateTime<chrono::Utc>,
}

#[derive(FromRow)]
struct HelpArticleRow {
    id: String,
    category: String,
    title: String,
    body: String,
}

impl From<HelpArticleRow> for HelpArticle {
    fn from(r: HelpArticleRow) -> Self {
        HelpArticle {
            id: r.id,
            category: r.category,
            title: r.title,
            body: r.body,
        }
    }
}

#[derive(FromRow)]
struct OrderItemRow {
    product_id: String,
    quantity: i32,
    unit_price_cents: i64,
}

impl From<OrderItemRow> for OrderItem {
    fn from(r: OrderItemRow) -> Self {
        OrderItem {
            product_id: r.product_id,
            quantity: r.quantity,
            unit_price_cents: r.unit_price_cents,
        }
    }
}

#[derive(FromRow)]
struct ProductRow {
    id: String,
    name: String,
    sku: String,
    description: String,
}

impl From<ProductRow> for Product {
    fn from(r: ProductRow) -> Self {
        Product {
            id: r.id,
            name: r.name,
            sku: r.sku,
            description: r.description,
        }
    }
}

#[derive(FromRow)]
struct CustomerRow {
    id: String,
    name: String,
    email: String,
    tier: String,
}

impl From<CustomerRow> for Customer {
    fn from(r: CustomerRow) -> Self {
        Customer {
            id: r.id,
            name: r.name,
            email: r.email,
            tier: r.tier,
        }
    }
}

#[async_trait]
impl DomainSource for PgDomainSource {
    async fn search_help_articles(
        &self,
        category: Option<&str>,
        search_term: Option<&str>,
    ) -> Result<Vec<HelpArticle>, StoreError> {
        let rows: Vec<HelpArticleRow> = match (category, search_term) {
            (Some(cat), Some(term)) => {
                sqlx::query_as(
                    "SELECT id, category, title, body FROM help_articles \
                     WHERE category = $1 AND (title ILIKE '%' || $2 || '%' \
                     OR search_terms ILIKE '%' || $2 || '%') LIMIT 10",
                )
                .bind(cat)
                .bind(term)
                .fetch_all(&self.pool)
                .await
            }
            (Some(cat), None) => {
                sqlx::query_as(
                    "SELECT id, category, title, body FROM help_articles WHERE category = $1 LIMIT 10",
                )
                .bind(cat)
                .fetch_all(&self.pool)
                .await
            }
            (None, Some(term)) => {
                sqlx::query_as(
                    "SELECT id, category, title, body FROM help_articles \
                     WHERE title ILIKE '%' || $1 || '%' OR search_terms ILIKE '%' || $1 || '%' LIMIT 10",
                )
                .bind(term)
                .fetch_all(&self.pool)
                .await
            }
            (None, None) => {
                sqlx::query_as("SELECT id, category, title, body FROM help_articles LIMIT 10")
                    .fetch_all(&self.pool)
                    .await
            }
        }
        .map_err(classify)?;
        Ok(rows.into_iter().map(HelpArticleRow::into).collect())
    }

    async fn get_order(&self, order_id: &str) -> Result<Option<OrderDetails>, StoreError> {
        let order: Option<OrderRow> = sqlx::query_as(
            "SELECT id, customer_id, status, total_cents, tracking_number, created_at \
             FROM orders WHERE id = $1",
        )
        .bind(order_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(classify)?;
        let Some(order) = order else {
            return Ok(None);
        };

        let items: Vec<OrderItemRow> = sqlx::query_as(
            "SELECT product_id, quantity, unit_price_cents FROM order_items WHERE order_id = $1",
        )
        .bind(order_id)
        .fetch_all(&self.pool)
        .await
        .map_err(classify)?;
        let items: Vec<OrderItem> = items.into_iter().map(OrderItemRow::into).collect();

        Ok(Some(OrderDetails {
            id: order.id,
            customer_id: order.customer_id,
            status: order.status,
            total_cents: order.total_cents,
            tracking_number: order.tracking_number,
            created_at: order.created_at,
            items,
        }))
    }

    async fn get_customer(&self, customer_id: &str) -> Result<Option<Customer>, StoreError> {
        let row: Option<CustomerRow> =
            sqlx::query_as("SELECT id, name, email, tier FROM customers WHERE id = $1")
                .bind(customer_id)
                .fetch_optional(&self.pool)
                .await
                .map_err(classify)?;
        Ok(row.map(CustomerRow::into))
    }

    async fn recent_tickets_for_customer(
        &self,
        customer_id: &str,
        limit: i64,
    ) -> Result<Vec<TicketSummary>, StoreError> {
        #[derive(FromRow)]
        struct Row {
            id: uuid::Uuid,
            subject: String,
            status: String,
            created_at: chrono::DateTime<chrono::Utc>,
        }
        let rows: Vec<Row> = sqlx::query_as(
            "SELECT id, subject, status, created_at FROM tickets \
             WHERE customer_id = $1 ORDER BY created_at DESC LIMIT $2",
        )
        .bind(customer_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(classify)?;

        Ok(rows
            .into_iter()
            .map(|r| TicketSummary {
                id: ticketflow_core::TicketId::from_uuid(r.id),
                subject: r.subject,
                status: r
                    .status
                    .parse()
                    .unwrap_or(ticketflow_core::TicketStatus::Pending),
                created_at: r.created_at,
            })
            .collect())
    }

    async fn lookup_product(
        &self,
        product_id: Option<&str>,
        name_search: Option<&str>,
    ) -> Result<Vec<Product>, StoreError> {
        let rows: Vec<ProductRow> = match (product_id, name_search) {
            (Some(id), _) => {
                sqlx::query_as("SELECT id, name, sku, description FROM products WHERE id = $1")
                    .bind(id)
                    .fetch_all(&self.pool)
                    .await
            }
            (None, Some(term)) => {
                sqlx::query_as(
                    "SELECT id, name, sku, description FROM products WHERE name ILIKE '%' || $1 || '%' LIMIT 10",
                )
                .bind(term)
                .fetch_all(&self.pool)
                .await
            }
            (None, None) => {
                sqlx::query_as("SELECT id, name, sku, description FROM products LIMIT 10")
                    .fetch_all(&self.pool)
                    .await
            }
        }
        .map_err(classify)?;
        Ok(rows.into_iter().map(ProductRow::into).collect())
    }
}
