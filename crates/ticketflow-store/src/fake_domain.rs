// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-memory [`DomainSource`] double seeded with fixture orders, products,
//! customers, and help articles, for workflow tool tests that should not
//! need a live Postgres instance.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use ticketflow_core::{
    Customer, DomainSource, HelpArticle, OrderDetails, Product, StoreError, TicketSummary,
};

#[derive(Default)]
struct Inner {
    orders: HashMap<String, OrderDetails>,
    customers: HashMap<String, Customer>,
    products: HashMap<String, Product>,
    help_articles: Vec<HelpArticle>,
    tickets_by_customer: HashMap<String, Vec<TicketSummary>>,
}

/// Thread-safe in-memory `DomainSource`. Cheap to clone (shares state via `Arc`).
#[derive(Clone, Default)]
pub struct FakeDomainSource {
    inner: Arc<Mutex<Inner>>,
}

impl FakeDomainSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_order(self, order: OrderDetails) -> Self {
        self.inner.lock().orders.insert(order.id.clone(), order);
        self
    }

    pub fn with_customer(self, customer: Customer) -> Self {
        self.inner
            .lock()
            .customers
            .insert(customer.id.clone(), customer);
        self
    }

    pub fn with_product(self, product: Product) -> Self {
        self.inner
            .lock()
            .products
            .insert(product.id.clone(), product);
        self
    }

    pub fn with_help_article(self, article: HelpArticle) -> Self {
        self.inner.lock().help_articles.push(article);
        self
    }

    pub fn with_ticket_summary(self, customer_id: &str, summary: TicketSummary) -> Self {
        self.inner
            .lock()
            .tickets_by_customer
            .entry(customer_id.to_string())
            .or_default()
            .push(summary);
        self
    }
}

#[async_trait]
impl DomainSource for FakeDomainSource {
    async fn search_help_articles(
        &self,
        category: Option<&str>,
        search_term: Option<&str>,
    ) -> Result<Vec<HelpArticle>, StoreError> {
        let inner = self.inner.lock();
        Ok(inner
            .help_articles
            .iter()
            .filter(|a| category.map(|c| c == a.category).unwrap_or(true))
            .filter(|a| {
                search_term
                    .map(|t| {
                        a.title.to_lowercase().contains(&t.to_lowercase())
                            || a.body.to_lowercase().contains(&t.to_lowercase())
                    })
                    .unwrap_or(true)
            })
            .cloned()
            .collect())
    }

    async fn get_order(&self, order_id: &str) -> Result<Option<OrderDetails>, StoreError> {
        Ok(self.inner.lock().orders.get(order_id).cloned())
    }

    async fn get_customer(&self, customer_id: &str) -> Result<Option<Customer>, StoreError> {
        Ok(self.inner.lock().customers.get(customer_id).cloned())
    }

    async fn recent_tickets_for_customer(
        &self,
        customer_id: &str,
        limit: i64,
    ) -> Result<Vec<TicketSummary>, StoreError> {
        let inner = self.inner.lock();
        Ok(inner
            .tickets_by_customer
            .get(customer_id)
            .cloned()
            .unwrap_or_default()
            .into_iter()
            .take(limit.max(0) as usize)
            .collect())
    }

    async fn lookup_product(
        &self,
        product_id: Option<&str>,
        name_search: Option<&str>,
    ) -> Result<Vec<Product>, StoreError> {
        let inner = self.inner.lock();
        Ok(inner
            .products
            .values()
            .filter(|p| product_id.map(|id| id == p.id).unwrap_or(true))
            .filter(|p| {
                name_search
                    .map(|t| p.name.to_lowercase().contains(&t.to_lowercase()))
                    .unwrap_or(true)
            })
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use ticketflow_core::{TicketId, TicketStatus};

    #[tokio::test]
    async fn get_order_returns_seeded_order() {
        let source = FakeDomainSource::new().with_order(OrderDetails {
            id: "order_1".into(),
            customer_id: "cust_1".into(),
            status: "shipped".into(),
            total_cents: 1999,
            tracking_number: Some("TRACK123".into()),
            created_at: Utc::now(),
            items: vec![],
        });
        let order = source.get_order("order_1").await.unwrap().unwrap();
        assert_eq!(order.customer_id, "cust_1");
        assert!(source.get_order("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn search_help_articles_filters_by_category_and_term() {
        let source = FakeDomainSource::new()
            .with_help_article(HelpArticle {
                id: "a1".into(),
                category: "billing".into(),
                title: "How refunds work".into(),
                body: "Refunds take 5 days".into(),
            })
            .with_help_article(HelpArticle {
                id: "a2".into(),
                category: "shipping".into(),
                title: "Tracking your order".into(),
                body: "Use the tracking number".into(),
            });

        let billing = source
            .search_help_articles(Some("billing"), None)
            .await
            .unwrap();
        assert_eq!(billing.len(), 1);
        assert_eq!(billing[0].id, "a1");

        let tracking = source
            .search_help_articles(None, Some("tracking"))
            .await
            .unwrap();
        assert_eq!(tracking.len(), 1);
        assert_eq!(tracking[0].id, "a2");
    }

    #[tokio::test]
    async fn recent_tickets_respects_limit() {
        let customer_id = "cust_1";
        let mut source = FakeDomainSource::new();
        for i in 0..5 {
            source = source.with_ticket_summary(
                customer_id,
                TicketSummary {
                    id: TicketId::new(),
                    subject: format!("ticket {i}"),
                    status: TicketStatus::Pending,
                    created_at: Utc::now(),
                },
            );
        }
        let recent = source
            .recent_tickets_for_customer(customer_id, 3)
            .await
            .unwrap();
        assert_eq!(recent.len(), 3);
    }
}
