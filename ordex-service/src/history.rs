//! Read-side aggregation across sibling instances.

use std::collections::HashSet;

use serde::Deserialize;
use tracing::debug;

use ordex_core::model::Order;

#[derive(Debug, Deserialize)]
struct OrdersPage {
    orders: Vec<Order>,
}

/// Fans out read queries to the configured sibling instances and merges
/// the results.
///
/// Ordering is deterministic: siblings are queried in configuration order,
/// each sibling's orders keep their listing order, and deduplication by
/// `order_id` keeps the first occurrence encountered. An unreachable
/// sibling (or one answering non-200) is skipped silently; partial results
/// are returned without surfacing an error.
#[derive(Clone)]
pub struct HistoryAggregator {
    client: reqwest::Client,
    siblings: Vec<String>,
}

impl HistoryAggregator {
    pub fn new(siblings: Vec<String>, client: reqwest::Client) -> Self {
        Self { client, siblings }
    }

    /// All orders belonging to `username` across every reachable sibling,
    /// deduplicated by `order_id` in first-seen order.
    pub async fn history_for(&self, username: &str) -> Vec<Order> {
        let prefix = format!("{username}-");
        let mut seen = HashSet::new();
        let mut merged = Vec::new();

        for sibling in &self.siblings {
            let orders = match self.fetch_orders(sibling).await {
                Ok(orders) => orders,
                Err(err) => {
                    debug!(sibling = %sibling, error = %err, "sibling skipped");
                    continue;
                }
            };
            for order in orders {
                if order.order_id.starts_with(&prefix) && seen.insert(order.order_id.clone()) {
                    merged.push(order);
                }
            }
        }
        merged
    }

    async fn fetch_orders(&self, base_url: &str) -> Result<Vec<Order>, reqwest::Error> {
        let page: OrdersPage = self
            .client
            .get(format!("{base_url}/orders"))
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(page.orders)
    }
}
