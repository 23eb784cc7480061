use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle status of an order row.
///
/// Orders created by the consumer are `processed`; orders created directly
/// over HTTP are `confirmed`. `pending` only appears in synthesized response
/// payloads for out-of-stock products.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum OrderStatus {
    Processed,
    Confirmed,
    Pending,
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OrderStatus::Processed => write!(f, "processed"),
            OrderStatus::Confirmed => write!(f, "confirmed"),
            OrderStatus::Pending => write!(f, "pending"),
        }
    }
}

/// A catalog product. Read-only from the pipeline's perspective; rows are
/// seeded externally.
#[derive(Clone, Debug, Serialize, Deserialize, sqlx::FromRow)]
pub struct Product {
    pub id: i64,
    pub product_id: String,
    pub name: String,
    pub in_stock: bool,
    pub quantity: i64,
    pub price: f64,
}

/// A persisted order. Append-only: never updated after creation.
#[derive(Clone, Debug, Serialize, Deserialize, sqlx::FromRow)]
pub struct Order {
    pub id: i64,
    pub order_id: String,
    pub product_id: String,
    pub quantity_ordered: i64,
    pub status: OrderStatus,
    pub timestamp: DateTime<Utc>,
}

/// Fields of an order to be inserted. The row id and timestamp are assigned
/// by the store at commit time.
#[derive(Clone, Debug)]
pub struct NewOrder {
    pub order_id: String,
    pub product_id: String,
    pub quantity_ordered: i64,
    pub status: OrderStatus,
}

/// Fields of a product to be seeded.
#[derive(Clone, Debug)]
pub struct NewProduct {
    pub product_id: String,
    pub name: String,
    pub in_stock: bool,
    pub quantity: i64,
    pub price: f64,
}
