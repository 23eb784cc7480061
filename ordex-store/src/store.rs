use chrono::Utc;
use sqlx::sqlite::SqlitePool;
use tracing::debug;

use ordex_core::model::{NewOrder, NewProduct, Order, Product};

use crate::error::{StoreError, StoreResult};

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS products (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    product_id TEXT NOT NULL UNIQUE,
    name TEXT NOT NULL,
    in_stock BOOLEAN NOT NULL DEFAULT 1,
    quantity INTEGER NOT NULL DEFAULT 0,
    price REAL NOT NULL DEFAULT 0.0
);
CREATE TABLE IF NOT EXISTS orders (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    order_id TEXT NOT NULL UNIQUE,
    product_id TEXT NOT NULL,
    quantity_ordered INTEGER NOT NULL,
    status TEXT NOT NULL DEFAULT 'processed',
    timestamp TEXT NOT NULL
);
"#;

/// Persistence over the `products` and `orders` tables.
///
/// Each instance owns an independent store; there is no cross-instance
/// transactional guarantee. The pool hands out a connection per operation,
/// so the background consumer and concurrent HTTP handlers share it safely.
#[derive(Clone)]
pub struct OrderStore {
    pool: SqlitePool,
}

impl OrderStore {
    /// Connect to the database at `url` and ensure the schema exists.
    pub async fn connect(url: &str) -> StoreResult<Self> {
        let pool = SqlitePool::connect(url).await?;
        Self::with_pool(pool).await
    }

    /// Wrap an existing pool (used by tests with in-memory databases).
    pub async fn with_pool(pool: SqlitePool) -> StoreResult<Self> {
        sqlx::raw_sql(SCHEMA).execute(&pool).await?;
        Ok(Self { pool })
    }

    /// Insert an order in a single transaction and return the committed row.
    ///
    /// A duplicate `order_id` fails with [`StoreError::Conflict`].
    pub async fn create_order(&self, order: NewOrder) -> StoreResult<Order> {
        let mut tx = self.pool.begin().await?;
        let row: Order = sqlx::query_as(
            "INSERT INTO orders (order_id, product_id, quantity_ordered, status, timestamp) \
             VALUES (?, ?, ?, ?, ?) RETURNING *",
        )
        .bind(&order.order_id)
        .bind(&order.product_id)
        .bind(order.quantity_ordered)
        .bind(order.status)
        .bind(Utc::now())
        .fetch_one(&mut *tx)
        .await
        .map_err(|err| match &err {
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                StoreError::Conflict(order.order_id.clone())
            }
            _ => StoreError::Database(err),
        })?;
        tx.commit().await?;
        debug!(order_id = %row.order_id, status = %row.status, "order committed");
        Ok(row)
    }

    /// All orders in insertion order.
    pub async fn list_orders(&self) -> StoreResult<Vec<Order>> {
        let orders = sqlx::query_as("SELECT * FROM orders ORDER BY id")
            .fetch_all(&self.pool)
            .await?;
        Ok(orders)
    }

    pub async fn find_product(&self, product_id: &str) -> StoreResult<Option<Product>> {
        let product = sqlx::query_as("SELECT * FROM products WHERE product_id = ?")
            .bind(product_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(product)
    }

    /// Seed catalog rows. Intended for local bootstrap and tests; the
    /// pipeline itself never writes to `products`.
    pub async fn seed_products(&self, products: &[NewProduct]) -> StoreResult<()> {
        for product in products {
            sqlx::query(
                "INSERT INTO products (product_id, name, in_stock, quantity, price) \
                 VALUES (?, ?, ?, ?, ?)",
            )
            .bind(&product.product_id)
            .bind(&product.name)
            .bind(product.in_stock)
            .bind(product.quantity)
            .bind(product.price)
            .execute(&self.pool)
            .await
            .map_err(|err| match &err {
                sqlx::Error::Database(db) if db.is_unique_violation() => {
                    StoreError::Conflict(product.product_id.clone())
                }
                _ => StoreError::Database(err),
            })?;
        }
        Ok(())
    }
}
