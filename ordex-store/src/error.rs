/// Persistence errors surfaced by [`OrderStore`](crate::OrderStore).
#[derive(Debug)]
pub enum StoreError {
    /// A unique constraint was violated (duplicate `order_id` or `product_id`).
    Conflict(String),

    /// Any other database failure.
    Database(sqlx::Error),
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreError::Conflict(key) => write!(f, "Constraint violation: {key}"),
            StoreError::Database(err) => write!(f, "Database error: {err}"),
        }
    }
}

impl std::error::Error for StoreError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            StoreError::Conflict(_) => None,
            StoreError::Database(err) => Some(err),
        }
    }
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        StoreError::Database(err)
    }
}

/// Convenience alias for store-layer results.
pub type StoreResult<T> = Result<T, StoreError>;
