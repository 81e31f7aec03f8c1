use common::{CartId, ProductId};
use thiserror::Error;

/// Errors that can occur when interacting with the storefront store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The cart row changed since it was loaded.
    /// The expected version did not match the stored version.
    #[error("Version conflict for cart {cart_id}: expected version {expected}")]
    VersionConflict { cart_id: CartId, expected: i64 },

    /// A conditional stock decrement found less stock than requested.
    #[error("Stock conflict for product {product_id}: insufficient stock on hand")]
    StockConflict { product_id: ProductId },

    /// A second line for the same product was written to a cart.
    #[error("Duplicate cart line for product {product_id} in cart {cart_id}")]
    DuplicateCartLine {
        cart_id: CartId,
        product_id: ProductId,
    },

    /// An order placement carried an idempotency key that is already recorded.
    #[error("Idempotency key already recorded: {key}")]
    IdempotencyConflict { key: String },

    /// A database error occurred.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A database migration error occurred.
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
