//! Checkout error types.

use common::{AddressId, CartId, CategoryId, OrderId, ProductId, UserId};
use store::StoreError;
use thiserror::Error;

/// Errors surfaced by the checkout services.
///
/// Not-found and business-rule variants carry enough context to name the
/// offending record in the response; infrastructure failures pass through
/// from the store untouched.
#[derive(Debug, Error)]
pub enum CheckoutError {
    /// Referenced product does not exist.
    #[error("Product with productId {product_id} not found.")]
    ProductNotFound { product_id: ProductId },

    /// Referenced category does not exist.
    #[error("Category with categoryId {category_id} not found.")]
    CategoryNotFound { category_id: CategoryId },

    /// Referenced cart does not exist.
    #[error("Cart not found with id {cart_id}")]
    CartNotFound { cart_id: CartId },

    /// The user has no cart yet.
    #[error("Cart not found for user {user_id}")]
    UserCartNotFound { user_id: UserId },

    /// The cart holds no line for the product.
    #[error("Cart item not found with cartId {cart_id} and productId {product_id}")]
    CartItemNotFound {
        cart_id: CartId,
        product_id: ProductId,
    },

    /// Referenced address does not exist.
    #[error("Address not found with id {address_id}")]
    AddressNotFound { address_id: AddressId },

    /// Referenced order does not exist.
    #[error("Order not found with id {order_id}")]
    OrderNotFound { order_id: OrderId },

    /// The cart already holds a line for the product.
    #[error("Product {name} already exists in the cart.")]
    DuplicateCartItem { name: String },

    /// The category already holds a product with this name.
    #[error("Product {name} already exists")]
    DuplicateProduct { name: String },

    /// The product has zero stock on hand.
    #[error("Product {name} has no quantity.")]
    OutOfStock { name: String },

    /// The product's stock is below the requested quantity.
    #[error("Product {name} has no enough quantity.")]
    InsufficientStock { name: String },

    /// A quantity adjustment would drive the line below zero.
    #[error("The resulting quantity cannot be negative.")]
    NegativeQuantity,

    /// A zero quantity was requested where at least one is required.
    #[error("Quantity must be at least 1, got {quantity}")]
    InvalidQuantity { quantity: u32 },

    /// Order placement was attempted against an empty cart.
    #[error("Cart is empty")]
    EmptyCart,

    /// Storage failure or store-level conflict.
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Result type for checkout operations.
pub type Result<T> = std::result::Result<T, CheckoutError>;
