//! Shared identifier types used by every layer of the storefront.

mod types;

pub use types::{
    AddressId, CartId, CartItemId, CategoryId, OrderId, OrderItemId, PaymentId, ProductId, UserId,
};
