//! Checkout services: the cart-to-order transactional pipeline.
//!
//! [`CartService`] owns cart mutations (add, adjust, remove, reprice),
//! [`OrderService`] converts a cart into an immutable order as one unit of
//! work, and [`CatalogService`] owns the product write paths that re-apply
//! the pricing policy and propagate price changes into live carts.

mod cart;
mod catalog;
mod error;
mod order;

pub use cart::CartService;
pub use catalog::CatalogService;
pub use error::{CheckoutError, Result};
pub use order::{OrderService, PlaceOrder};
