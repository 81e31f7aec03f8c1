//! Domain layer for the storefront backend.
//!
//! Entities, the pricing policy, cart-aggregate helpers, and the view
//! shapes returned across the API boundary. Everything here is pure;
//! persistence and business orchestration live in the `store` and
//! `checkout` crates.

mod address;
mod cart;
mod catalog;
mod order;
mod paging;
pub mod pricing;
mod views;

pub use address::Address;
pub use cart::{Cart, CartItem};
pub use catalog::{Category, Product, ProductDraft};
pub use order::{ORDER_ACCEPTED, Order, OrderItem, Payment};
pub use paging::{PageRequest, ProductPage, ProductSort, SortOrder};
pub use views::{CartView, OrderItemView, OrderView, PaymentView, ProductView};
