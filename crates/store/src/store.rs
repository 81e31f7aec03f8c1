//! The persistence contract consumed by the checkout services.

use async_trait::async_trait;
use common::{AddressId, CartId, CartItemId, CategoryId, OrderId, ProductId, UserId};
use domain::{
    Address, Cart, CartItem, Category, Order, OrderItem, PageRequest, Payment, Product,
    ProductPage,
};

use crate::error::Result;

/// A single line-item write applied together with the cart row update.
#[derive(Debug, Clone)]
pub enum CartChange {
    /// Insert the line, or overwrite its quantity/price/discount snapshot.
    UpsertItem(CartItem),
    /// Delete the line.
    RemoveItem(CartItemId),
}

/// Everything written by one order placement, applied atomically.
#[derive(Debug, Clone)]
pub struct OrderPlacement {
    pub order: Order,
    pub payment: Payment,
    pub items: Vec<OrderItem>,
    /// The cart to empty as part of the placement.
    pub cart_id: CartId,
    /// The cart version the placement was computed against.
    pub cart_version: i64,
    /// De-duplication token supplied by the caller, if any.
    pub idempotency_key: Option<String>,
}

/// A placed order read back with its payment and lines.
#[derive(Debug, Clone)]
pub struct OrderRecord {
    pub order: Order,
    pub payment: Payment,
    pub items: Vec<OrderItem>,
}

/// Relational storage for catalog, carts, addresses, and orders.
///
/// Mutating cart operations are optimistic: the caller passes the cart
/// version it loaded and the store rejects the write with
/// [`StoreError::VersionConflict`](crate::StoreError::VersionConflict) if
/// the row has moved on. Order placement is one all-or-nothing unit of
/// work including conditional stock decrements.
#[async_trait]
pub trait StorefrontStore: Send + Sync {
    // -- Categories --

    async fn insert_category(&self, category: &Category) -> Result<()>;

    async fn find_category(&self, id: CategoryId) -> Result<Option<Category>>;

    // -- Products --

    async fn insert_product(&self, product: &Product) -> Result<()>;

    async fn find_product(&self, id: ProductId) -> Result<Option<Product>>;

    /// Overwrites every mutable product field.
    async fn update_product(&self, product: &Product) -> Result<()>;

    async fn delete_product(&self, id: ProductId) -> Result<()>;

    /// True if the category already holds a product with the given name.
    async fn category_has_product_named(&self, category_id: CategoryId, name: &str)
    -> Result<bool>;

    async fn list_products(&self, page: &PageRequest) -> Result<ProductPage>;

    async fn products_by_category(
        &self,
        category_id: CategoryId,
        page: &PageRequest,
    ) -> Result<ProductPage>;

    /// Case-insensitive substring match on the product name.
    async fn search_products(&self, keyword: &str, page: &PageRequest) -> Result<ProductPage>;

    // -- Addresses --

    async fn insert_address(&self, address: &Address) -> Result<()>;

    async fn find_address(&self, id: AddressId) -> Result<Option<Address>>;

    // -- Carts --

    /// Inserts the cart unless the user already has one (insert-if-absent
    /// keyed on the owning user). Callers re-read after inserting so a
    /// racing creation resolves to the surviving row.
    async fn create_cart(&self, cart: &Cart) -> Result<()>;

    async fn find_cart(&self, id: CartId) -> Result<Option<Cart>>;

    async fn find_cart_by_user(&self, user_id: UserId) -> Result<Option<Cart>>;

    async fn all_carts(&self) -> Result<Vec<Cart>>;

    /// Identifies every cart holding a line for the product.
    async fn carts_with_product(&self, product_id: ProductId) -> Result<Vec<CartId>>;

    /// Commits one cart mutation: the cart row's new total (version-checked)
    /// and the line change, in a single transaction.
    async fn commit_cart(&self, cart: &Cart, change: &CartChange) -> Result<()>;

    // -- Orders --

    /// Runs the whole placement as one transaction: payment, order, order
    /// lines, per-product conditional stock decrements, cart-line removal,
    /// and the cart-total reset. Any failure rolls everything back.
    async fn place_order(&self, placement: &OrderPlacement) -> Result<()>;

    async fn find_order(&self, id: OrderId) -> Result<Option<OrderRecord>>;

    /// Resolves a previously recorded idempotency key to its order.
    async fn order_id_for_key(&self, key: &str) -> Result<Option<OrderId>>;
}
