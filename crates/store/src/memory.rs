use std::collections::HashMap;
use std::sync::Arc;

use common::{AddressId, CartId, CategoryId, OrderId, ProductId, UserId};
use domain::{
    Address, Cart, Category, Order, OrderItem, PageRequest, Payment, Product, ProductPage,
    ProductSort, SortOrder,
};
use tokio::sync::RwLock;

use crate::{
    Result, StoreError,
    store::{CartChange, OrderPlacement, OrderRecord, StorefrontStore},
};

use async_trait::async_trait;

#[derive(Default)]
struct State {
    categories: HashMap<CategoryId, Category>,
    products: HashMap<ProductId, Product>,
    addresses: HashMap<AddressId, Address>,
    carts: HashMap<CartId, Cart>,
    orders: HashMap<OrderId, Order>,
    payments: HashMap<common::PaymentId, Payment>,
    order_items: Vec<OrderItem>,
    idempotency: HashMap<String, OrderId>,
}

/// In-memory storefront store for testing.
///
/// All operations run under one write lock, so every store call is atomic;
/// the version and stock-floor checks still run so tests observe the same
/// conflict errors as the PostgreSQL implementation.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    state: Arc<RwLock<State>>,
}

impl InMemoryStore {
    /// Creates a new empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of placed orders.
    pub async fn order_count(&self) -> usize {
        self.state.read().await.orders.len()
    }

    /// Returns the number of payment records.
    pub async fn payment_count(&self) -> usize {
        self.state.read().await.payments.len()
    }

    /// Returns the number of order lines across all orders.
    pub async fn order_item_count(&self) -> usize {
        self.state.read().await.order_items.len()
    }

    fn page_of(mut products: Vec<Product>, page: &PageRequest) -> ProductPage {
        match (page.sort_by, page.sort_order) {
            (ProductSort::Name, SortOrder::Asc) => products.sort_by(|a, b| a.name.cmp(&b.name)),
            (ProductSort::Name, SortOrder::Desc) => products.sort_by(|a, b| b.name.cmp(&a.name)),
            (ProductSort::Price, SortOrder::Asc) => products.sort_by(|a, b| {
                a.price
                    .partial_cmp(&b.price)
                    .unwrap_or(std::cmp::Ordering::Equal)
            }),
            (ProductSort::Price, SortOrder::Desc) => products.sort_by(|a, b| {
                b.price
                    .partial_cmp(&a.price)
                    .unwrap_or(std::cmp::Ordering::Equal)
            }),
        }

        let total = products.len() as u64;
        let content: Vec<Product> = products
            .into_iter()
            .skip(page.offset() as usize)
            .take(page.page_size as usize)
            .collect();
        ProductPage::new(content, page, total)
    }
}

#[async_trait]
impl StorefrontStore for InMemoryStore {
    async fn insert_category(&self, category: &Category) -> Result<()> {
        let mut state = self.state.write().await;
        state.categories.insert(category.id, category.clone());
        Ok(())
    }

    async fn find_category(&self, id: CategoryId) -> Result<Option<Category>> {
        Ok(self.state.read().await.categories.get(&id).cloned())
    }

    async fn insert_product(&self, product: &Product) -> Result<()> {
        let mut state = self.state.write().await;
        state.products.insert(product.id, product.clone());
        Ok(())
    }

    async fn find_product(&self, id: ProductId) -> Result<Option<Product>> {
        Ok(self.state.read().await.products.get(&id).cloned())
    }

    async fn update_product(&self, product: &Product) -> Result<()> {
        let mut state = self.state.write().await;
        state.products.insert(product.id, product.clone());
        Ok(())
    }

    async fn delete_product(&self, id: ProductId) -> Result<()> {
        let mut state = self.state.write().await;
        state.products.remove(&id);
        Ok(())
    }

    async fn category_has_product_named(
        &self,
        category_id: CategoryId,
        name: &str,
    ) -> Result<bool> {
        let state = self.state.read().await;
        Ok(state
            .products
            .values()
            .any(|p| p.category_id == category_id && p.name == name))
    }

    async fn list_products(&self, page: &PageRequest) -> Result<ProductPage> {
        let state = self.state.read().await;
        let products: Vec<Product> = state.products.values().cloned().collect();
        Ok(Self::page_of(products, page))
    }

    async fn products_by_category(
        &self,
        category_id: CategoryId,
        page: &PageRequest,
    ) -> Result<ProductPage> {
        let state = self.state.read().await;
        let products: Vec<Product> = state
            .products
            .values()
            .filter(|p| p.category_id == category_id)
            .cloned()
            .collect();
        Ok(Self::page_of(products, page))
    }

    async fn search_products(&self, keyword: &str, page: &PageRequest) -> Result<ProductPage> {
        let needle = keyword.to_lowercase();
        let state = self.state.read().await;
        let products: Vec<Product> = state
            .products
            .values()
            .filter(|p| p.name.to_lowercase().contains(&needle))
            .cloned()
            .collect();
        Ok(Self::page_of(products, page))
    }

    async fn insert_address(&self, address: &Address) -> Result<()> {
        let mut state = self.state.write().await;
        state.addresses.insert(address.id, address.clone());
        Ok(())
    }

    async fn find_address(&self, id: AddressId) -> Result<Option<Address>> {
        Ok(self.state.read().await.addresses.get(&id).cloned())
    }

    async fn create_cart(&self, cart: &Cart) -> Result<()> {
        let mut state = self.state.write().await;
        // Insert-if-absent keyed on the owning user; a racing creation
        // keeps the first row, exactly like the unique index in Postgres.
        if state.carts.values().any(|c| c.user_id == cart.user_id) {
            return Ok(());
        }
        state.carts.insert(cart.id, cart.clone());
        Ok(())
    }

    async fn find_cart(&self, id: CartId) -> Result<Option<Cart>> {
        Ok(self.state.read().await.carts.get(&id).cloned())
    }

    async fn find_cart_by_user(&self, user_id: UserId) -> Result<Option<Cart>> {
        let state = self.state.read().await;
        Ok(state
            .carts
            .values()
            .find(|c| c.user_id == user_id)
            .cloned())
    }

    async fn all_carts(&self) -> Result<Vec<Cart>> {
        Ok(self.state.read().await.carts.values().cloned().collect())
    }

    async fn carts_with_product(&self, product_id: ProductId) -> Result<Vec<CartId>> {
        let state = self.state.read().await;
        Ok(state
            .carts
            .values()
            .filter(|c| c.items.iter().any(|i| i.product_id == product_id))
            .map(|c| c.id)
            .collect())
    }

    async fn commit_cart(&self, cart: &Cart, change: &CartChange) -> Result<()> {
        let mut state = self.state.write().await;

        let stored = state
            .carts
            .get(&cart.id)
            .ok_or(StoreError::Database(sqlx::Error::RowNotFound))?;
        if stored.version != cart.version {
            return Err(StoreError::VersionConflict {
                cart_id: cart.id,
                expected: cart.version,
            });
        }

        if let CartChange::UpsertItem(item) = change {
            let duplicate = cart
                .items
                .iter()
                .any(|i| i.product_id == item.product_id && i.id != item.id);
            if duplicate {
                return Err(StoreError::DuplicateCartLine {
                    cart_id: cart.id,
                    product_id: item.product_id,
                });
            }
        }

        let mut committed = cart.clone();
        committed.version = cart.version + 1;
        state.carts.insert(cart.id, committed);
        Ok(())
    }

    async fn place_order(&self, placement: &OrderPlacement) -> Result<()> {
        let mut state = self.state.write().await;

        // Validate everything before the first write so a failure leaves
        // the state untouched, mirroring a rolled-back transaction.
        if let Some(key) = &placement.idempotency_key
            && state.idempotency.contains_key(key)
        {
            return Err(StoreError::IdempotencyConflict { key: key.clone() });
        }

        let cart = state
            .carts
            .get(&placement.cart_id)
            .ok_or(StoreError::Database(sqlx::Error::RowNotFound))?;
        if cart.version != placement.cart_version {
            return Err(StoreError::VersionConflict {
                cart_id: placement.cart_id,
                expected: placement.cart_version,
            });
        }

        for item in &placement.items {
            let in_stock = state
                .products
                .get(&item.product_id)
                .map(|p| p.quantity >= item.quantity)
                .unwrap_or(false);
            if !in_stock {
                return Err(StoreError::StockConflict {
                    product_id: item.product_id,
                });
            }
        }

        for item in &placement.items {
            if let Some(product) = state.products.get_mut(&item.product_id) {
                product.quantity -= item.quantity;
            }
        }

        state
            .payments
            .insert(placement.payment.id, placement.payment.clone());
        state
            .orders
            .insert(placement.order.id, placement.order.clone());
        state.order_items.extend(placement.items.iter().cloned());
        if let Some(key) = &placement.idempotency_key {
            state.idempotency.insert(key.clone(), placement.order.id);
        }

        if let Some(cart) = state.carts.get_mut(&placement.cart_id) {
            cart.items.clear();
            cart.total_price = 0.0;
            cart.version += 1;
        }
        Ok(())
    }

    async fn find_order(&self, id: OrderId) -> Result<Option<OrderRecord>> {
        let state = self.state.read().await;
        let Some(order) = state.orders.get(&id).cloned() else {
            return Ok(None);
        };
        let payment = state
            .payments
            .get(&order.payment_id)
            .cloned()
            .ok_or(StoreError::Database(sqlx::Error::RowNotFound))?;
        let items: Vec<OrderItem> = state
            .order_items
            .iter()
            .filter(|i| i.order_id == id)
            .cloned()
            .collect();
        Ok(Some(OrderRecord {
            order,
            payment,
            items,
        }))
    }

    async fn order_id_for_key(&self, key: &str) -> Result<Option<OrderId>> {
        Ok(self.state.read().await.idempotency.get(key).copied())
    }
}
