//! Shared application state.

use checkout::{CartService, CatalogService, OrderService};
use store::StorefrontStore;

/// Services and the store, shared by every handler.
pub struct AppState<S> {
    pub carts: CartService<S>,
    pub orders: OrderService<S>,
    pub catalog: CatalogService<S>,
    pub store: S,
}

impl<S: StorefrontStore + Clone> AppState<S> {
    /// Builds the application state over a store.
    pub fn new(store: S) -> Self {
        Self {
            carts: CartService::new(store.clone()),
            orders: OrderService::new(store.clone()),
            catalog: CatalogService::new(store.clone()),
            store,
        }
    }
}
