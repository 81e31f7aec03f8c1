//! Cart mutation engine.

use common::{CartId, ProductId, UserId};
use domain::{Cart, CartItem, CartView, Product};
use store::{CartChange, StorefrontStore};

use crate::error::{CheckoutError, Result};

/// Service owning all cart mutations for a user's cart.
///
/// Every operation commits through a single store transaction scoped to the
/// cart, and the running total is recomputed from the current lines inside
/// that transaction, so the total-equals-sum-of-lines invariant holds after
/// every call.
#[derive(Clone)]
pub struct CartService<S> {
    store: S,
}

impl<S: StorefrontStore> CartService<S> {
    /// Creates a new cart service over the given store.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Adds a product to the caller's cart, creating the cart lazily.
    ///
    /// Fails if the product is missing, already in the cart, out of stock,
    /// or stocked below the requested quantity. On success the new line
    /// snapshots the product's current special price and discount.
    #[tracing::instrument(skip(self))]
    pub async fn add_to_cart(
        &self,
        user_id: UserId,
        product_id: ProductId,
        quantity: u32,
    ) -> Result<CartView> {
        if quantity == 0 {
            return Err(CheckoutError::InvalidQuantity { quantity });
        }

        let mut cart = self.resolve_cart(user_id).await?;
        let product = self.require_product(product_id).await?;

        if cart.item_for(product_id).is_some() {
            return Err(CheckoutError::DuplicateCartItem { name: product.name });
        }
        if product.quantity == 0 {
            return Err(CheckoutError::OutOfStock { name: product.name });
        }
        if product.quantity < quantity {
            return Err(CheckoutError::InsufficientStock { name: product.name });
        }

        let item = CartItem::new(
            cart.id,
            product_id,
            quantity,
            product.special_price,
            product.discount,
        );
        cart.items.push(item.clone());
        cart.recompute_total();

        self.store
            .commit_cart(&cart, &CartChange::UpsertItem(item))
            .await?;
        metrics::counter!("cart_items_added_total").increment(1);

        self.cart_view(&cart).await
    }

    /// Adjusts a line's quantity by a signed delta (the caller translates
    /// increase/decrease operations into `+1`/`-1`, and delete into the
    /// negated current quantity).
    ///
    /// A resulting quantity of exactly 0 delegates to the removal path; a
    /// negative result is rejected. Otherwise the line re-snapshots the
    /// product's current special price and discount.
    #[tracing::instrument(skip(self))]
    pub async fn adjust_quantity(
        &self,
        user_id: UserId,
        product_id: ProductId,
        delta: i32,
    ) -> Result<CartView> {
        let mut cart = self
            .store
            .find_cart_by_user(user_id)
            .await?
            .ok_or(CheckoutError::UserCartNotFound { user_id })?;
        let product = self.require_product(product_id).await?;
        let cart_id = cart.id;

        let Some(item) = cart.item_for(product_id) else {
            return Err(CheckoutError::CartItemNotFound {
                cart_id,
                product_id,
            });
        };

        if product.quantity == 0 {
            return Err(CheckoutError::OutOfStock { name: product.name });
        }
        if product.quantity < delta.unsigned_abs() {
            return Err(CheckoutError::InsufficientStock { name: product.name });
        }

        let new_quantity = i64::from(item.quantity) + i64::from(delta);
        if new_quantity < 0 {
            return Err(CheckoutError::NegativeQuantity);
        }
        if new_quantity == 0 {
            self.remove_line(&mut cart, product_id).await?;
            return self.cart_view(&cart).await;
        }

        if let Some(line) = cart.item_for_mut(product_id) {
            line.quantity = new_quantity as u32;
            line.product_price = product.special_price;
            line.discount = product.discount;
        }
        cart.recompute_total();

        let Some(snapshot) = cart.item_for(product_id).cloned() else {
            return Err(CheckoutError::CartItemNotFound {
                cart_id,
                product_id,
            });
        };
        self.store
            .commit_cart(&cart, &CartChange::UpsertItem(snapshot))
            .await?;
        metrics::counter!("cart_items_adjusted_total").increment(1);

        self.cart_view(&cart).await
    }

    /// Removes a product's line from a cart and rebalances the total.
    ///
    /// Returns a confirmation message naming the removed product.
    #[tracing::instrument(skip(self))]
    pub async fn remove_from_cart(&self, cart_id: CartId, product_id: ProductId) -> Result<String> {
        let mut cart = self
            .store
            .find_cart(cart_id)
            .await?
            .ok_or(CheckoutError::CartNotFound { cart_id })?;
        let product = self.require_product(product_id).await?;

        self.remove_line(&mut cart, product_id).await?;
        metrics::counter!("cart_items_removed_total").increment(1);

        Ok(format!("Product {} deleted successfully.", product.name))
    }

    /// Re-snapshots a line's price from the product's current special price
    /// and rebalances the cart total. Invoked when a product's price changes
    /// elsewhere in the system.
    #[tracing::instrument(skip(self))]
    pub async fn reprice(&self, cart_id: CartId, product_id: ProductId) -> Result<()> {
        let mut cart = self
            .store
            .find_cart(cart_id)
            .await?
            .ok_or(CheckoutError::CartNotFound { cart_id })?;
        let product = self.require_product(product_id).await?;

        let Some(line) = cart.item_for_mut(product_id) else {
            return Err(CheckoutError::CartItemNotFound {
                cart_id,
                product_id,
            });
        };
        line.product_price = product.special_price;
        let snapshot = line.clone();
        cart.recompute_total();

        self.store
            .commit_cart(&cart, &CartChange::UpsertItem(snapshot))
            .await?;
        Ok(())
    }

    /// Returns the caller's cart view.
    pub async fn get_cart(&self, user_id: UserId) -> Result<CartView> {
        let cart = self
            .store
            .find_cart_by_user(user_id)
            .await?
            .ok_or(CheckoutError::UserCartNotFound { user_id })?;
        self.cart_view(&cart).await
    }

    /// Returns every cart in the system as a view.
    pub async fn get_all_carts(&self) -> Result<Vec<CartView>> {
        let carts = self.store.all_carts().await?;
        let mut views = Vec::with_capacity(carts.len());
        for cart in &carts {
            views.push(self.cart_view(cart).await?);
        }
        Ok(views)
    }

    /// Resolves the user's cart, creating an empty one on first use.
    async fn resolve_cart(&self, user_id: UserId) -> Result<Cart> {
        if let Some(cart) = self.store.find_cart_by_user(user_id).await? {
            return Ok(cart);
        }
        self.store.create_cart(&Cart::new(user_id)).await?;
        // Re-read so a racing creation resolves to the surviving row.
        self.store
            .find_cart_by_user(user_id)
            .await?
            .ok_or(CheckoutError::UserCartNotFound { user_id })
    }

    /// Shared removal path: drops the line, rebalances, and commits.
    async fn remove_line(&self, cart: &mut Cart, product_id: ProductId) -> Result<CartItem> {
        let cart_id = cart.id;
        let item = cart
            .take_item(product_id)
            .ok_or(CheckoutError::CartItemNotFound {
                cart_id,
                product_id,
            })?;
        cart.recompute_total();
        self.store
            .commit_cart(cart, &CartChange::RemoveItem(item.id))
            .await?;
        Ok(item)
    }

    async fn require_product(&self, product_id: ProductId) -> Result<Product> {
        self.store
            .find_product(product_id)
            .await?
            .ok_or(CheckoutError::ProductNotFound { product_id })
    }

    async fn cart_view(&self, cart: &Cart) -> Result<CartView> {
        let mut products = Vec::with_capacity(cart.items.len());
        for item in &cart.items {
            products.push(self.require_product(item.product_id).await?);
        }
        Ok(CartView::assemble(cart, &products))
    }
}
