//! Cart aggregate: one mutable cart per user with its line items.

use common::{CartId, CartItemId, ProductId, UserId};
use serde::{Deserialize, Serialize};

/// A line item in a cart.
///
/// `product_price` and `discount` are snapshots of the product's special
/// price and discount percentage as of the line's last mutation, not live
/// references. `quantity` is at least 1 while the line exists; a line
/// reaching 0 is deleted, never stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartItem {
    pub id: CartItemId,
    pub cart_id: CartId,
    pub product_id: ProductId,
    pub quantity: u32,
    pub product_price: f64,
    pub discount: f64,
}

impl CartItem {
    /// Creates a new line item snapshotting the given price and discount.
    pub fn new(
        cart_id: CartId,
        product_id: ProductId,
        quantity: u32,
        product_price: f64,
        discount: f64,
    ) -> Self {
        Self {
            id: CartItemId::new(),
            cart_id,
            product_id,
            quantity,
            product_price,
            discount,
        }
    }

    /// This line's contribution to the cart total.
    pub fn line_total(&self) -> f64 {
        self.product_price * f64::from(self.quantity)
    }
}

/// A user's cart with its ordered line items and running total.
///
/// `total_price` always equals the sum of the current lines' contributions;
/// every mutation recomputes it from the lines before the cart is persisted,
/// within the same transaction. `version` backs the store's optimistic
/// concurrency check.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cart {
    pub id: CartId,
    pub user_id: UserId,
    pub items: Vec<CartItem>,
    pub total_price: f64,
    pub version: i64,
}

impl Cart {
    /// Creates an empty cart for a user.
    pub fn new(user_id: UserId) -> Self {
        Self {
            id: CartId::new(),
            user_id,
            items: Vec::new(),
            total_price: 0.0,
            version: 0,
        }
    }

    /// Returns the line item for a product, if present.
    pub fn item_for(&self, product_id: ProductId) -> Option<&CartItem> {
        self.items.iter().find(|item| item.product_id == product_id)
    }

    /// Mutable access to the line item for a product.
    pub fn item_for_mut(&mut self, product_id: ProductId) -> Option<&mut CartItem> {
        self.items
            .iter_mut()
            .find(|item| item.product_id == product_id)
    }

    /// Removes the line item for a product, returning it if it existed.
    pub fn take_item(&mut self, product_id: ProductId) -> Option<CartItem> {
        let pos = self
            .items
            .iter()
            .position(|item| item.product_id == product_id)?;
        Some(self.items.remove(pos))
    }

    /// Recomputes the running total from the current lines.
    pub fn recompute_total(&mut self) {
        let mut total = 0.0;
        for item in &self.items {
            total += item.line_total();
        }
        self.total_price = total;
    }

    /// Returns true if the cart has no line items.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cart_with_lines() -> Cart {
        let mut cart = Cart::new(UserId::new());
        cart.items.push(CartItem::new(
            cart.id,
            ProductId::new(),
            2,
            90.0,
            10.0,
        ));
        cart.items
            .push(CartItem::new(cart.id, ProductId::new(), 1, 25.0, 0.0));
        cart.recompute_total();
        cart
    }

    #[test]
    fn test_new_cart_is_empty_with_zero_total() {
        let cart = Cart::new(UserId::new());
        assert!(cart.is_empty());
        assert_eq!(cart.total_price, 0.0);
        assert_eq!(cart.version, 0);
    }

    #[test]
    fn test_recompute_total_sums_line_contributions() {
        let cart = cart_with_lines();
        assert!((cart.total_price - 205.0).abs() < 1e-9);
    }

    #[test]
    fn test_take_item_removes_line() {
        let mut cart = cart_with_lines();
        let product_id = cart.items[0].product_id;

        let taken = cart.take_item(product_id).unwrap();
        assert_eq!(taken.quantity, 2);
        assert!(cart.item_for(product_id).is_none());

        cart.recompute_total();
        assert!((cart.total_price - 25.0).abs() < 1e-9);
    }

    #[test]
    fn test_take_missing_item_returns_none() {
        let mut cart = cart_with_lines();
        assert!(cart.take_item(ProductId::new()).is_none());
    }

    #[test]
    fn test_line_total() {
        let item = CartItem::new(CartId::new(), ProductId::new(), 3, 90.0, 10.0);
        assert_eq!(item.line_total(), 270.0);
    }
}
