//! View shapes returned across the API boundary.
//!
//! Views are assembled by the checkout services; the exact wire format
//! (JSON field names, status codes) is owned by the API layer.

use chrono::NaiveDate;
use common::{AddressId, CartId, OrderId, OrderItemId, PaymentId, ProductId};
use serde::{Deserialize, Serialize};

use crate::cart::{Cart, CartItem};
use crate::catalog::Product;
use crate::order::{Order, OrderItem, Payment};

/// A product as shown to callers.
///
/// In a cart or order view, `quantity` carries the line quantity rather
/// than the product's live stock level.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductView {
    pub product_id: ProductId,
    pub name: String,
    pub description: String,
    pub image: String,
    pub quantity: u32,
    pub price: f64,
    pub discount: f64,
    pub special_price: f64,
}

impl ProductView {
    /// A catalog view of a product, carrying its live stock level.
    pub fn of_product(product: &Product) -> Self {
        Self {
            product_id: product.id,
            name: product.name.clone(),
            description: product.description.clone(),
            image: product.image.clone(),
            quantity: product.quantity,
            price: product.price,
            discount: product.discount,
            special_price: product.special_price,
        }
    }

    /// A cart-line view of a product, carrying the line quantity.
    pub fn of_cart_line(product: &Product, item: &CartItem) -> Self {
        let mut view = Self::of_product(product);
        view.quantity = item.quantity;
        view
    }
}

/// A cart as shown to callers: total price plus per-line product views.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartView {
    pub cart_id: CartId,
    pub total_price: f64,
    pub products: Vec<ProductView>,
}

impl CartView {
    /// Assembles a cart view from the cart and its lines' resolved products.
    ///
    /// `line_products` must be in the same order as `cart.items`.
    pub fn assemble(cart: &Cart, line_products: &[Product]) -> Self {
        let products = cart
            .items
            .iter()
            .zip(line_products)
            .map(|(item, product)| ProductView::of_cart_line(product, item))
            .collect();
        Self {
            cart_id: cart.id,
            total_price: cart.total_price,
            products,
        }
    }
}

/// Payment record as shown to callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentView {
    pub payment_id: PaymentId,
    pub payment_method: String,
    pub pg_name: String,
    pub pg_payment_id: String,
    pub pg_status: String,
    pub pg_response_message: String,
}

impl From<&Payment> for PaymentView {
    fn from(payment: &Payment) -> Self {
        Self {
            payment_id: payment.id,
            payment_method: payment.payment_method.clone(),
            pg_name: payment.pg_name.clone(),
            pg_payment_id: payment.pg_payment_id.clone(),
            pg_status: payment.pg_status.clone(),
            pg_response_message: payment.pg_response_message.clone(),
        }
    }
}

/// One ordered line with its full product view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderItemView {
    pub order_item_id: OrderItemId,
    pub product: ProductView,
    pub quantity: u32,
    pub discount: f64,
    pub ordered_product_price: f64,
}

impl OrderItemView {
    /// Builds the view for one order line and its resolved product.
    pub fn assemble(item: &OrderItem, product: &Product) -> Self {
        Self {
            order_item_id: item.id,
            product: ProductView::of_product(product),
            quantity: item.quantity,
            discount: item.discount,
            ordered_product_price: item.ordered_product_price,
        }
    }
}

/// A placed order as shown to callers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderView {
    pub order_id: OrderId,
    pub email: String,
    pub order_date: NaiveDate,
    pub total_amount: f64,
    pub order_status: String,
    pub address_id: AddressId,
    pub payment: PaymentView,
    pub items: Vec<OrderItemView>,
}

impl OrderView {
    /// Assembles an order view from the order, its payment, and its lines'
    /// resolved products.
    ///
    /// `line_products` must be in the same order as `items`.
    pub fn assemble(
        order: &Order,
        payment: &Payment,
        items: &[OrderItem],
        line_products: &[Product],
    ) -> Self {
        let items = items
            .iter()
            .zip(line_products)
            .map(|(item, product)| OrderItemView::assemble(item, product))
            .collect();
        Self {
            order_id: order.id,
            email: order.email.clone(),
            order_date: order.order_date,
            total_amount: order.total_amount,
            order_status: order.order_status.clone(),
            address_id: order.address_id,
            payment: PaymentView::from(payment),
            items,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::ProductDraft;
    use common::{CategoryId, UserId};

    fn product() -> Product {
        Product::from_draft(
            CategoryId::new(),
            UserId::new(),
            ProductDraft {
                name: "Widget".to_string(),
                description: "A widget".to_string(),
                quantity: 5,
                price: 100.0,
                discount: 10.0,
            },
        )
    }

    #[test]
    fn test_cart_line_view_carries_line_quantity() {
        let product = product();
        let mut cart = Cart::new(UserId::new());
        cart.items.push(CartItem::new(
            cart.id,
            product.id,
            2,
            product.special_price,
            product.discount,
        ));
        cart.recompute_total();

        let view = CartView::assemble(&cart, std::slice::from_ref(&product));

        assert_eq!(view.products.len(), 1);
        assert_eq!(view.products[0].quantity, 2);
        assert_eq!(view.total_price, 180.0);
    }

    #[test]
    fn test_catalog_view_carries_stock_quantity() {
        let product = product();
        let view = ProductView::of_product(&product);
        assert_eq!(view.quantity, 5);
        assert_eq!(view.special_price, 90.0);
    }

    #[test]
    fn test_cart_view_serialization_roundtrip() {
        let product = product();
        let mut cart = Cart::new(UserId::new());
        cart.items.push(CartItem::new(
            cart.id,
            product.id,
            2,
            product.special_price,
            product.discount,
        ));
        cart.recompute_total();
        let view = CartView::assemble(&cart, std::slice::from_ref(&product));

        let json = serde_json::to_string(&view).unwrap();
        let deserialized: CartView = serde_json::from_str(&json).unwrap();
        assert_eq!(view, deserialized);
    }
}
