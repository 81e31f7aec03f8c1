//! Order entities: a placed order, its line items, and its payment record.

use chrono::NaiveDate;
use common::{AddressId, OrderId, OrderItemId, PaymentId, ProductId};
use serde::{Deserialize, Serialize};

use crate::cart::CartItem;

/// Status assigned to every newly placed order.
pub const ORDER_ACCEPTED: &str = "Order Accepted !";

/// An immutable placed order.
///
/// Created exactly once at placement time; only the status field may change
/// afterwards (fulfillment transitions are out of scope here).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    /// Denormalized owner reference.
    pub email: String,
    pub order_date: NaiveDate,
    /// Copied from the cart total at placement time.
    pub total_amount: f64,
    pub order_status: String,
    pub address_id: AddressId,
    pub payment_id: PaymentId,
}

/// A permanent historical record of one ordered line.
///
/// All fields are copied from the corresponding cart line at placement time
/// and are never affected by later product changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderItem {
    pub id: OrderItemId,
    pub order_id: OrderId,
    pub product_id: ProductId,
    pub quantity: u32,
    pub discount: f64,
    pub ordered_product_price: f64,
}

impl OrderItem {
    /// Copies a cart line into an order line.
    pub fn from_cart_item(order_id: OrderId, item: &CartItem) -> Self {
        Self {
            id: OrderItemId::new(),
            order_id,
            product_id: item.product_id,
            quantity: item.quantity,
            discount: item.discount,
            ordered_product_price: item.product_price,
        }
    }
}

/// Payment record for an order.
///
/// The gateway fields are opaque to this system; they arrive already decided
/// by the external payment collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payment {
    pub id: PaymentId,
    pub payment_method: String,
    pub pg_name: String,
    pub pg_payment_id: String,
    pub pg_status: String,
    pub pg_response_message: String,
}

impl Payment {
    /// Creates a payment record from the caller-supplied fields.
    pub fn new(
        payment_method: impl Into<String>,
        pg_name: impl Into<String>,
        pg_payment_id: impl Into<String>,
        pg_status: impl Into<String>,
        pg_response_message: impl Into<String>,
    ) -> Self {
        Self {
            id: PaymentId::new(),
            payment_method: payment_method.into(),
            pg_name: pg_name.into(),
            pg_payment_id: pg_payment_id.into(),
            pg_status: pg_status.into(),
            pg_response_message: pg_response_message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::CartId;

    #[test]
    fn test_order_item_copies_cart_line_snapshot() {
        let line = CartItem::new(CartId::new(), ProductId::new(), 3, 90.0, 10.0);
        let order_id = OrderId::new();

        let item = OrderItem::from_cart_item(order_id, &line);

        assert_eq!(item.order_id, order_id);
        assert_eq!(item.product_id, line.product_id);
        assert_eq!(item.quantity, 3);
        assert_eq!(item.discount, 10.0);
        assert_eq!(item.ordered_product_price, 90.0);
    }

    #[test]
    fn test_payment_captures_gateway_fields() {
        let payment = Payment::new("card", "stripe", "pg-123", "success", "approved");
        assert_eq!(payment.payment_method, "card");
        assert_eq!(payment.pg_name, "stripe");
        assert_eq!(payment.pg_payment_id, "pg-123");
    }
}
