//! Order placement pipeline.

use std::time::Instant;

use chrono::Utc;
use common::{AddressId, OrderId, UserId};
use domain::{ORDER_ACCEPTED, Order, OrderItem, OrderView, Payment, Product};
use store::{OrderPlacement, StoreError, StorefrontStore};

use crate::error::{CheckoutError, Result};

/// Caller-supplied fields for one order placement.
///
/// The gateway fields arrive already decided by the external payment
/// collaborator and are stored opaquely. `idempotency_key`, when present,
/// de-duplicates client retries: a key that was already recorded returns
/// the originally placed order instead of creating a second one.
#[derive(Debug, Clone)]
pub struct PlaceOrder {
    pub address_id: AddressId,
    pub payment_method: String,
    pub pg_name: String,
    pub pg_payment_id: String,
    pub pg_status: String,
    pub pg_response_message: String,
    pub idempotency_key: Option<String>,
}

/// Service converting a cart's contents into an immutable order.
#[derive(Clone)]
pub struct OrderService<S> {
    store: S,
}

impl<S: StorefrontStore> OrderService<S> {
    /// Creates a new order service over the given store.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Places an order from the caller's current cart contents.
    ///
    /// Validations (cart present, address present, cart non-empty) run
    /// before any write; the writes themselves — payment, order, order
    /// lines, stock decrements, cart emptying — are one store transaction,
    /// so a failure anywhere leaves no partial order behind.
    #[tracing::instrument(skip(self, cmd), fields(address_id = %cmd.address_id))]
    pub async fn place_order(
        &self,
        user_id: UserId,
        email: &str,
        cmd: PlaceOrder,
    ) -> Result<OrderView> {
        metrics::counter!("order_placements_total").increment(1);
        let placement_start = Instant::now();

        if let Some(key) = &cmd.idempotency_key
            && let Some(order_id) = self.store.order_id_for_key(key).await?
        {
            tracing::info!(%order_id, "placement replayed an already recorded idempotency key");
            return self.get_order(order_id).await;
        }

        let cart = self
            .store
            .find_cart_by_user(user_id)
            .await?
            .ok_or(CheckoutError::UserCartNotFound { user_id })?;
        let address = self
            .store
            .find_address(cmd.address_id)
            .await?
            .ok_or(CheckoutError::AddressNotFound {
                address_id: cmd.address_id,
            })?;
        if cart.is_empty() {
            return Err(CheckoutError::EmptyCart);
        }

        let payment = Payment::new(
            cmd.payment_method,
            cmd.pg_name,
            cmd.pg_payment_id,
            cmd.pg_status,
            cmd.pg_response_message,
        );
        let order = Order {
            id: OrderId::new(),
            email: email.to_string(),
            order_date: Utc::now().date_naive(),
            total_amount: cart.total_price,
            order_status: ORDER_ACCEPTED.to_string(),
            address_id: address.id,
            payment_id: payment.id,
        };
        let items: Vec<OrderItem> = cart
            .items
            .iter()
            .map(|item| OrderItem::from_cart_item(order.id, item))
            .collect();

        let placement = OrderPlacement {
            order,
            payment,
            items,
            cart_id: cart.id,
            cart_version: cart.version,
            idempotency_key: cmd.idempotency_key.clone(),
        };
        let order_id = placement.order.id;

        match self.store.place_order(&placement).await {
            Ok(()) => {}
            Err(StoreError::StockConflict { product_id }) => {
                // Stock shrank since the line entered the cart; the whole
                // placement rolled back.
                let name = self
                    .store
                    .find_product(product_id)
                    .await?
                    .map(|p| p.name)
                    .unwrap_or_else(|| product_id.to_string());
                return Err(CheckoutError::InsufficientStock { name });
            }
            Err(StoreError::IdempotencyConflict { key }) => {
                // Lost a race against a concurrent retry carrying the same
                // key: surface the order that retry created.
                if let Some(order_id) = self.store.order_id_for_key(&key).await? {
                    return self.get_order(order_id).await;
                }
                return Err(StoreError::IdempotencyConflict { key }.into());
            }
            Err(e) => return Err(e.into()),
        }

        metrics::histogram!("order_placement_duration_seconds")
            .record(placement_start.elapsed().as_secs_f64());
        tracing::info!(%order_id, total = placement.order.total_amount, "order placed");

        self.assemble_view(&placement.order, &placement.payment, &placement.items)
            .await
    }

    /// Loads a placed order as a view.
    #[tracing::instrument(skip(self))]
    pub async fn get_order(&self, order_id: OrderId) -> Result<OrderView> {
        let record = self
            .store
            .find_order(order_id)
            .await?
            .ok_or(CheckoutError::OrderNotFound { order_id })?;
        self.assemble_view(&record.order, &record.payment, &record.items)
            .await
    }

    async fn assemble_view(
        &self,
        order: &Order,
        payment: &Payment,
        items: &[OrderItem],
    ) -> Result<OrderView> {
        let mut products: Vec<Product> = Vec::with_capacity(items.len());
        for item in items {
            let product = self
                .store
                .find_product(item.product_id)
                .await?
                .ok_or(CheckoutError::ProductNotFound {
                    product_id: item.product_id,
                })?;
            products.push(product);
        }
        Ok(OrderView::assemble(order, payment, items, &products))
    }
}
