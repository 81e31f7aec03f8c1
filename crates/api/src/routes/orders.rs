//! Order endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use checkout::PlaceOrder;
use common::{AddressId, OrderId};
use domain::OrderView;
use serde::Deserialize;
use store::StorefrontStore;
use uuid::Uuid;

use crate::auth::AuthenticatedUser;
use crate::error::ApiError;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct PlaceOrderRequest {
    pub address_id: Uuid,
    pub payment_method: String,
    pub pg_name: String,
    pub pg_payment_id: String,
    pub pg_status: String,
    pub pg_response_message: String,
    /// Optional client-supplied token de-duplicating placement retries.
    pub idempotency_key: Option<String>,
}

/// POST /orders — place an order from the caller's cart.
#[tracing::instrument(skip(state, req), fields(user_id = %user.user_id))]
pub async fn place<S: StorefrontStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    user: AuthenticatedUser,
    Json(req): Json<PlaceOrderRequest>,
) -> Result<(StatusCode, Json<OrderView>), ApiError> {
    let cmd = PlaceOrder {
        address_id: AddressId::from_uuid(req.address_id),
        payment_method: req.payment_method,
        pg_name: req.pg_name,
        pg_payment_id: req.pg_payment_id,
        pg_status: req.pg_status,
        pg_response_message: req.pg_response_message,
        idempotency_key: req.idempotency_key,
    };

    let view = state
        .orders
        .place_order(user.user_id, &user.email, cmd)
        .await?;
    Ok((StatusCode::CREATED, Json(view)))
}

/// GET /orders/{id} — load a placed order.
#[tracing::instrument(skip(state))]
pub async fn get<S: StorefrontStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<Uuid>,
) -> Result<Json<OrderView>, ApiError> {
    let view = state.orders.get_order(OrderId::from_uuid(id)).await?;
    Ok(Json(view))
}
