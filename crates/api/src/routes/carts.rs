//! Cart endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use common::ProductId;
use domain::CartView;
use serde::{Deserialize, Serialize};
use store::StorefrontStore;
use uuid::Uuid;

use crate::auth::AuthenticatedUser;
use crate::error::ApiError;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct AddToCartRequest {
    pub product_id: Uuid,
    pub quantity: u32,
}

#[derive(Deserialize)]
pub struct AdjustQuantityRequest {
    /// Signed adjustment; the UI translates increase/decrease into +1/-1
    /// and delete into the negated current quantity.
    pub delta: i32,
}

#[derive(Serialize)]
pub struct MessageResponse {
    pub message: String,
}

/// POST /cart/items — add a product to the caller's cart.
#[tracing::instrument(skip(state, req), fields(user_id = %user.user_id))]
pub async fn add_item<S: StorefrontStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    user: AuthenticatedUser,
    Json(req): Json<AddToCartRequest>,
) -> Result<(StatusCode, Json<CartView>), ApiError> {
    let view = state
        .carts
        .add_to_cart(
            user.user_id,
            ProductId::from_uuid(req.product_id),
            req.quantity,
        )
        .await?;
    Ok((StatusCode::CREATED, Json(view)))
}

/// PATCH /cart/items/{product_id} — adjust a line's quantity by a delta.
#[tracing::instrument(skip(state, req), fields(user_id = %user.user_id))]
pub async fn adjust_item<S: StorefrontStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    user: AuthenticatedUser,
    Path(product_id): Path<Uuid>,
    Json(req): Json<AdjustQuantityRequest>,
) -> Result<Json<CartView>, ApiError> {
    let view = state
        .carts
        .adjust_quantity(user.user_id, ProductId::from_uuid(product_id), req.delta)
        .await?;
    Ok(Json(view))
}

/// DELETE /cart/items/{product_id} — remove a line from the caller's cart.
#[tracing::instrument(skip(state), fields(user_id = %user.user_id))]
pub async fn remove_item<S: StorefrontStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    user: AuthenticatedUser,
    Path(product_id): Path<Uuid>,
) -> Result<Json<MessageResponse>, ApiError> {
    let cart = state
        .store
        .find_cart_by_user(user.user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Cart not found for user {}", user.user_id)))?;

    let message = state
        .carts
        .remove_from_cart(cart.id, ProductId::from_uuid(product_id))
        .await?;
    Ok(Json(MessageResponse { message }))
}

/// GET /cart — the caller's cart.
#[tracing::instrument(skip(state), fields(user_id = %user.user_id))]
pub async fn get<S: StorefrontStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    user: AuthenticatedUser,
) -> Result<Json<CartView>, ApiError> {
    let view = state.carts.get_cart(user.user_id).await?;
    Ok(Json(view))
}

/// GET /carts — every cart in the system.
#[tracing::instrument(skip(state))]
pub async fn list<S: StorefrontStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
) -> Result<Json<Vec<CartView>>, ApiError> {
    let views = state.carts.get_all_carts().await?;
    Ok(Json(views))
}
