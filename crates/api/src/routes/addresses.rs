//! Address-book endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use common::AddressId;
use domain::Address;
use serde::Deserialize;
use store::StorefrontStore;
use uuid::Uuid;

use crate::auth::AuthenticatedUser;
use crate::error::ApiError;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct CreateAddressRequest {
    pub street: String,
    pub building_name: String,
    pub city: String,
    pub state: String,
    pub country: String,
    pub pincode: String,
}

/// POST /addresses — add an address for the caller.
#[tracing::instrument(skip(state, req), fields(user_id = %user.user_id))]
pub async fn create<S: StorefrontStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    user: AuthenticatedUser,
    Json(req): Json<CreateAddressRequest>,
) -> Result<(StatusCode, Json<Address>), ApiError> {
    let address = Address {
        id: AddressId::new(),
        user_id: user.user_id,
        street: req.street,
        building_name: req.building_name,
        city: req.city,
        state: req.state,
        country: req.country,
        pincode: req.pincode,
    };
    state.store.insert_address(&address).await?;
    Ok((StatusCode::CREATED, Json(address)))
}

/// GET /addresses/{id} — load an address by id.
#[tracing::instrument(skip(state))]
pub async fn get<S: StorefrontStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<Uuid>,
) -> Result<Json<Address>, ApiError> {
    let address_id = AddressId::from_uuid(id);
    let address = state
        .store
        .find_address(address_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Address not found with id {address_id}")))?;
    Ok(Json(address))
}
