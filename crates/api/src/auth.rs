//! Caller identity extraction.
//!
//! The authentication layer in front of this service resolves the caller
//! and forwards the identity as trusted `x-user-id` / `x-user-email`
//! headers; this extractor threads that identity into every handler as an
//! explicit value instead of ambient state.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use common::UserId;
use uuid::Uuid;

use crate::error::ApiError;

/// The authenticated caller, as resolved by the external identity layer.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub user_id: UserId,
    pub email: String,
}

impl<S> FromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user_id = parts
            .headers
            .get("x-user-id")
            .and_then(|value| value.to_str().ok())
            .and_then(|value| Uuid::parse_str(value).ok())
            .map(UserId::from_uuid)
            .ok_or_else(|| {
                ApiError::Unauthorized("missing or invalid x-user-id header".to_string())
            })?;

        let email = parts
            .headers
            .get("x-user-email")
            .and_then(|value| value.to_str().ok())
            .map(str::to_string)
            .ok_or_else(|| ApiError::Unauthorized("missing x-user-email header".to_string()))?;

        Ok(Self { user_id, email })
    }
}
