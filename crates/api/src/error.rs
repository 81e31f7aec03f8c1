//! API error types with HTTP response mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use checkout::CheckoutError;
use store::StoreError;

/// API-level error type that maps to HTTP responses.
#[derive(Debug)]
pub enum ApiError {
    /// Resource not found.
    NotFound(String),
    /// Bad request from the client.
    BadRequest(String),
    /// Missing or malformed caller identity.
    Unauthorized(String),
    /// Checkout logic error.
    Checkout(CheckoutError),
    /// Internal server error.
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg),
            ApiError::Checkout(err) => checkout_error_to_response(err),
            ApiError::Internal(msg) => {
                tracing::error!(error = %msg, "internal server error");
                (StatusCode::INTERNAL_SERVER_ERROR, msg)
            }
        };

        let body = serde_json::json!({ "error": message });
        (status, axum::Json(body)).into_response()
    }
}

fn checkout_error_to_response(err: CheckoutError) -> (StatusCode, String) {
    match &err {
        CheckoutError::ProductNotFound { .. }
        | CheckoutError::CategoryNotFound { .. }
        | CheckoutError::CartNotFound { .. }
        | CheckoutError::UserCartNotFound { .. }
        | CheckoutError::CartItemNotFound { .. }
        | CheckoutError::AddressNotFound { .. }
        | CheckoutError::OrderNotFound { .. } => (StatusCode::NOT_FOUND, err.to_string()),

        CheckoutError::DuplicateCartItem { .. }
        | CheckoutError::DuplicateProduct { .. }
        | CheckoutError::OutOfStock { .. }
        | CheckoutError::InsufficientStock { .. }
        | CheckoutError::NegativeQuantity
        | CheckoutError::InvalidQuantity { .. }
        | CheckoutError::EmptyCart => (StatusCode::BAD_REQUEST, err.to_string()),

        CheckoutError::Store(
            StoreError::VersionConflict { .. }
            | StoreError::StockConflict { .. }
            | StoreError::DuplicateCartLine { .. }
            | StoreError::IdempotencyConflict { .. },
        ) => (StatusCode::CONFLICT, err.to_string()),

        CheckoutError::Store(_) => {
            tracing::error!(error = %err, "store failure");
            (StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
        }
    }
}

impl From<CheckoutError> for ApiError {
    fn from(err: CheckoutError) -> Self {
        ApiError::Checkout(err)
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        ApiError::Checkout(CheckoutError::Store(err))
    }
}
