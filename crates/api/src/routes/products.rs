//! Catalog endpoints: categories and products.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use common::{CategoryId, ProductId};
use domain::{Category, PageRequest, ProductDraft, ProductPage, ProductSort, ProductView, SortOrder};
use serde::Deserialize;
use store::StorefrontStore;
use uuid::Uuid;

use crate::auth::AuthenticatedUser;
use crate::error::ApiError;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct CreateCategoryRequest {
    pub name: String,
}

#[derive(Deserialize)]
pub struct UpdateImageRequest {
    /// Filename assigned by the image-upload collaborator.
    pub filename: String,
}

/// Paging query parameters, all optional.
#[derive(Deserialize, Default)]
pub struct PageQuery {
    pub page_number: Option<u32>,
    pub page_size: Option<u32>,
    pub sort_by: Option<ProductSort>,
    pub sort_order: Option<SortOrder>,
}

#[derive(Deserialize)]
pub struct SearchQuery {
    pub keyword: String,
    pub page_number: Option<u32>,
    pub page_size: Option<u32>,
    pub sort_by: Option<ProductSort>,
    pub sort_order: Option<SortOrder>,
}

impl SearchQuery {
    fn page(&self) -> PageQuery {
        PageQuery {
            page_number: self.page_number,
            page_size: self.page_size,
            sort_by: self.sort_by,
            sort_order: self.sort_order,
        }
    }
}

impl From<PageQuery> for PageRequest {
    fn from(query: PageQuery) -> Self {
        let defaults = PageRequest::default();
        PageRequest {
            page_number: query.page_number.unwrap_or(defaults.page_number),
            page_size: query.page_size.unwrap_or(defaults.page_size),
            sort_by: query.sort_by.unwrap_or(defaults.sort_by),
            sort_order: query.sort_order.unwrap_or(defaults.sort_order),
        }
    }
}

/// POST /categories — create a category.
#[tracing::instrument(skip(state, req))]
pub async fn create_category<S: StorefrontStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Json(req): Json<CreateCategoryRequest>,
) -> Result<(StatusCode, Json<Category>), ApiError> {
    let category = state.catalog.add_category(req.name).await?;
    Ok((StatusCode::CREATED, Json(category)))
}

/// POST /categories/{id}/products — add a product sold by the caller.
#[tracing::instrument(skip(state, draft), fields(user_id = %user.user_id))]
pub async fn create_product<S: StorefrontStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    user: AuthenticatedUser,
    Path(category_id): Path<Uuid>,
    Json(draft): Json<ProductDraft>,
) -> Result<(StatusCode, Json<ProductView>), ApiError> {
    let view = state
        .catalog
        .add_product(CategoryId::from_uuid(category_id), user.user_id, draft)
        .await?;
    Ok((StatusCode::CREATED, Json(view)))
}

/// GET /products — list all products, paged.
#[tracing::instrument(skip(state, query))]
pub async fn list<S: StorefrontStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Query(query): Query<PageQuery>,
) -> Result<Json<ProductPage>, ApiError> {
    let page = state.catalog.get_products(&query.into()).await?;
    Ok(Json(page))
}

/// GET /categories/{id}/products — list a category's products, paged.
#[tracing::instrument(skip(state, query))]
pub async fn list_by_category<S: StorefrontStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(category_id): Path<Uuid>,
    Query(query): Query<PageQuery>,
) -> Result<Json<ProductPage>, ApiError> {
    let page = state
        .catalog
        .get_products_by_category(CategoryId::from_uuid(category_id), &query.into())
        .await?;
    Ok(Json(page))
}

/// GET /products/search — keyword search over product names, paged.
#[tracing::instrument(skip(state, query))]
pub async fn search<S: StorefrontStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<ProductPage>, ApiError> {
    let page = state
        .catalog
        .search_products(&query.keyword, &query.page().into())
        .await?;
    Ok(Json(page))
}

/// GET /products/{id} — load one product.
#[tracing::instrument(skip(state))]
pub async fn get<S: StorefrontStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<Uuid>,
) -> Result<Json<ProductView>, ApiError> {
    let view = state.catalog.get_product(ProductId::from_uuid(id)).await?;
    Ok(Json(view))
}

/// PUT /products/{id} — update a product and reprice affected carts.
#[tracing::instrument(skip(state, draft))]
pub async fn update<S: StorefrontStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<Uuid>,
    Json(draft): Json<ProductDraft>,
) -> Result<Json<ProductView>, ApiError> {
    let view = state
        .catalog
        .update_product(ProductId::from_uuid(id), draft)
        .await?;
    Ok(Json(view))
}

/// DELETE /products/{id} — delete a product, clearing it from carts first.
#[tracing::instrument(skip(state))]
pub async fn delete<S: StorefrontStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<Uuid>,
) -> Result<Json<ProductView>, ApiError> {
    let view = state
        .catalog
        .delete_product(ProductId::from_uuid(id))
        .await?;
    Ok(Json(view))
}

/// PUT /products/{id}/image — store the uploaded image's filename.
#[tracing::instrument(skip(state, req))]
pub async fn update_image<S: StorefrontStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateImageRequest>,
) -> Result<Json<ProductView>, ApiError> {
    let view = state
        .catalog
        .update_product_image(ProductId::from_uuid(id), req.filename)
        .await?;
    Ok(Json(view))
}
