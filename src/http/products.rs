//! Catalog endpoints. Reads are public; writes are admin-only.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;
use uuid::Uuid;
use validator::Validate;

use super::auth::AdminOnly;
use super::AppState;
use crate::domain::{NewProduct, Product, UpdateProduct};
use crate::error::Result;
use crate::store::{CategoryCount, PaginatedResponse, ProductFilter};

pub async fn list(
    State(state): State<AppState>,
    Query(filter): Query<ProductFilter>,
) -> Result<Json<PaginatedResponse<Product>>> {
    Ok(Json(state.store.list_products(&filter).await?))
}

pub async fn categories(State(state): State<AppState>) -> Result<Json<Vec<CategoryCount>>> {
    Ok(Json(state.store.list_categories().await?))
}

pub async fn show(State(state): State<AppState>, Path(id): Path<Uuid>) -> Result<Json<Product>> {
    Ok(Json(state.store.product(id).await?))
}

pub async fn create(
    _admin: AdminOnly,
    State(state): State<AppState>,
    Json(req): Json<NewProduct>,
) -> Result<(StatusCode, Json<Product>)> {
    req.validate()?;
    let product = state
        .store
        .create_product(Product::create(req, Utc::now()))
        .await?;
    Ok((StatusCode::CREATED, Json(product)))
}

pub async fn update(
    _admin: AdminOnly,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateProduct>,
) -> Result<Json<Product>> {
    req.validate()?;
    Ok(Json(state.store.update_product(id, &req, Utc::now()).await?))
}

pub async fn remove(
    _admin: AdminOnly,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode> {
    state.store.delete_product(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
