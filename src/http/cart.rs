//! Cart endpoints. Every route requires an authenticated customer; the cart
//! operated on is always the caller's own.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use uuid::Uuid;

use super::auth::Caller;
use super::AppState;
use crate::error::Result;
use crate::service::carts::{self, CartView, GuestLine, MergeReport};

#[derive(Debug, Deserialize)]
pub struct AddItem {
    pub product_id: Uuid,
    pub quantity: i64,
}

#[derive(Debug, Deserialize)]
pub struct UpdateItem {
    pub quantity: i64,
}

#[derive(Debug, Deserialize)]
pub struct MergeRequest {
    pub items: Vec<GuestLine>,
}

pub async fn show(caller: Caller, State(state): State<AppState>) -> Result<Json<CartView>> {
    Ok(Json(
        carts::view_cart(state.store.as_ref(), caller.customer.id).await?,
    ))
}

pub async fn add_item(
    caller: Caller,
    State(state): State<AppState>,
    Json(req): Json<AddItem>,
) -> Result<(StatusCode, Json<CartView>)> {
    let view = carts::add_item(
        state.store.as_ref(),
        caller.customer.id,
        req.product_id,
        req.quantity,
    )
    .await?;
    Ok((StatusCode::CREATED, Json(view)))
}

pub async fn update_item(
    caller: Caller,
    State(state): State<AppState>,
    Path(product_id): Path<Uuid>,
    Json(req): Json<UpdateItem>,
) -> Result<Json<CartView>> {
    Ok(Json(
        carts::update_quantity(
            state.store.as_ref(),
            caller.customer.id,
            product_id,
            req.quantity,
        )
        .await?,
    ))
}

pub async fn remove_item(
    caller: Caller,
    State(state): State<AppState>,
    Path(product_id): Path<Uuid>,
) -> Result<Json<CartView>> {
    Ok(Json(
        carts::remove_item(state.store.as_ref(), caller.customer.id, product_id).await?,
    ))
}

pub async fn clear(caller: Caller, State(state): State<AppState>) -> Result<Json<CartView>> {
    Ok(Json(
        carts::clear(state.store.as_ref(), caller.customer.id).await?,
    ))
}

/// Folds a guest-held cart into the caller's server cart at login.
pub async fn merge(
    caller: Caller,
    State(state): State<AppState>,
    Json(req): Json<MergeRequest>,
) -> Result<Json<MergeReport>> {
    Ok(Json(
        carts::merge_guest_cart(state.store.as_ref(), caller.customer.id, req.items).await?,
    ))
}
