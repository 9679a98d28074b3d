//! Customer order endpoints.
//!
//! Order lookups accept either the surrogate id or the public order number
//! in the path. A customer sees only their own orders; admins see all.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::{DateTime, Utc};
use serde::Serialize;

use super::auth::Caller;
use super::AppState;
use crate::domain::{Order, OrderStatus, StatusEntry};
use crate::error::{Error, Result};
use crate::service::placement::{self, PlaceOrder};
use crate::store::{OrderRef, Store};

/// Public tracking view: the lifecycle without line items or address.
#[derive(Debug, Serialize)]
pub struct TrackingView {
    pub order_number: String,
    pub current_status: OrderStatus,
    pub status_history: Vec<StatusEntry>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Order> for TrackingView {
    fn from(order: Order) -> Self {
        Self {
            order_number: order.order_number.into_string(),
            current_status: order.current_status,
            status_history: order.status_history,
            created_at: order.created_at,
            updated_at: order.updated_at,
        }
    }
}

pub async fn place(
    caller: Caller,
    State(state): State<AppState>,
    Json(req): Json<PlaceOrder>,
) -> Result<(StatusCode, Json<Order>)> {
    let order = placement::place_order(state.store.as_ref(), caller.customer.id, req).await?;
    Ok((StatusCode::CREATED, Json(order)))
}

pub async fn mine(caller: Caller, State(state): State<AppState>) -> Result<Json<Vec<Order>>> {
    Ok(Json(
        state.store.orders_for_customer(caller.customer.id).await?,
    ))
}

pub async fn show(
    caller: Caller,
    State(state): State<AppState>,
    Path(reference): Path<String>,
) -> Result<Json<Order>> {
    let reference = OrderRef::parse(&reference);
    let order = fetch_authorized(state.store.as_ref(), &caller, &reference).await?;
    Ok(Json(order))
}

pub async fn track(
    caller: Caller,
    State(state): State<AppState>,
    Path(reference): Path<String>,
) -> Result<Json<TrackingView>> {
    let reference = OrderRef::parse(&reference);
    let order = fetch_authorized(state.store.as_ref(), &caller, &reference).await?;
    Ok(Json(order.into()))
}

async fn fetch_authorized(
    store: &dyn Store,
    caller: &Caller,
    reference: &OrderRef,
) -> Result<Order> {
    let order = store.order(reference).await?;
    if order.customer_id != caller.customer.id && !caller.is_admin() {
        return Err(Error::Forbidden("not your order".into()));
    }
    Ok(order)
}
