//! Admin endpoints: dashboard aggregates and order management.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};

use super::auth::AdminOnly;
use super::AppState;
use crate::domain::Order;
use crate::error::Result;
use crate::service::admin::{self, DashboardStats, RECENT_ORDERS};
use crate::service::lifecycle;
use crate::store::{AdminOrderSummary, OrderRef, PaginatedResponse};

#[derive(Debug, Serialize)]
pub struct Dashboard {
    pub stats: DashboardStats,
    pub recent_orders: Vec<AdminOrderSummary>,
}

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub struct SetStatus {
    pub status: String,
}

pub async fn dashboard(
    _admin: AdminOnly,
    State(state): State<AppState>,
) -> Result<Json<Dashboard>> {
    let store = state.store.as_ref();
    let stats = admin::dashboard_stats(store).await?;
    let recent_orders = admin::recent_orders(store, RECENT_ORDERS).await?;
    Ok(Json(Dashboard {
        stats,
        recent_orders,
    }))
}

pub async fn orders(
    _admin: AdminOnly,
    State(state): State<AppState>,
    Query(params): Query<ListQuery>,
) -> Result<Json<PaginatedResponse<AdminOrderSummary>>> {
    let page = params.page.unwrap_or(1).max(1);
    let per_page = params.per_page.unwrap_or(20).min(100);
    Ok(Json(state.store.list_orders(page, per_page).await?))
}

pub async fn set_status(
    _admin: AdminOnly,
    State(state): State<AppState>,
    Path(reference): Path<String>,
    Json(req): Json<SetStatus>,
) -> Result<Json<Order>> {
    let reference = OrderRef::parse(&reference);
    let order = lifecycle::set_status(state.store.as_ref(), &reference, &req.status).await?;
    Ok(Json(order))
}

pub async fn cancel(
    _admin: AdminOnly,
    State(state): State<AppState>,
    Path(reference): Path<String>,
) -> Result<Json<Order>> {
    let reference = OrderRef::parse(&reference);
    let order = lifecycle::cancel(state.store.as_ref(), &reference).await?;
    Ok(Json(order))
}

pub async fn remove(
    _admin: AdminOnly,
    State(state): State<AppState>,
    Path(reference): Path<String>,
) -> Result<StatusCode> {
    let reference = OrderRef::parse(&reference);
    lifecycle::delete_order(state.store.as_ref(), &reference).await?;
    Ok(StatusCode::NO_CONTENT)
}
