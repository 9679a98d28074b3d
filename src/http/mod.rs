//! HTTP surface: one router over the shared [`AppState`].
//!
//! Handlers stay thin; they extract, call a service or store method, and
//! let [`crate::error::Error`] shape failures.

pub mod admin;
pub mod auth;
pub mod cart;
pub mod orders;
pub mod products;
pub mod settings;

use std::sync::Arc;

use axum::routing::{delete, get, patch, post, put};
use axum::{Json, Router};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::store::Store;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,
}

impl AppState {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route(
            "/health",
            get(|| async {
                Json(serde_json::json!({"status": "healthy", "service": "freshmart-grocery"}))
            }),
        )
        .route("/api/products", get(products::list).post(products::create))
        .route("/api/products/categories", get(products::categories))
        .route(
            "/api/products/:id",
            get(products::show)
                .put(products::update)
                .delete(products::remove),
        )
        .route("/api/cart", get(cart::show).delete(cart::clear))
        .route("/api/cart/items", post(cart::add_item))
        .route(
            "/api/cart/items/:product_id",
            put(cart::update_item).delete(cart::remove_item),
        )
        .route("/api/cart/merge", post(cart::merge))
        .route("/api/orders", post(orders::place).get(orders::mine))
        .route("/api/orders/:id", get(orders::show))
        .route("/api/orders/:id/track", get(orders::track))
        .route("/api/admin/dashboard", get(admin::dashboard))
        .route("/api/admin/orders", get(admin::orders))
        .route("/api/admin/orders/:id", delete(admin::remove))
        .route("/api/admin/orders/:id/status", patch(admin::set_status))
        .route("/api/admin/orders/:id/cancel", post(admin::cancel))
        .route("/api/settings", get(settings::show).put(settings::update))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
