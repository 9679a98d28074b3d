//! Storefront settings. Reads are public so the web client can render
//! currency and fees; writes are admin-only.

use axum::extract::State;
use axum::Json;
use chrono::Utc;
use validator::Validate;

use super::auth::AdminOnly;
use super::AppState;
use crate::domain::{SettingsPatch, StoreSettings};
use crate::error::Result;

pub async fn show(State(state): State<AppState>) -> Result<Json<StoreSettings>> {
    Ok(Json(state.store.settings().await?))
}

pub async fn update(
    _admin: AdminOnly,
    State(state): State<AppState>,
    Json(patch): Json<SettingsPatch>,
) -> Result<Json<StoreSettings>> {
    patch.validate()?;
    Ok(Json(state.store.update_settings(&patch, Utc::now()).await?))
}
