//! Admin aggregation views.
//!
//! Counts and revenue are recomputed from the ledger on every call; nothing
//! is cached. Revenue counts Delivered orders only, so refunds against
//! cancelled orders never inflate it.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::store::{AdminOrderSummary, Store};

/// How many orders the dashboard shows under the headline numbers.
pub const RECENT_ORDERS: i64 = 5;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DashboardStats {
    pub products: i64,
    pub orders: i64,
    pub customers: i64,
    pub total_sales: Decimal,
}

pub async fn dashboard_stats(store: &dyn Store) -> Result<DashboardStats> {
    let products = store.count_products().await?;
    let orders = store.count_orders().await?;
    let customers = store.count_customers().await?;
    let total_sales = store.delivered_revenue().await?;
    Ok(DashboardStats {
        products,
        orders,
        customers,
        total_sales,
    })
}

pub async fn recent_orders(store: &dyn Store, limit: i64) -> Result<Vec<AdminOrderSummary>> {
    store.recent_orders(limit).await
}
