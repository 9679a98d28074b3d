//! Status lifecycle manager.
//!
//! Transitions are admin-driven. The status value arrives as text and is
//! rejected at this boundary when it is outside the five-member set; the
//! store performs the append + current-status move as one atomic step.

use chrono::Utc;

use crate::domain::{Order, OrderStatus};
use crate::error::Result;
use crate::store::{OrderRef, Store};

pub async fn set_status(
    store: &dyn Store,
    reference: &OrderRef,
    new_status: &str,
) -> Result<Order> {
    let status: OrderStatus = new_status.parse()?;
    let order = store.append_status(reference, status, Utc::now()).await?;
    tracing::info!(order_number = %order.order_number, status = %status, "order status updated");
    Ok(order)
}

/// Idempotent: cancelling an already-cancelled order re-appends a Cancelled
/// entry and succeeds.
pub async fn cancel(store: &dyn Store, reference: &OrderRef) -> Result<Order> {
    let order = store
        .append_status(reference, OrderStatus::Cancelled, Utc::now())
        .await?;
    tracing::info!(order_number = %order.order_number, "order cancelled");
    Ok(order)
}

/// Permanent removal, restricted to currently-cancelled orders.
pub async fn delete_order(store: &dyn Store, reference: &OrderRef) -> Result<()> {
    store.delete_order(reference).await?;
    tracing::info!(order = %reference, "order deleted");
    Ok(())
}
