//! Order placement engine.
//!
//! Validates the submitted lines and address here, then hands the store a
//! draft to resolve and commit in one transaction. A caller-supplied line
//! price locks in the price the customer saw; otherwise the catalog price
//! at placement time is captured.

use chrono::Utc;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::domain::value_objects::{OrderNumber, PaymentMethod};
use crate::domain::{Order, ShippingAddress};
use crate::error::{Error, Result};
use crate::store::{DraftLine, MAX_LINE_QUANTITY, OrderDraft, Store};

/// Placement request body.
#[derive(Clone, Debug, Deserialize, Validate)]
pub struct PlaceOrder {
    #[validate(length(min = 1, message = "order must contain at least one item"))]
    pub items: Vec<PlaceOrderItem>,
    #[validate]
    pub shipping_address: ShippingAddress,
    pub payment_method: Option<String>,
    pub notes: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PlaceOrderItem {
    pub product_id: Uuid,
    pub quantity: i64,
    pub price: Option<Decimal>,
}

pub async fn place_order(
    store: &dyn Store,
    customer_id: Uuid,
    req: PlaceOrder,
) -> Result<Order> {
    req.validate()?;
    let payment_method = match req.payment_method.as_deref() {
        Some(raw) => raw
            .parse::<PaymentMethod>()
            .map_err(|err| Error::validation(err.to_string()))?,
        None => PaymentMethod::default(),
    };

    let mut lines = Vec::with_capacity(req.items.len());
    for item in &req.items {
        let quantity = u32::try_from(item.quantity)
            .ok()
            .filter(|q| (1..=MAX_LINE_QUANTITY).contains(q))
            .ok_or_else(|| {
                Error::validation(format!(
                    "product {}: quantity must be between 1 and {MAX_LINE_QUANTITY}",
                    item.product_id
                ))
            })?;
        if let Some(price) = item.price {
            if price.is_sign_negative() {
                return Err(Error::validation(format!(
                    "product {}: price cannot be negative",
                    item.product_id
                )));
            }
        }
        lines.push(DraftLine {
            product_id: item.product_id,
            quantity,
            price: item.price,
        });
    }

    let placed_at = Utc::now();
    let draft = OrderDraft {
        customer_id,
        lines,
        shipping_address: req.shipping_address,
        payment_method,
        notes: req.notes,
        order_number: OrderNumber::generate(placed_at),
        placed_at,
    };
    let order = store.place_order(draft).await?;
    tracing::info!(
        order_number = %order.order_number,
        customer_id = %customer_id,
        total = %order.total_price,
        "order placed"
    );
    Ok(order)
}
