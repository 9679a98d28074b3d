//! Order aggregate: the entity-of-record for placed orders.
//!
//! An order carries an immutable snapshot of its line items and address, a
//! total computed exactly once, and an append-only status history whose last
//! entry always equals `current_status`.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;
use validator::Validate;

use crate::domain::value_objects::{OrderNumber, PaymentMethod};

/// Lifecycle states. Cancelled is terminal; the other four are not
/// forward-enforced (see [`Order::append_status`]).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OrderStatus {
    #[default]
    Pending,
    Processing,
    Shipped,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    pub const ALL: [OrderStatus; 5] = [
        Self::Pending,
        Self::Processing,
        Self::Shipped,
        Self::Delivered,
        Self::Cancelled,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "Pending",
            Self::Processing => "Processing",
            Self::Shipped => "Shipped",
            Self::Delivered => "Delivered",
            Self::Cancelled => "Cancelled",
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = InvalidStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| InvalidStatus(s.to_string()))
    }
}

#[derive(Debug, Clone)]
pub struct InvalidStatus(pub String);

impl std::error::Error for InvalidStatus {}
impl fmt::Display for InvalidStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid order status: {}", self.0)
    }
}

impl From<InvalidStatus> for crate::error::Error {
    fn from(err: InvalidStatus) -> Self {
        Self::validation(err.to_string())
    }
}

// Stored as plain TEXT; decoding re-parses the exact status names this crate
// writes.
impl sqlx::Type<sqlx::Postgres> for OrderStatus {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <&str as sqlx::Type<sqlx::Postgres>>::type_info()
    }

    fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
        <&str as sqlx::Type<sqlx::Postgres>>::compatible(ty)
    }
}

impl<'r> sqlx::Decode<'r, sqlx::Postgres> for OrderStatus {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let raw = <&str as sqlx::Decode<'r, sqlx::Postgres>>::decode(value)?;
        Ok(raw.parse::<OrderStatus>()?)
    }
}

/// One append-only history entry.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StatusEntry {
    pub status: OrderStatus,
    pub at: DateTime<Utc>,
}

/// Line snapshot captured at placement; later product edits do not reach it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LineItem {
    pub product_id: Uuid,
    pub name: String,
    pub unit_price: Decimal,
    pub quantity: u32,
}

impl LineItem {
    pub fn line_total(&self) -> Decimal {
        self.unit_price * Decimal::from(self.quantity)
    }
}

/// Shipping address snapshot. Every field is required at placement.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct ShippingAddress {
    #[validate(length(min = 1))]
    pub first_name: String,
    #[validate(length(min = 1))]
    pub last_name: String,
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 1))]
    pub phone: String,
    #[validate(length(min = 1))]
    pub address: String,
    #[validate(length(min = 1))]
    pub city: String,
    #[validate(length(min = 1))]
    pub state: String,
    #[validate(length(min = 1))]
    pub zip_code: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Order {
    pub id: Uuid,
    pub order_number: OrderNumber,
    pub customer_id: Uuid,
    pub items: Vec<LineItem>,
    pub total_price: Decimal,
    pub shipping_address: ShippingAddress,
    pub payment_method: PaymentMethod,
    pub notes: Option<String>,
    pub status_history: Vec<StatusEntry>,
    pub current_status: OrderStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    /// Assembles a new order: the total comes from the line snapshot and the
    /// history is seeded with a single Pending entry.
    #[allow(clippy::too_many_arguments)]
    pub fn place(
        order_number: OrderNumber,
        customer_id: Uuid,
        items: Vec<LineItem>,
        shipping_address: ShippingAddress,
        payment_method: PaymentMethod,
        notes: Option<String>,
        placed_at: DateTime<Utc>,
    ) -> Self {
        let total_price = items.iter().map(LineItem::line_total).sum();
        Self {
            id: Uuid::now_v7(),
            order_number,
            customer_id,
            items,
            total_price,
            shipping_address,
            payment_method,
            notes,
            status_history: vec![StatusEntry {
                status: OrderStatus::Pending,
                at: placed_at,
            }],
            current_status: OrderStatus::Pending,
            created_at: placed_at,
            updated_at: placed_at,
        }
    }

    /// Appends a history entry and moves `current_status` in the same step.
    ///
    /// Leaving Cancelled is refused; re-cancelling is allowed so that
    /// cancellation stays idempotent. Any other move, backward ones
    /// included, is permitted; transition ordering is not enforced.
    pub fn append_status(
        &mut self,
        status: OrderStatus,
        at: DateTime<Utc>,
    ) -> Result<(), OrderError> {
        if self.current_status.is_cancelled() && !status.is_cancelled() {
            return Err(OrderError::AlreadyCancelled);
        }
        self.status_history.push(StatusEntry { status, at });
        self.current_status = status;
        self.updated_at = at;
        Ok(())
    }

    /// Deletion policy: only currently-cancelled orders may be removed.
    pub fn deletable(&self) -> bool {
        self.current_status.is_cancelled()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OrderError {
    AlreadyCancelled,
}

impl std::error::Error for OrderError {}
impl fmt::Display for OrderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AlreadyCancelled => write!(f, "order is already cancelled"),
        }
    }
}

impl From<OrderError> for crate::error::Error {
    fn from(err: OrderError) -> Self {
        Self::Conflict(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn address() -> ShippingAddress {
        ShippingAddress {
            first_name: "Asha".into(),
            last_name: "Rao".into(),
            email: "asha@example.com".into(),
            phone: "9876543210".into(),
            address: "12 MG Road".into(),
            city: "Bengaluru".into(),
            state: "Karnataka".into(),
            zip_code: "560001".into(),
        }
    }

    fn order_with_one_line() -> Order {
        Order::place(
            OrderNumber::generate(Utc::now()),
            Uuid::new_v4(),
            vec![LineItem {
                product_id: Uuid::new_v4(),
                name: "Basmati Rice 5kg".into(),
                unit_price: Decimal::new(100, 0),
                quantity: 2,
            }],
            address(),
            PaymentMethod::Cod,
            None,
            Utc::now(),
        )
    }

    #[test]
    fn placement_totals_and_seeds_pending_history() {
        let order = order_with_one_line();
        assert_eq!(order.total_price, Decimal::new(200, 0));
        assert_eq!(order.current_status, OrderStatus::Pending);
        assert_eq!(order.status_history.len(), 1);
        assert_eq!(order.status_history[0].status, OrderStatus::Pending);
    }

    #[test]
    fn history_last_entry_tracks_current_status() {
        let mut order = order_with_one_line();
        order.append_status(OrderStatus::Shipped, Utc::now()).unwrap();
        order.append_status(OrderStatus::Delivered, Utc::now()).unwrap();
        assert_eq!(order.status_history.len(), 3);
        assert_eq!(order.current_status, OrderStatus::Delivered);
        assert_eq!(
            order.status_history.last().unwrap().status,
            order.current_status
        );
    }

    #[test]
    fn backward_transitions_are_not_enforced() {
        // Matches the storefront's historical behavior: ordering between the
        // four non-terminal states is advisory only.
        let mut order = order_with_one_line();
        order.append_status(OrderStatus::Delivered, Utc::now()).unwrap();
        order.append_status(OrderStatus::Pending, Utc::now()).unwrap();
        assert_eq!(order.current_status, OrderStatus::Pending);
    }

    #[test]
    fn cancelled_is_sticky_but_recancel_is_allowed() {
        let mut order = order_with_one_line();
        order.append_status(OrderStatus::Cancelled, Utc::now()).unwrap();
        order.append_status(OrderStatus::Cancelled, Utc::now()).unwrap();
        assert_eq!(order.current_status, OrderStatus::Cancelled);
        assert_eq!(order.status_history.len(), 3);
        assert_eq!(
            order.append_status(OrderStatus::Processing, Utc::now()),
            Err(OrderError::AlreadyCancelled)
        );
    }

    #[test]
    fn only_cancelled_orders_are_deletable() {
        let mut order = order_with_one_line();
        assert!(!order.deletable());
        order.append_status(OrderStatus::Cancelled, Utc::now()).unwrap();
        assert!(order.deletable());
    }

    #[test]
    fn status_parses_exact_names_only() {
        assert_eq!("Shipped".parse::<OrderStatus>().unwrap(), OrderStatus::Shipped);
        assert!("shipped".parse::<OrderStatus>().is_err());
        assert!("Flying".parse::<OrderStatus>().is_err());
    }

    #[test]
    fn address_requires_every_field() {
        assert!(address().validate().is_ok());
        let mut missing = address();
        missing.city = String::new();
        assert!(missing.validate().is_err());
        let mut bad_email = address();
        bad_email.email = "not-an-email".into();
        assert!(bad_email.validate().is_err());
    }
}
