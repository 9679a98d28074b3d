//! Storage seams for the storefront core.
//!
//! Each persistence concern gets its own trait so a service depends only on
//! what it touches; [`Store`] bundles them behind a single object for
//! wiring. [`PgStore`] is the production implementation; [`MemoryStore`]
//! backs the test suite with the same observable semantics.

pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::value_objects::{OrderNumber, PaymentMethod};
use crate::domain::{
    Customer, NewCustomer, Order, OrderStatus, Product, SettingsPatch, ShippingAddress,
    StoreSettings, UpdateProduct,
};
use crate::error::Result;

/// Largest per-line quantity the stores accept; cart and stock columns are
/// 32-bit, so anything larger has no representation.
pub const MAX_LINE_QUANTITY: u32 = i32::MAX as u32;

/// Reference to an order by surrogate id or by its public number.
///
/// Lookups try the id first and fall back to the number, so admin tooling
/// and customers can use whichever they hold.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum OrderRef {
    Id(Uuid),
    Number(String),
}

impl OrderRef {
    /// Parses a path segment: anything that is a UUID becomes an id lookup,
    /// everything else is treated as an order number.
    pub fn parse(raw: &str) -> Self {
        match Uuid::parse_str(raw) {
            Ok(id) => OrderRef::Id(id),
            Err(_) => OrderRef::Number(raw.to_string()),
        }
    }
}

impl std::fmt::Display for OrderRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OrderRef::Id(id) => write!(f, "{id}"),
            OrderRef::Number(number) => f.write_str(number),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortKey {
    #[default]
    CreatedAt,
    Price,
    Name,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

/// Catalog listing options. Everything is optional; the defaults page the
/// whole catalog newest-first.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct ProductFilter {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
    pub category: Option<String>,
    pub search: Option<String>,
    pub min_price: Option<Decimal>,
    pub max_price: Option<Decimal>,
    #[serde(default)]
    pub sort: SortKey,
    #[serde(default)]
    pub order: SortOrder,
}

impl ProductFilter {
    pub fn page_number(&self) -> u32 {
        self.page.unwrap_or(1).max(1)
    }

    pub fn page_size(&self) -> u32 {
        self.per_page.unwrap_or(20).min(100)
    }

    pub fn offset(&self) -> i64 {
        // Widen before multiplying; the product can exceed u32.
        (i64::from(self.page_number()) - 1) * i64::from(self.page_size())
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PaginatedResponse<T> {
    pub data: Vec<T>,
    pub total: i64,
    pub page: u32,
}

/// Distinct category with its product count.
#[derive(Clone, Debug, Serialize, Deserialize, sqlx::FromRow)]
pub struct CategoryCount {
    pub category: String,
    pub count: i64,
}

/// Cart line with its product resolved, as returned to customers.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CartEntry {
    pub product: Product,
    pub quantity: u32,
}

/// Validated placement input. The store resolves each line against the
/// catalog inside its transaction; a line price, when given, locks in the
/// price the customer saw instead of the current catalog price.
#[derive(Clone, Debug)]
pub struct OrderDraft {
    pub customer_id: Uuid,
    pub lines: Vec<DraftLine>,
    pub shipping_address: ShippingAddress,
    pub payment_method: PaymentMethod,
    pub notes: Option<String>,
    pub order_number: OrderNumber,
    pub placed_at: DateTime<Utc>,
}

#[derive(Clone, Debug)]
pub struct DraftLine {
    pub product_id: Uuid,
    pub quantity: u32,
    pub price: Option<Decimal>,
}

/// Admin order listing row with the customer resolved.
#[derive(Clone, Debug, Serialize, Deserialize, sqlx::FromRow)]
pub struct AdminOrderSummary {
    pub id: Uuid,
    pub order_number: String,
    pub customer_name: Option<String>,
    pub customer_email: Option<String>,
    pub total_price: Decimal,
    pub current_status: OrderStatus,
    pub created_at: DateTime<Utc>,
}

/// Product inventory: read by carts and placement, written by admin edits
/// and by the placement decrement.
#[async_trait]
pub trait CatalogStore: Send + Sync {
    async fn create_product(&self, product: Product) -> Result<Product>;

    async fn product(&self, id: Uuid) -> Result<Product>;

    async fn list_products(&self, filter: &ProductFilter) -> Result<PaginatedResponse<Product>>;

    async fn list_categories(&self) -> Result<Vec<CategoryCount>>;

    /// Last-writer-wins per field, except stock which moves by
    /// `stock_delta`; an adjustment that would take stock negative fails
    /// with a conflict so concurrent sales are never erased.
    async fn update_product(
        &self,
        id: Uuid,
        update: &UpdateProduct,
        now: DateTime<Utc>,
    ) -> Result<Product>;

    async fn delete_product(&self, id: Uuid) -> Result<()>;

    async fn count_products(&self) -> Result<i64>;
}

/// Server-held carts, one per customer, keyed (customer, product).
#[async_trait]
pub trait CartStore: Send + Sync {
    /// Lines with product details resolved, oldest line first.
    async fn cart(&self, customer_id: Uuid) -> Result<Vec<CartEntry>>;

    /// Adds `quantity` to the line, creating it if absent. The product must
    /// exist; stock is not checked here.
    async fn upsert_line(&self, customer_id: Uuid, product_id: Uuid, quantity: u32) -> Result<()>;

    /// Sets an existing line to a positive quantity.
    async fn set_line_quantity(
        &self,
        customer_id: Uuid,
        product_id: Uuid,
        quantity: u32,
    ) -> Result<()>;

    /// Idempotent: removing an absent line succeeds.
    async fn remove_line(&self, customer_id: Uuid, product_id: Uuid) -> Result<()>;

    /// Idempotent: clearing an empty cart succeeds.
    async fn clear_cart(&self, customer_id: Uuid) -> Result<()>;
}

/// The entity-of-record for placed orders.
#[async_trait]
pub trait OrderLedger: Send + Sync {
    /// Reserves stock for every line and records the order, all or nothing.
    /// Fails without side effects when a product is missing, stock is
    /// short, or the order number already exists.
    async fn place_order(&self, draft: OrderDraft) -> Result<Order>;

    async fn order(&self, reference: &OrderRef) -> Result<Order>;

    /// A customer's orders, newest first.
    async fn orders_for_customer(&self, customer_id: Uuid) -> Result<Vec<Order>>;

    /// Appends a history entry and moves `current_status` in one atomic
    /// step. Leaving Cancelled is refused with a conflict; re-cancelling
    /// is allowed.
    async fn append_status(
        &self,
        reference: &OrderRef,
        status: OrderStatus,
        at: DateTime<Utc>,
    ) -> Result<Order>;

    /// Removes an order; only currently-cancelled orders qualify.
    async fn delete_order(&self, reference: &OrderRef) -> Result<()>;

    async fn list_orders(
        &self,
        page: u32,
        per_page: u32,
    ) -> Result<PaginatedResponse<AdminOrderSummary>>;

    async fn recent_orders(&self, limit: i64) -> Result<Vec<AdminOrderSummary>>;

    async fn count_orders(&self) -> Result<i64>;

    /// Sum of `total_price` over delivered orders; zero when there are none.
    async fn delivered_revenue(&self) -> Result<Decimal>;
}

/// Customer identities, written by the auth collaborator and read here for
/// ownership checks and dashboard counts.
#[async_trait]
pub trait CustomerDirectory: Send + Sync {
    async fn customer(&self, id: Uuid) -> Result<Customer>;

    async fn upsert_customer(&self, customer: NewCustomer) -> Result<Customer>;

    async fn count_customers(&self) -> Result<i64>;
}

/// Persisted storefront configuration, a single row with seeded defaults.
#[async_trait]
pub trait SettingsStore: Send + Sync {
    async fn settings(&self) -> Result<StoreSettings>;

    async fn update_settings(
        &self,
        patch: &SettingsPatch,
        now: DateTime<Utc>,
    ) -> Result<StoreSettings>;
}

/// Everything the HTTP surface needs, bundled for `Arc<dyn Store>` wiring.
pub trait Store:
    CatalogStore + CartStore + OrderLedger + CustomerDirectory + SettingsStore
{
}

impl<T> Store for T where
    T: CatalogStore + CartStore + OrderLedger + CustomerDirectory + SettingsStore
{
}
