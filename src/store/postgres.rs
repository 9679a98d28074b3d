//! Postgres store.
//!
//! Placement runs inside a transaction with per-line conditional decrements,
//! so a short line aborts the whole order and no stock is lost. Status
//! appends are single-statement JSONB mutations: concurrent writers
//! serialize at the row, and a reader never observes the history and
//! `current_status` out of sync.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::types::Json;
use sqlx::PgPool;
use uuid::Uuid;

use async_trait::async_trait;

use crate::domain::value_objects::{OrderNumber, PaymentMethod};
use crate::domain::{
    Customer, LineItem, NewCustomer, Order, OrderStatus, Product, SettingsPatch, ShippingAddress,
    StatusEntry, StoreSettings, UpdateProduct,
};
use crate::error::{Error, Result};
use crate::store::{
    AdminOrderSummary, CartEntry, CartStore, CatalogStore, CategoryCount, CustomerDirectory,
    MAX_LINE_QUANTITY, OrderDraft, OrderLedger, OrderRef, PaginatedResponse, ProductFilter,
    SettingsStore, SortKey, SortOrder,
};

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct OrderRow {
    id: Uuid,
    order_number: String,
    customer_id: Uuid,
    items: Json<Vec<LineItem>>,
    total_price: Decimal,
    shipping_address: Json<ShippingAddress>,
    payment_method: PaymentMethod,
    notes: Option<String>,
    status_history: Json<Vec<StatusEntry>>,
    current_status: OrderStatus,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<OrderRow> for Order {
    fn from(row: OrderRow) -> Self {
        Self {
            id: row.id,
            order_number: OrderNumber::from(row.order_number),
            customer_id: row.customer_id,
            items: row.items.0,
            total_price: row.total_price,
            shipping_address: row.shipping_address.0,
            payment_method: row.payment_method,
            notes: row.notes,
            status_history: row.status_history.0,
            current_status: row.current_status,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct CartRow {
    #[sqlx(flatten)]
    product: Product,
    quantity: i32,
}

/// Splits an [`OrderRef`] into the `(id, number)` bind pair used by the
/// `id = $1 OR order_number = $2` lookups.
fn order_binds(reference: &OrderRef) -> (Option<Uuid>, Option<String>) {
    match reference {
        OrderRef::Id(id) => (Some(*id), None),
        OrderRef::Number(number) => (None, Some(number.clone())),
    }
}

/// Quantities live in 32-bit columns; a larger value is rejected rather
/// than wrapped into a negative bind.
fn quantity_bind(quantity: u32) -> Result<i32> {
    i32::try_from(quantity).map_err(|_| {
        Error::validation(format!("quantity must be at most {MAX_LINE_QUANTITY}"))
    })
}

#[async_trait]
impl CatalogStore for PgStore {
    async fn create_product(&self, product: Product) -> Result<Product> {
        let created = sqlx::query_as::<_, Product>(
            "INSERT INTO products (id, name, description, price, category, stock, image_url, created_at, updated_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
             RETURNING *",
        )
        .bind(product.id)
        .bind(&product.name)
        .bind(&product.description)
        .bind(product.price)
        .bind(&product.category)
        .bind(product.stock)
        .bind(&product.image_url)
        .bind(product.created_at)
        .bind(product.updated_at)
        .fetch_one(&self.pool)
        .await?;
        Ok(created)
    }

    async fn product(&self, id: Uuid) -> Result<Product> {
        sqlx::query_as::<_, Product>("SELECT * FROM products WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(Error::NotFound("product"))
    }

    async fn list_products(&self, filter: &ProductFilter) -> Result<PaginatedResponse<Product>> {
        let column = match filter.sort {
            SortKey::CreatedAt => "created_at",
            SortKey::Price => "price",
            SortKey::Name => "name",
        };
        let direction = match filter.order {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        };
        let sql = format!(
            "SELECT * FROM products
             WHERE ($1::text IS NULL OR name ILIKE '%' || $1 || '%')
               AND ($2::text IS NULL OR category = $2)
               AND ($3::numeric IS NULL OR price >= $3)
               AND ($4::numeric IS NULL OR price <= $4)
             ORDER BY {column} {direction}
             LIMIT $5 OFFSET $6"
        );
        let data = sqlx::query_as::<_, Product>(&sql)
            .bind(&filter.search)
            .bind(&filter.category)
            .bind(filter.min_price)
            .bind(filter.max_price)
            .bind(i64::from(filter.page_size()))
            .bind(filter.offset())
            .fetch_all(&self.pool)
            .await?;
        let total: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM products
             WHERE ($1::text IS NULL OR name ILIKE '%' || $1 || '%')
               AND ($2::text IS NULL OR category = $2)
               AND ($3::numeric IS NULL OR price >= $3)
               AND ($4::numeric IS NULL OR price <= $4)",
        )
        .bind(&filter.search)
        .bind(&filter.category)
        .bind(filter.min_price)
        .bind(filter.max_price)
        .fetch_one(&self.pool)
        .await?;
        Ok(PaginatedResponse {
            data,
            total,
            page: filter.page_number(),
        })
    }

    async fn list_categories(&self) -> Result<Vec<CategoryCount>> {
        let counts = sqlx::query_as::<_, CategoryCount>(
            "SELECT category, COUNT(*) AS count FROM products GROUP BY category ORDER BY category",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(counts)
    }

    async fn update_product(
        &self,
        id: Uuid,
        update: &UpdateProduct,
        now: DateTime<Utc>,
    ) -> Result<Product> {
        let updated = sqlx::query_as::<_, Product>(
            "UPDATE products SET
                 name = COALESCE($2, name),
                 description = COALESCE($3, description),
                 price = COALESCE($4, price),
                 category = COALESCE($5, category),
                 image_url = COALESCE($6, image_url),
                 stock = stock + COALESCE($7, 0),
                 updated_at = $8
             WHERE id = $1 AND stock + COALESCE($7, 0) >= 0
             RETURNING *",
        )
        .bind(id)
        .bind(&update.name)
        .bind(&update.description)
        .bind(update.price)
        .bind(&update.category)
        .bind(&update.image_url)
        .bind(update.stock_delta)
        .bind(now)
        .fetch_optional(&self.pool)
        .await?;
        match updated {
            Some(product) => Ok(product),
            None => {
                let exists: Option<i32> = sqlx::query_scalar("SELECT 1 FROM products WHERE id = $1")
                    .bind(id)
                    .fetch_optional(&self.pool)
                    .await?;
                match exists {
                    Some(_) => Err(Error::conflict("stock adjustment would drop below zero")),
                    None => Err(Error::NotFound("product")),
                }
            }
        }
    }

    async fn delete_product(&self, id: Uuid) -> Result<()> {
        let result = sqlx::query("DELETE FROM products WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(Error::NotFound("product"));
        }
        Ok(())
    }

    async fn count_products(&self) -> Result<i64> {
        let count = sqlx::query_scalar("SELECT COUNT(*) FROM products")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}

#[async_trait]
impl CartStore for PgStore {
    async fn cart(&self, customer_id: Uuid) -> Result<Vec<CartEntry>> {
        let rows = sqlx::query_as::<_, CartRow>(
            "SELECT p.*, ci.quantity
             FROM cart_items ci
             JOIN products p ON p.id = ci.product_id
             WHERE ci.customer_id = $1
             ORDER BY ci.added_at",
        )
        .bind(customer_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows
            .into_iter()
            .map(|row| CartEntry {
                product: row.product,
                quantity: row.quantity.max(0) as u32,
            })
            .collect())
    }

    async fn upsert_line(&self, customer_id: Uuid, product_id: Uuid, quantity: u32) -> Result<()> {
        sqlx::query(
            "INSERT INTO cart_items (customer_id, product_id, quantity)
             VALUES ($1, $2, $3)
             ON CONFLICT (customer_id, product_id)
             DO UPDATE SET quantity = cart_items.quantity + EXCLUDED.quantity",
        )
        .bind(customer_id)
        .bind(product_id)
        .bind(quantity_bind(quantity)?)
        .execute(&self.pool)
        .await
        .map_err(|err| match err.as_database_error() {
            Some(db) if db.is_foreign_key_violation() => Error::NotFound("product"),
            _ => Error::Storage(err),
        })?;
        Ok(())
    }

    async fn set_line_quantity(
        &self,
        customer_id: Uuid,
        product_id: Uuid,
        quantity: u32,
    ) -> Result<()> {
        let result = sqlx::query(
            "UPDATE cart_items SET quantity = $3 WHERE customer_id = $1 AND product_id = $2",
        )
        .bind(customer_id)
        .bind(product_id)
        .bind(quantity_bind(quantity)?)
        .execute(&self.pool)
        .await?;
        if result.rows_affected() == 0 {
            return Err(Error::NotFound("cart item"));
        }
        Ok(())
    }

    async fn remove_line(&self, customer_id: Uuid, product_id: Uuid) -> Result<()> {
        sqlx::query("DELETE FROM cart_items WHERE customer_id = $1 AND product_id = $2")
            .bind(customer_id)
            .bind(product_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn clear_cart(&self, customer_id: Uuid) -> Result<()> {
        sqlx::query("DELETE FROM cart_items WHERE customer_id = $1")
            .bind(customer_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

#[async_trait]
impl OrderLedger for PgStore {
    async fn place_order(&self, draft: OrderDraft) -> Result<Order> {
        let OrderDraft {
            customer_id,
            lines,
            shipping_address,
            payment_method,
            notes,
            order_number,
            placed_at,
        } = draft;

        let mut tx = self.pool.begin().await?;
        // Decrement in product-id order so concurrent placements lock rows
        // in the same sequence; the slots keep the caller's line order in
        // the stored snapshot.
        let mut lock_order: Vec<usize> = (0..lines.len()).collect();
        lock_order.sort_by_key(|&i| lines[i].product_id);
        let mut items: Vec<Option<LineItem>> = vec![None; lines.len()];
        for i in lock_order {
            let line = &lines[i];
            let decremented: Option<(String, Decimal)> = sqlx::query_as(
                "UPDATE products SET stock = stock - $2, updated_at = $3
                 WHERE id = $1 AND stock >= $2
                 RETURNING name, price",
            )
            .bind(line.product_id)
            .bind(quantity_bind(line.quantity)?)
            .bind(placed_at)
            .fetch_optional(&mut *tx)
            .await?;
            let Some((name, price)) = decremented else {
                // Dropping the transaction rolls every earlier decrement back.
                let available: Option<i32> =
                    sqlx::query_scalar("SELECT stock FROM products WHERE id = $1")
                        .bind(line.product_id)
                        .fetch_optional(&mut *tx)
                        .await?;
                let err = match available {
                    Some(stock) => Error::OutOfStock {
                        product_id: line.product_id,
                        requested: line.quantity,
                        available: stock.max(0) as u32,
                    },
                    None => Error::NotFound("product"),
                };
                tracing::warn!(
                    order_number = %order_number,
                    product_id = %line.product_id,
                    requested = line.quantity,
                    error = %err,
                    "placement aborted"
                );
                return Err(err);
            };
            items[i] = Some(LineItem {
                product_id: line.product_id,
                name,
                unit_price: line.price.unwrap_or(price),
                quantity: line.quantity,
            });
        }
        let items: Vec<LineItem> = items.into_iter().flatten().collect();

        let order = Order::place(
            order_number,
            customer_id,
            items,
            shipping_address,
            payment_method,
            notes,
            placed_at,
        );
        sqlx::query(
            "INSERT INTO orders (id, order_number, customer_id, items, total_price,
                                 shipping_address, payment_method, notes, status_history,
                                 current_status, created_at, updated_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)",
        )
        .bind(order.id)
        .bind(order.order_number.as_str())
        .bind(order.customer_id)
        .bind(Json(&order.items))
        .bind(order.total_price)
        .bind(Json(&order.shipping_address))
        .bind(order.payment_method.as_str())
        .bind(&order.notes)
        .bind(Json(&order.status_history))
        .bind(order.current_status.as_str())
        .bind(order.created_at)
        .bind(order.updated_at)
        .execute(&mut *tx)
        .await
        .map_err(|err| match err.as_database_error() {
            Some(db) if db.is_unique_violation() => Error::conflict(format!(
                "order number {} already exists",
                order.order_number
            )),
            Some(db) if db.is_foreign_key_violation() => Error::NotFound("customer"),
            _ => Error::Storage(err),
        })?;
        tx.commit().await?;
        Ok(order)
    }

    async fn order(&self, reference: &OrderRef) -> Result<Order> {
        let (id, number) = order_binds(reference);
        let row: Option<OrderRow> =
            sqlx::query_as("SELECT * FROM orders WHERE id = $1 OR order_number = $2")
                .bind(id)
                .bind(&number)
                .fetch_optional(&self.pool)
                .await?;
        row.map(Order::from).ok_or(Error::NotFound("order"))
    }

    async fn orders_for_customer(&self, customer_id: Uuid) -> Result<Vec<Order>> {
        let rows: Vec<OrderRow> =
            sqlx::query_as("SELECT * FROM orders WHERE customer_id = $1 ORDER BY created_at DESC")
                .bind(customer_id)
                .fetch_all(&self.pool)
                .await?;
        Ok(rows.into_iter().map(Order::from).collect())
    }

    async fn append_status(
        &self,
        reference: &OrderRef,
        status: OrderStatus,
        at: DateTime<Utc>,
    ) -> Result<Order> {
        let (id, number) = order_binds(reference);
        let entry = StatusEntry { status, at };
        let row: Option<OrderRow> = sqlx::query_as(
            "UPDATE orders
             SET status_history = status_history || $3,
                 current_status = $4,
                 updated_at = $5
             WHERE (id = $1 OR order_number = $2)
               AND (current_status <> 'Cancelled' OR $4 = 'Cancelled')
             RETURNING *",
        )
        .bind(id)
        .bind(&number)
        .bind(Json(&entry))
        .bind(status.as_str())
        .bind(at)
        .fetch_optional(&self.pool)
        .await?;
        match row {
            Some(row) => Ok(Order::from(row)),
            None => {
                let exists: Option<i32> =
                    sqlx::query_scalar("SELECT 1 FROM orders WHERE id = $1 OR order_number = $2")
                        .bind(id)
                        .bind(&number)
                        .fetch_optional(&self.pool)
                        .await?;
                match exists {
                    Some(_) => Err(Error::conflict("order is already cancelled")),
                    None => Err(Error::NotFound("order")),
                }
            }
        }
    }

    async fn delete_order(&self, reference: &OrderRef) -> Result<()> {
        let (id, number) = order_binds(reference);
        let result = sqlx::query(
            "DELETE FROM orders
             WHERE (id = $1 OR order_number = $2) AND current_status = 'Cancelled'",
        )
        .bind(id)
        .bind(&number)
        .execute(&self.pool)
        .await?;
        if result.rows_affected() == 0 {
            let exists: Option<i32> =
                sqlx::query_scalar("SELECT 1 FROM orders WHERE id = $1 OR order_number = $2")
                    .bind(id)
                    .bind(&number)
                    .fetch_optional(&self.pool)
                    .await?;
            return match exists {
                Some(_) => Err(Error::conflict("only cancelled orders can be deleted")),
                None => Err(Error::NotFound("order")),
            };
        }
        Ok(())
    }

    async fn list_orders(
        &self,
        page: u32,
        per_page: u32,
    ) -> Result<PaginatedResponse<AdminOrderSummary>> {
        let page = page.max(1);
        let data = sqlx::query_as::<_, AdminOrderSummary>(
            "SELECT o.id, o.order_number, c.name AS customer_name, c.email AS customer_email,
                    o.total_price, o.current_status, o.created_at
             FROM orders o
             LEFT JOIN customers c ON c.id = o.customer_id
             ORDER BY o.created_at DESC
             LIMIT $1 OFFSET $2",
        )
        .bind(i64::from(per_page))
        .bind(i64::from(page - 1) * i64::from(per_page))
        .fetch_all(&self.pool)
        .await?;
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM orders")
            .fetch_one(&self.pool)
            .await?;
        Ok(PaginatedResponse { data, total, page })
    }

    async fn recent_orders(&self, limit: i64) -> Result<Vec<AdminOrderSummary>> {
        let rows = sqlx::query_as::<_, AdminOrderSummary>(
            "SELECT o.id, o.order_number, c.name AS customer_name, c.email AS customer_email,
                    o.total_price, o.current_status, o.created_at
             FROM orders o
             LEFT JOIN customers c ON c.id = o.customer_id
             ORDER BY o.created_at DESC
             LIMIT $1",
        )
        .bind(limit.max(0))
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn count_orders(&self) -> Result<i64> {
        let count = sqlx::query_scalar("SELECT COUNT(*) FROM orders")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    async fn delivered_revenue(&self) -> Result<Decimal> {
        let revenue = sqlx::query_scalar(
            "SELECT COALESCE(SUM(total_price), 0)
             FROM orders
             WHERE current_status = 'Delivered'",
        )
        .fetch_one(&self.pool)
        .await?;
        Ok(revenue)
    }
}

#[async_trait]
impl CustomerDirectory for PgStore {
    async fn customer(&self, id: Uuid) -> Result<Customer> {
        sqlx::query_as::<_, Customer>("SELECT * FROM customers WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(Error::NotFound("customer"))
    }

    async fn upsert_customer(&self, customer: NewCustomer) -> Result<Customer> {
        let stored = sqlx::query_as::<_, Customer>(
            "INSERT INTO customers (id, name, email, is_admin)
             VALUES ($1, $2, $3, $4)
             ON CONFLICT (id) DO UPDATE
             SET name = EXCLUDED.name, email = EXCLUDED.email, is_admin = EXCLUDED.is_admin
             RETURNING *",
        )
        .bind(customer.id)
        .bind(&customer.name)
        .bind(&customer.email)
        .bind(customer.is_admin)
        .fetch_one(&self.pool)
        .await
        .map_err(|err| match err.as_database_error() {
            Some(db) if db.is_unique_violation() => {
                Error::conflict("email already registered to another customer")
            }
            _ => Error::Storage(err),
        })?;
        Ok(stored)
    }

    async fn count_customers(&self) -> Result<i64> {
        let count = sqlx::query_scalar("SELECT COUNT(*) FROM customers")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}

#[async_trait]
impl SettingsStore for PgStore {
    async fn settings(&self) -> Result<StoreSettings> {
        let settings =
            sqlx::query_as::<_, StoreSettings>("SELECT * FROM store_settings LIMIT 1")
                .fetch_one(&self.pool)
                .await?;
        Ok(settings)
    }

    async fn update_settings(
        &self,
        patch: &SettingsPatch,
        now: DateTime<Utc>,
    ) -> Result<StoreSettings> {
        let settings = sqlx::query_as::<_, StoreSettings>(
            "UPDATE store_settings SET
                 store_name = COALESCE($1, store_name),
                 support_email = COALESCE($2, support_email),
                 delivery_fee = COALESCE($3, delivery_fee),
                 tax_rate = COALESCE($4, tax_rate),
                 currency = COALESCE($5, currency),
                 currency_symbol = COALESCE($6, currency_symbol),
                 updated_at = $7
             RETURNING *",
        )
        .bind(&patch.store_name)
        .bind(&patch.support_email)
        .bind(patch.delivery_fee)
        .bind(patch.tax_rate)
        .bind(&patch.currency)
        .bind(&patch.currency_symbol)
        .bind(now)
        .fetch_one(&self.pool)
        .await?;
        Ok(settings)
    }
}
