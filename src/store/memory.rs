//! In-memory store.
//!
//! One mutex over the whole state: every operation is a single critical
//! section, which gives the same all-or-nothing and no-lost-update
//! guarantees the Postgres implementation gets from transactions and
//! conditional updates. Used by the test suite and for local development
//! without a database.

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use tokio::sync::Mutex;
use uuid::Uuid;

use async_trait::async_trait;

use crate::domain::aggregates::cart::Cart;
use crate::domain::{
    Customer, LineItem, NewCustomer, Order, OrderStatus, Product, SettingsPatch, StoreSettings,
    UpdateProduct,
};
use crate::error::{Error, Result};
use crate::store::{
    AdminOrderSummary, CartEntry, CartStore, CatalogStore, CategoryCount, CustomerDirectory,
    OrderDraft, OrderLedger, OrderRef, PaginatedResponse, ProductFilter, SettingsStore, SortKey,
    SortOrder,
};

#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

#[derive(Default)]
struct Inner {
    products: HashMap<Uuid, Product>,
    carts: HashMap<Uuid, Cart>,
    orders: HashMap<Uuid, Order>,
    order_numbers: HashMap<String, Uuid>,
    customers: HashMap<Uuid, Customer>,
    settings: StoreSettings,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Inner {
    fn order_id(&self, reference: &OrderRef) -> Option<Uuid> {
        match reference {
            OrderRef::Id(id) => Some(*id),
            OrderRef::Number(number) => self.order_numbers.get(number).copied(),
        }
    }

    fn sorted_orders(&self) -> Vec<&Order> {
        let mut orders: Vec<&Order> = self.orders.values().collect();
        orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        orders
    }

    fn summarize(&self, order: &Order) -> AdminOrderSummary {
        let customer = self.customers.get(&order.customer_id);
        AdminOrderSummary {
            id: order.id,
            order_number: order.order_number.as_str().to_string(),
            customer_name: customer.map(|c| c.name.clone()),
            customer_email: customer.map(|c| c.email.clone()),
            total_price: order.total_price,
            current_status: order.current_status,
            created_at: order.created_at,
        }
    }
}

#[async_trait]
impl CatalogStore for MemoryStore {
    async fn create_product(&self, product: Product) -> Result<Product> {
        let mut inner = self.inner.lock().await;
        inner.products.insert(product.id, product.clone());
        Ok(product)
    }

    async fn product(&self, id: Uuid) -> Result<Product> {
        let inner = self.inner.lock().await;
        inner
            .products
            .get(&id)
            .cloned()
            .ok_or(Error::NotFound("product"))
    }

    async fn list_products(&self, filter: &ProductFilter) -> Result<PaginatedResponse<Product>> {
        let inner = self.inner.lock().await;
        let search = filter.search.as_ref().map(|s| s.to_lowercase());
        let mut matches: Vec<Product> = inner
            .products
            .values()
            .filter(|p| {
                search
                    .as_ref()
                    .map_or(true, |s| p.name.to_lowercase().contains(s))
            })
            .filter(|p| filter.category.as_ref().map_or(true, |c| &p.category == c))
            .filter(|p| filter.min_price.map_or(true, |min| p.price >= min))
            .filter(|p| filter.max_price.map_or(true, |max| p.price <= max))
            .cloned()
            .collect();

        matches.sort_by(|a, b| {
            let ordering = match filter.sort {
                SortKey::CreatedAt => a.created_at.cmp(&b.created_at),
                SortKey::Price => a.price.cmp(&b.price),
                SortKey::Name => a.name.cmp(&b.name),
            };
            match filter.order {
                SortOrder::Asc => ordering,
                SortOrder::Desc => ordering.reverse(),
            }
        });

        let total = matches.len() as i64;
        let data: Vec<Product> = matches
            .into_iter()
            .skip(filter.offset() as usize)
            .take(filter.page_size() as usize)
            .collect();
        Ok(PaginatedResponse {
            data,
            total,
            page: filter.page_number(),
        })
    }

    async fn list_categories(&self) -> Result<Vec<CategoryCount>> {
        let inner = self.inner.lock().await;
        let mut counts: BTreeMap<String, i64> = BTreeMap::new();
        for product in inner.products.values() {
            *counts.entry(product.category.clone()).or_insert(0) += 1;
        }
        Ok(counts
            .into_iter()
            .map(|(category, count)| CategoryCount { category, count })
            .collect())
    }

    async fn update_product(
        &self,
        id: Uuid,
        update: &UpdateProduct,
        now: DateTime<Utc>,
    ) -> Result<Product> {
        let mut inner = self.inner.lock().await;
        let product = inner
            .products
            .get_mut(&id)
            .ok_or(Error::NotFound("product"))?;
        if let Some(delta) = update.stock_delta {
            let next = i64::from(product.stock) + i64::from(delta);
            if !(0..=i64::from(i32::MAX)).contains(&next) {
                return Err(Error::conflict("stock adjustment would drop below zero"));
            }
            product.stock = next as i32;
        }
        product.apply(update, now);
        Ok(product.clone())
    }

    async fn delete_product(&self, id: Uuid) -> Result<()> {
        let mut inner = self.inner.lock().await;
        if inner.products.remove(&id).is_none() {
            return Err(Error::NotFound("product"));
        }
        for cart in inner.carts.values_mut() {
            cart.remove(id);
        }
        Ok(())
    }

    async fn count_products(&self) -> Result<i64> {
        let inner = self.inner.lock().await;
        Ok(inner.products.len() as i64)
    }
}

#[async_trait]
impl CartStore for MemoryStore {
    async fn cart(&self, customer_id: Uuid) -> Result<Vec<CartEntry>> {
        let inner = self.inner.lock().await;
        let Some(cart) = inner.carts.get(&customer_id) else {
            return Ok(Vec::new());
        };
        Ok(cart
            .lines()
            .iter()
            .filter_map(|line| {
                inner.products.get(&line.product_id).map(|p| CartEntry {
                    product: p.clone(),
                    quantity: line.quantity,
                })
            })
            .collect())
    }

    async fn upsert_line(&self, customer_id: Uuid, product_id: Uuid, quantity: u32) -> Result<()> {
        let mut inner = self.inner.lock().await;
        if !inner.products.contains_key(&product_id) {
            return Err(Error::NotFound("product"));
        }
        inner
            .carts
            .entry(customer_id)
            .or_insert_with(|| Cart::for_customer(customer_id))
            .add(product_id, quantity)?;
        Ok(())
    }

    async fn set_line_quantity(
        &self,
        customer_id: Uuid,
        product_id: Uuid,
        quantity: u32,
    ) -> Result<()> {
        let mut inner = self.inner.lock().await;
        let cart = inner
            .carts
            .get_mut(&customer_id)
            .ok_or(Error::NotFound("cart item"))?;
        cart.set_quantity(product_id, quantity)?;
        Ok(())
    }

    async fn remove_line(&self, customer_id: Uuid, product_id: Uuid) -> Result<()> {
        let mut inner = self.inner.lock().await;
        if let Some(cart) = inner.carts.get_mut(&customer_id) {
            cart.remove(product_id);
        }
        Ok(())
    }

    async fn clear_cart(&self, customer_id: Uuid) -> Result<()> {
        let mut inner = self.inner.lock().await;
        inner.carts.remove(&customer_id);
        Ok(())
    }
}

#[async_trait]
impl OrderLedger for MemoryStore {
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

        let mut inner = self.inner.lock().await;
        if inner.order_numbers.contains_key(order_number.as_str()) {
            return Err(Error::conflict(format!(
                "order number {order_number} already exists"
            )));
        }

        // Decrement line by line, mirroring the transactional store: a line
        // that cannot be fulfilled rolls every earlier decrement back.
        let mut applied: Vec<(Uuid, u32)> = Vec::new();
        let mut items: Vec<LineItem> = Vec::new();
        let mut failure: Option<Error> = None;
        for line in &lines {
            match inner.products.get_mut(&line.product_id) {
                None => {
                    failure = Some(Error::NotFound("product"));
                    break;
                }
                Some(product) if !product.can_fulfill(line.quantity) => {
                    failure = Some(Error::OutOfStock {
                        product_id: line.product_id,
                        requested: line.quantity,
                        available: product.stock.max(0) as u32,
                    });
                    break;
                }
                Some(product) => {
                    product.stock -= line.quantity as i32;
                    applied.push((line.product_id, line.quantity));
                    items.push(LineItem {
                        product_id: line.product_id,
                        name: product.name.clone(),
                        unit_price: line.price.unwrap_or(product.price),
                        quantity: line.quantity,
                    });
                }
            }
        }
        if let Some(err) = failure {
            for (product_id, quantity) in applied {
                if let Some(product) = inner.products.get_mut(&product_id) {
                    product.stock += quantity as i32;
                }
            }
            tracing::warn!(order_number = %order_number, error = %err, "placement aborted");
            return Err(err);
        }

        let order = Order::place(
            order_number,
            customer_id,
            items,
            shipping_address,
            payment_method,
            notes,
            placed_at,
        );
        inner
            .order_numbers
            .insert(order.order_number.as_str().to_string(), order.id);
        inner.orders.insert(order.id, order.clone());
        Ok(order)
    }

    async fn order(&self, reference: &OrderRef) -> Result<Order> {
        let inner = self.inner.lock().await;
        inner
            .order_id(reference)
            .and_then(|id| inner.orders.get(&id))
            .cloned()
            .ok_or(Error::NotFound("order"))
    }

    async fn orders_for_customer(&self, customer_id: Uuid) -> Result<Vec<Order>> {
        let inner = self.inner.lock().await;
        Ok(inner
            .sorted_orders()
            .into_iter()
            .filter(|o| o.customer_id == customer_id)
            .cloned()
            .collect())
    }

    async fn append_status(
        &self,
        reference: &OrderRef,
        status: OrderStatus,
        at: DateTime<Utc>,
    ) -> Result<Order> {
        let mut inner = self.inner.lock().await;
        let id = inner.order_id(reference).ok_or(Error::NotFound("order"))?;
        let order = inner.orders.get_mut(&id).ok_or(Error::NotFound("order"))?;
        order.append_status(status, at)?;
        Ok(order.clone())
    }

    async fn delete_order(&self, reference: &OrderRef) -> Result<()> {
        let mut inner = self.inner.lock().await;
        let id = inner.order_id(reference).ok_or(Error::NotFound("order"))?;
        let order = inner.orders.get(&id).ok_or(Error::NotFound("order"))?;
        if !order.deletable() {
            return Err(Error::conflict("only cancelled orders can be deleted"));
        }
        let number = order.order_number.as_str().to_string();
        inner.orders.remove(&id);
        inner.order_numbers.remove(&number);
        Ok(())
    }

    async fn list_orders(
        &self,
        page: u32,
        per_page: u32,
    ) -> Result<PaginatedResponse<AdminOrderSummary>> {
        let inner = self.inner.lock().await;
        let sorted = inner.sorted_orders();
        let total = sorted.len() as i64;
        let offset = (page.max(1) - 1) as usize * per_page as usize;
        let data = sorted
            .into_iter()
            .skip(offset)
            .take(per_page as usize)
            .map(|o| inner.summarize(o))
            .collect();
        Ok(PaginatedResponse {
            data,
            total,
            page: page.max(1),
        })
    }

    async fn recent_orders(&self, limit: i64) -> Result<Vec<AdminOrderSummary>> {
        let inner = self.inner.lock().await;
        Ok(inner
            .sorted_orders()
            .into_iter()
            .take(limit.max(0) as usize)
            .map(|o| inner.summarize(o))
            .collect())
    }

    async fn count_orders(&self) -> Result<i64> {
        let inner = self.inner.lock().await;
        Ok(inner.orders.len() as i64)
    }

    async fn delivered_revenue(&self) -> Result<Decimal> {
        let inner = self.inner.lock().await;
        Ok(inner
            .orders
            .values()
            .filter(|o| o.current_status == OrderStatus::Delivered)
            .map(|o| o.total_price)
            .sum())
    }
}

#[async_trait]
impl CustomerDirectory for MemoryStore {
    async fn customer(&self, id: Uuid) -> Result<Customer> {
        let inner = self.inner.lock().await;
        inner
            .customers
            .get(&id)
            .cloned()
            .ok_or(Error::NotFound("customer"))
    }

    async fn upsert_customer(&self, customer: NewCustomer) -> Result<Customer> {
        let mut inner = self.inner.lock().await;
        let stored = match inner.customers.get_mut(&customer.id) {
            Some(existing) => {
                existing.name = customer.name;
                existing.email = customer.email;
                existing.is_admin = customer.is_admin;
                existing.clone()
            }
            None => {
                let created = customer.into_customer(Utc::now());
                inner.customers.insert(created.id, created.clone());
                created
            }
        };
        Ok(stored)
    }

    async fn count_customers(&self) -> Result<i64> {
        let inner = self.inner.lock().await;
        Ok(inner.customers.len() as i64)
    }
}

#[async_trait]
impl SettingsStore for MemoryStore {
    async fn settings(&self) -> Result<StoreSettings> {
        let inner = self.inner.lock().await;
        Ok(inner.settings.clone())
    }

    async fn update_settings(
        &self,
        patch: &SettingsPatch,
        now: DateTime<Utc>,
    ) -> Result<StoreSettings> {
        let mut inner = self.inner.lock().await;
        inner.settings.apply(patch, now);
        Ok(inner.settings.clone())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::domain::value_objects::{OrderNumber, PaymentMethod};
    use crate::domain::{NewProduct, ShippingAddress};
    use crate::store::DraftLine;

    fn address() -> ShippingAddress {
        ShippingAddress {
            first_name: "Asha".into(),
            last_name: "Rao".into(),
            email: "asha@example.com".into(),
            phone: "9000000001".into(),
            address: "12 Market Road".into(),
            city: "Pune".into(),
            state: "MH".into(),
            zip_code: "411001".into(),
        }
    }

    async fn seed_product(store: &MemoryStore, name: &str, price: i64, stock: i32) -> Product {
        let product = Product::create(
            NewProduct {
                name: name.into(),
                description: String::new(),
                price: Decimal::new(price, 0),
                category: "Grocery".into(),
                stock,
                image_url: None,
            },
            Utc::now(),
        );
        store.create_product(product).await.unwrap()
    }

    fn draft(customer_id: Uuid, lines: Vec<DraftLine>) -> OrderDraft {
        // Sequence-derived numbers so placements in the same millisecond
        // cannot collide.
        static SEQ: std::sync::atomic::AtomicU64 = std::sync::atomic::AtomicU64::new(1);
        let seq = SEQ.fetch_add(1, std::sync::atomic::Ordering::Relaxed);
        OrderDraft {
            customer_id,
            lines,
            shipping_address: address(),
            payment_method: PaymentMethod::Cod,
            notes: None,
            order_number: OrderNumber::from(format!("ORDT{seq:04}")),
            placed_at: Utc::now(),
        }
    }

    fn line(product_id: Uuid, quantity: u32) -> DraftLine {
        DraftLine {
            product_id,
            quantity,
            price: None,
        }
    }

    #[tokio::test]
    async fn placement_decrements_stock_and_records_the_order() {
        let store = MemoryStore::new();
        let customer = Uuid::new_v4();
        let apples = seed_product(&store, "Apples", 100, 10).await;
        let milk = seed_product(&store, "Milk", 60, 4).await;

        let order = store
            .place_order(draft(
                customer,
                vec![line(apples.id, 2), line(milk.id, 1)],
            ))
            .await
            .unwrap();

        assert_eq!(order.total_price, Decimal::new(260, 0));
        assert_eq!(order.current_status, OrderStatus::Pending);
        assert_eq!(order.status_history.len(), 1);
        assert_eq!(store.product(apples.id).await.unwrap().stock, 8);
        assert_eq!(store.product(milk.id).await.unwrap().stock, 3);
    }

    #[tokio::test]
    async fn failed_placement_leaves_every_stock_untouched() {
        let store = MemoryStore::new();
        let customer = Uuid::new_v4();
        let apples = seed_product(&store, "Apples", 100, 10).await;
        let milk = seed_product(&store, "Milk", 60, 1).await;

        let err = store
            .place_order(draft(
                customer,
                vec![line(apples.id, 2), line(milk.id, 5)],
            ))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            Error::OutOfStock {
                requested: 5,
                available: 1,
                ..
            }
        ));
        assert_eq!(store.product(apples.id).await.unwrap().stock, 10);
        assert_eq!(store.product(milk.id).await.unwrap().stock, 1);
    }

    #[tokio::test]
    async fn repeated_line_cannot_oversell() {
        let store = MemoryStore::new();
        let customer = Uuid::new_v4();
        let apples = seed_product(&store, "Apples", 100, 5).await;

        let err = store
            .place_order(draft(
                customer,
                vec![line(apples.id, 3), line(apples.id, 3)],
            ))
            .await
            .unwrap_err();

        assert!(matches!(err, Error::OutOfStock { available: 2, .. }));
        assert_eq!(store.product(apples.id).await.unwrap().stock, 5);
    }

    #[tokio::test]
    async fn duplicate_order_number_is_a_conflict() {
        let store = MemoryStore::new();
        let customer = Uuid::new_v4();
        let apples = seed_product(&store, "Apples", 100, 10).await;

        let mut first = draft(customer, vec![line(apples.id, 1)]);
        first.order_number = OrderNumber::from("ORD42".to_string());
        store.place_order(first).await.unwrap();

        let mut second = draft(customer, vec![line(apples.id, 1)]);
        second.order_number = OrderNumber::from("ORD42".to_string());
        let err = store.place_order(second).await.unwrap_err();

        assert!(matches!(err, Error::Conflict(_)));
        assert_eq!(store.product(apples.id).await.unwrap().stock, 9);
    }

    #[tokio::test]
    async fn concurrent_placements_cannot_oversell() {
        let store = Arc::new(MemoryStore::new());
        let customer = Uuid::new_v4();
        let apples = seed_product(&store, "Apples", 100, 5).await;

        let a = tokio::spawn({
            let store = Arc::clone(&store);
            let d = draft(customer, vec![line(apples.id, 3)]);
            async move { store.place_order(d).await }
        });
        let b = tokio::spawn({
            let store = Arc::clone(&store);
            let d = draft(customer, vec![line(apples.id, 3)]);
            async move { store.place_order(d).await }
        });

        let outcomes = [a.await.unwrap(), b.await.unwrap()];
        let succeeded = outcomes.iter().filter(|o| o.is_ok()).count();
        assert_eq!(succeeded, 1);
        assert!(outcomes
            .iter()
            .any(|o| matches!(o, Err(Error::OutOfStock { .. }))));
        assert_eq!(store.product(apples.id).await.unwrap().stock, 2);
    }

    #[tokio::test]
    async fn opposite_order_multi_line_placements_settle_cleanly() {
        let store = Arc::new(MemoryStore::new());
        let apples = seed_product(&store, "Apples", 100, 5).await;
        let milk = seed_product(&store, "Milk", 60, 5).await;

        let a = tokio::spawn({
            let store = Arc::clone(&store);
            let d = draft(Uuid::new_v4(), vec![line(apples.id, 3), line(milk.id, 3)]);
            async move { store.place_order(d).await }
        });
        let b = tokio::spawn({
            let store = Arc::clone(&store);
            let d = draft(Uuid::new_v4(), vec![line(milk.id, 3), line(apples.id, 3)]);
            async move { store.place_order(d).await }
        });

        // Whichever lands second loses outright; there is no outcome where
        // both partially apply or the stocks drift.
        let outcomes = [a.await.unwrap(), b.await.unwrap()];
        assert_eq!(outcomes.iter().filter(|o| o.is_ok()).count(), 1);
        assert!(outcomes
            .iter()
            .any(|o| matches!(o, Err(Error::OutOfStock { .. }))));
        assert_eq!(store.product(apples.id).await.unwrap().stock, 2);
        assert_eq!(store.product(milk.id).await.unwrap().stock, 2);
    }

    #[tokio::test]
    async fn concurrent_status_appends_lose_no_history_entries() {
        let store = Arc::new(MemoryStore::new());
        let customer = Uuid::new_v4();
        let apples = seed_product(&store, "Apples", 100, 10).await;
        let order = store
            .place_order(draft(customer, vec![line(apples.id, 1)]))
            .await
            .unwrap();
        let id = order.id;

        let a = tokio::spawn({
            let store = Arc::clone(&store);
            async move {
                store
                    .append_status(&OrderRef::Id(id), OrderStatus::Processing, Utc::now())
                    .await
            }
        });
        let b = tokio::spawn({
            let store = Arc::clone(&store);
            async move {
                store
                    .append_status(&OrderRef::Id(id), OrderStatus::Shipped, Utc::now())
                    .await
            }
        });
        a.await.unwrap().unwrap();
        b.await.unwrap().unwrap();

        let order = store.order(&OrderRef::Id(id)).await.unwrap();
        assert_eq!(order.status_history.len(), 3);
        assert_eq!(order.status_history[0].status, OrderStatus::Pending);
        let appended: Vec<OrderStatus> = order.status_history[1..]
            .iter()
            .map(|entry| entry.status)
            .collect();
        assert!(appended.contains(&OrderStatus::Processing));
        assert!(appended.contains(&OrderStatus::Shipped));
        assert_eq!(
            order.current_status,
            order.status_history.last().unwrap().status
        );
    }

    #[tokio::test]
    async fn status_append_works_by_id_and_by_number() {
        let store = MemoryStore::new();
        let customer = Uuid::new_v4();
        let apples = seed_product(&store, "Apples", 100, 10).await;
        let order = store
            .place_order(draft(customer, vec![line(apples.id, 1)]))
            .await
            .unwrap();

        let by_number = OrderRef::Number(order.order_number.as_str().to_string());
        store
            .append_status(&by_number, OrderStatus::Shipped, Utc::now())
            .await
            .unwrap();
        let updated = store
            .append_status(&OrderRef::Id(order.id), OrderStatus::Delivered, Utc::now())
            .await
            .unwrap();

        assert_eq!(updated.current_status, OrderStatus::Delivered);
        assert_eq!(updated.status_history.len(), 3);
        assert_eq!(
            updated.status_history.last().unwrap().status,
            OrderStatus::Delivered
        );
    }

    #[tokio::test]
    async fn cancelled_orders_refuse_other_transitions_but_allow_recancel() {
        let store = MemoryStore::new();
        let customer = Uuid::new_v4();
        let apples = seed_product(&store, "Apples", 100, 10).await;
        let order = store
            .place_order(draft(customer, vec![line(apples.id, 1)]))
            .await
            .unwrap();
        let reference = OrderRef::Id(order.id);

        store
            .append_status(&reference, OrderStatus::Cancelled, Utc::now())
            .await
            .unwrap();
        let again = store
            .append_status(&reference, OrderStatus::Cancelled, Utc::now())
            .await
            .unwrap();
        assert_eq!(again.current_status, OrderStatus::Cancelled);

        let err = store
            .append_status(&reference, OrderStatus::Processing, Utc::now())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Conflict(_)));
    }

    #[tokio::test]
    async fn only_cancelled_orders_can_be_deleted() {
        let store = MemoryStore::new();
        let customer = Uuid::new_v4();
        let apples = seed_product(&store, "Apples", 100, 10).await;
        let order = store
            .place_order(draft(customer, vec![line(apples.id, 1)]))
            .await
            .unwrap();
        let reference = OrderRef::Id(order.id);

        let err = store.delete_order(&reference).await.unwrap_err();
        assert!(matches!(err, Error::Conflict(_)));

        store
            .append_status(&reference, OrderStatus::Cancelled, Utc::now())
            .await
            .unwrap();
        store.delete_order(&reference).await.unwrap();
        assert!(matches!(
            store.order(&reference).await.unwrap_err(),
            Error::NotFound("order")
        ));
    }

    #[tokio::test]
    async fn cart_upsert_accumulates_and_resolves_products() {
        let store = MemoryStore::new();
        let customer = Uuid::new_v4();
        let apples = seed_product(&store, "Apples", 100, 10).await;

        store.upsert_line(customer, apples.id, 2).await.unwrap();
        store.upsert_line(customer, apples.id, 3).await.unwrap();

        let entries = store.cart(customer).await.unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].quantity, 5);
        assert_eq!(entries[0].product.name, "Apples");

        let missing = Uuid::new_v4();
        assert!(matches!(
            store.upsert_line(customer, missing, 1).await.unwrap_err(),
            Error::NotFound("product")
        ));
    }

    #[tokio::test]
    async fn listing_filters_sorts_and_pages() {
        let store = MemoryStore::new();
        seed_product(&store, "Apples", 120, 10).await;
        seed_product(&store, "Bananas", 40, 10).await;
        seed_product(&store, "Almond Butter", 450, 3).await;

        let page = store
            .list_products(&ProductFilter {
                search: Some("a".into()),
                sort: SortKey::Price,
                order: SortOrder::Asc,
                ..ProductFilter::default()
            })
            .await
            .unwrap();
        assert_eq!(page.total, 3);
        assert_eq!(page.data[0].name, "Bananas");
        assert_eq!(page.data[2].name, "Almond Butter");

        let page = store
            .list_products(&ProductFilter {
                min_price: Some(Decimal::new(100, 0)),
                per_page: Some(1),
                page: Some(2),
                sort: SortKey::Name,
                order: SortOrder::Asc,
                ..ProductFilter::default()
            })
            .await
            .unwrap();
        assert_eq!(page.total, 2);
        assert_eq!(page.data.len(), 1);
        assert_eq!(page.data[0].name, "Apples");
        assert_eq!(page.page, 2);
    }

    #[tokio::test]
    async fn stock_adjustment_cannot_drop_below_zero() {
        let store = MemoryStore::new();
        let apples = seed_product(&store, "Apples", 100, 3).await;

        let patch = UpdateProduct {
            stock_delta: Some(-5),
            ..UpdateProduct::default()
        };
        let err = store
            .update_product(apples.id, &patch, Utc::now())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Conflict(_)));
        assert_eq!(store.product(apples.id).await.unwrap().stock, 3);

        let patch = UpdateProduct {
            stock_delta: Some(-3),
            ..UpdateProduct::default()
        };
        let updated = store
            .update_product(apples.id, &patch, Utc::now())
            .await
            .unwrap();
        assert_eq!(updated.stock, 0);
    }

    #[tokio::test]
    async fn aggregates_tolerate_an_empty_ledger() {
        let store = MemoryStore::new();
        assert_eq!(store.count_orders().await.unwrap(), 0);
        assert_eq!(store.delivered_revenue().await.unwrap(), Decimal::ZERO);
        assert!(store.recent_orders(5).await.unwrap().is_empty());
        let page = store.list_orders(1, 20).await.unwrap();
        assert_eq!(page.total, 0);
        assert!(page.data.is_empty());
    }

    #[tokio::test]
    async fn delivered_revenue_counts_only_delivered_orders() {
        let store = MemoryStore::new();
        let customer = Uuid::new_v4();
        store
            .upsert_customer(NewCustomer {
                id: customer,
                name: "Asha Rao".into(),
                email: "asha@example.com".into(),
                is_admin: false,
            })
            .await
            .unwrap();
        let apples = seed_product(&store, "Apples", 100, 10).await;

        let delivered = store
            .place_order(draft(customer, vec![line(apples.id, 2)]))
            .await
            .unwrap();
        store
            .place_order(draft(customer, vec![line(apples.id, 1)]))
            .await
            .unwrap();
        store
            .append_status(
                &OrderRef::Id(delivered.id),
                OrderStatus::Delivered,
                Utc::now(),
            )
            .await
            .unwrap();

        assert_eq!(store.delivered_revenue().await.unwrap(), Decimal::new(200, 0));
        let recent = store.recent_orders(5).await.unwrap();
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].customer_name.as_deref(), Some("Asha Rao"));
    }
}
