//! Cart operations.
//!
//! Quantities are only advisory until placement; nothing here reserves
//! stock. The guest-cart merge is best-effort per line and returns a report
//! so a client can surface rejected lines instead of losing them.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::store::{CartEntry, MAX_LINE_QUANTITY, Store};

/// Cart read model: resolved lines plus totals for display.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CartView {
    pub items: Vec<CartEntry>,
    pub subtotal: Decimal,
    pub total_units: u64,
}

/// One guest-held line submitted at login.
#[derive(Clone, Debug, Deserialize)]
pub struct GuestLine {
    pub product_id: Uuid,
    pub quantity: i64,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MergeOutcome {
    pub product_id: Uuid,
    pub quantity: i64,
    pub merged: bool,
    pub error: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MergeReport {
    pub results: Vec<MergeOutcome>,
    pub cart: CartView,
}

pub async fn view_cart(store: &dyn Store, customer_id: Uuid) -> Result<CartView> {
    let items = store.cart(customer_id).await?;
    Ok(summarize(items))
}

/// Adds `quantity` of a product, accumulating onto an existing line.
pub async fn add_item(
    store: &dyn Store,
    customer_id: Uuid,
    product_id: Uuid,
    quantity: i64,
) -> Result<CartView> {
    let quantity = positive_quantity(quantity)?;
    store.upsert_line(customer_id, product_id, quantity).await?;
    view_cart(store, customer_id).await
}

/// Zero removes the line (idempotently), negative is invalid, and a
/// positive quantity replaces the current one and requires the line to
/// exist.
pub async fn update_quantity(
    store: &dyn Store,
    customer_id: Uuid,
    product_id: Uuid,
    quantity: i64,
) -> Result<CartView> {
    if quantity < 0 {
        return Err(Error::validation("quantity cannot be negative"));
    }
    if quantity == 0 {
        store.remove_line(customer_id, product_id).await?;
    } else {
        let quantity = positive_quantity(quantity)?;
        store
            .set_line_quantity(customer_id, product_id, quantity)
            .await?;
    }
    view_cart(store, customer_id).await
}

pub async fn remove_item(
    store: &dyn Store,
    customer_id: Uuid,
    product_id: Uuid,
) -> Result<CartView> {
    store.remove_line(customer_id, product_id).await?;
    view_cart(store, customer_id).await
}

pub async fn clear(store: &dyn Store, customer_id: Uuid) -> Result<CartView> {
    store.clear_cart(customer_id).await?;
    view_cart(store, customer_id).await
}

/// Merges a guest cart into the customer's server cart line by line. A bad
/// line never blocks the rest; its error is recorded in the report.
pub async fn merge_guest_cart(
    store: &dyn Store,
    customer_id: Uuid,
    guest_lines: Vec<GuestLine>,
) -> Result<MergeReport> {
    let mut results = Vec::with_capacity(guest_lines.len());
    for line in guest_lines {
        let outcome = match positive_quantity(line.quantity) {
            Ok(quantity) => store.upsert_line(customer_id, line.product_id, quantity).await,
            Err(err) => Err(err),
        };
        if let Err(err) = &outcome {
            tracing::debug!(
                customer_id = %customer_id,
                product_id = %line.product_id,
                error = %err,
                "guest cart line skipped"
            );
        }
        results.push(MergeOutcome {
            product_id: line.product_id,
            quantity: line.quantity,
            merged: outcome.is_ok(),
            error: outcome.err().map(|err| err.to_string()),
        });
    }
    let cart = view_cart(store, customer_id).await?;
    Ok(MergeReport { results, cart })
}

fn summarize(items: Vec<CartEntry>) -> CartView {
    let subtotal = items
        .iter()
        .map(|entry| entry.product.price * Decimal::from(entry.quantity))
        .sum();
    let total_units = items.iter().map(|entry| u64::from(entry.quantity)).sum();
    CartView {
        items,
        subtotal,
        total_units,
    }
}

fn positive_quantity(quantity: i64) -> Result<u32> {
    u32::try_from(quantity)
        .ok()
        .filter(|q| (1..=MAX_LINE_QUANTITY).contains(q))
        .ok_or_else(|| {
            Error::validation(format!(
                "quantity must be between 1 and {MAX_LINE_QUANTITY}"
            ))
        })
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::domain::{NewProduct, Product};
    use crate::store::{CatalogStore, MemoryStore};

    async fn seed_product(store: &MemoryStore, name: &str, price: i64) -> Product {
        let product = Product::create(
            NewProduct {
                name: name.into(),
                description: String::new(),
                price: Decimal::new(price, 0),
                category: "Grocery".into(),
                stock: 50,
                image_url: None,
            },
            Utc::now(),
        );
        store.create_product(product).await.unwrap()
    }

    #[tokio::test]
    async fn adding_the_same_product_twice_accumulates() {
        let store = MemoryStore::new();
        let customer = Uuid::new_v4();
        let apples = seed_product(&store, "Apples", 100).await;

        add_item(&store, customer, apples.id, 2).await.unwrap();
        let view = add_item(&store, customer, apples.id, 3).await.unwrap();

        assert_eq!(view.items.len(), 1);
        assert_eq!(view.items[0].quantity, 5);
        assert_eq!(view.subtotal, Decimal::new(500, 0));
        assert_eq!(view.total_units, 5);
    }

    #[tokio::test]
    async fn add_rejects_non_positive_quantities_and_missing_products() {
        let store = MemoryStore::new();
        let customer = Uuid::new_v4();
        let apples = seed_product(&store, "Apples", 100).await;

        for quantity in [0, -1] {
            let err = add_item(&store, customer, apples.id, quantity)
                .await
                .unwrap_err();
            assert!(matches!(err, Error::Validation { .. }));
        }

        let err = add_item(&store, customer, Uuid::new_v4(), 1)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::NotFound("product")));
    }

    #[tokio::test]
    async fn quantities_past_the_cart_column_are_rejected() {
        let store = MemoryStore::new();
        let customer = Uuid::new_v4();
        let apples = seed_product(&store, "Apples", 100).await;

        let err = add_item(&store, customer, apples.id, 3_000_000_000)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Validation { .. }));

        add_item(&store, customer, apples.id, 1).await.unwrap();
        let err = update_quantity(&store, customer, apples.id, 3_000_000_000)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Validation { .. }));

        let view = view_cart(&store, customer).await.unwrap();
        assert_eq!(view.items[0].quantity, 1);
    }

    #[tokio::test]
    async fn zero_quantity_update_removes_and_is_idempotent() {
        let store = MemoryStore::new();
        let customer = Uuid::new_v4();
        let apples = seed_product(&store, "Apples", 100).await;
        add_item(&store, customer, apples.id, 2).await.unwrap();

        let view = update_quantity(&store, customer, apples.id, 0)
            .await
            .unwrap();
        assert!(view.items.is_empty());

        // Absent line: still a no-op success.
        let view = update_quantity(&store, customer, apples.id, 0)
            .await
            .unwrap();
        assert!(view.items.is_empty());
    }

    #[tokio::test]
    async fn update_rejects_negative_and_requires_the_line_for_positive() {
        let store = MemoryStore::new();
        let customer = Uuid::new_v4();
        let apples = seed_product(&store, "Apples", 100).await;

        let err = update_quantity(&store, customer, apples.id, -1)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Validation { .. }));

        let err = update_quantity(&store, customer, apples.id, 2)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::NotFound("cart item")));

        add_item(&store, customer, apples.id, 1).await.unwrap();
        let view = update_quantity(&store, customer, apples.id, 4)
            .await
            .unwrap();
        assert_eq!(view.items[0].quantity, 4);
    }

    #[tokio::test]
    async fn removing_an_absent_line_is_a_no_op() {
        let store = MemoryStore::new();
        let customer = Uuid::new_v4();
        let view = remove_item(&store, customer, Uuid::new_v4()).await.unwrap();
        assert!(view.items.is_empty());

        let view = clear(&store, customer).await.unwrap();
        assert!(view.items.is_empty());
    }

    #[tokio::test]
    async fn merge_reports_each_line_and_keeps_the_good_ones() {
        let store = MemoryStore::new();
        let customer = Uuid::new_v4();
        let apples = seed_product(&store, "Apples", 100).await;
        add_item(&store, customer, apples.id, 1).await.unwrap();

        let phantom = Uuid::new_v4();
        let report = merge_guest_cart(
            &store,
            customer,
            vec![
                GuestLine {
                    product_id: apples.id,
                    quantity: 2,
                },
                GuestLine {
                    product_id: phantom,
                    quantity: 1,
                },
                GuestLine {
                    product_id: apples.id,
                    quantity: 0,
                },
            ],
        )
        .await
        .unwrap();

        assert_eq!(report.results.len(), 3);
        assert!(report.results[0].merged);
        assert!(!report.results[1].merged);
        assert!(report.results[1].error.is_some());
        assert!(!report.results[2].merged);

        // Existing line 1 + merged guest line 2.
        assert_eq!(report.cart.items.len(), 1);
        assert_eq!(report.cart.items[0].quantity, 3);
    }

    #[tokio::test]
    async fn merge_of_an_empty_guest_cart_changes_nothing() {
        let store = MemoryStore::new();
        let customer = Uuid::new_v4();
        let apples = seed_product(&store, "Apples", 100).await;
        add_item(&store, customer, apples.id, 2).await.unwrap();

        let report = merge_guest_cart(&store, customer, Vec::new()).await.unwrap();
        assert!(report.results.is_empty());
        assert_eq!(report.cart.items[0].quantity, 2);
    }
}
