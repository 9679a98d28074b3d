//! Catalog product entity.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// A catalog entry. Stock is only ever mutated through conditional updates,
/// so it can never be observed negative.
#[derive(Clone, Debug, Serialize, Deserialize, sqlx::FromRow)]
pub struct Product {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub price: Decimal,
    pub category: String,
    pub stock: i32,
    pub image_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    pub fn create(new: NewProduct, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::now_v7(),
            name: new.name,
            description: new.description,
            price: new.price,
            category: new.category,
            stock: new.stock,
            image_url: new.image_url,
            created_at: now,
            updated_at: now,
        }
    }

    /// Last-writer-wins for everything except stock, which only moves through
    /// the store's conditional adjustment.
    pub fn apply(&mut self, patch: &UpdateProduct, now: DateTime<Utc>) {
        if let Some(name) = &patch.name {
            self.name = name.clone();
        }
        if let Some(description) = &patch.description {
            self.description = description.clone();
        }
        if let Some(price) = patch.price {
            self.price = price;
        }
        if let Some(category) = &patch.category {
            self.category = category.clone();
        }
        if let Some(image_url) = &patch.image_url {
            self.image_url = Some(image_url.clone());
        }
        self.updated_at = now;
    }

    pub fn is_in_stock(&self) -> bool {
        self.stock > 0
    }

    pub fn can_fulfill(&self, quantity: u32) -> bool {
        i64::from(self.stock) >= i64::from(quantity)
    }
}

/// Admin input for creating a product.
#[derive(Clone, Debug, Deserialize, Validate)]
pub struct NewProduct {
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    #[serde(default)]
    #[validate(length(max = 1000))]
    pub description: String,
    #[validate(custom = "non_negative_price")]
    pub price: Decimal,
    #[validate(length(min = 1))]
    pub category: String,
    #[serde(default)]
    #[validate(range(min = 0))]
    pub stock: i32,
    pub image_url: Option<String>,
}

/// Admin input for editing a product. Absent fields stay untouched; stock is
/// adjusted relatively so concurrent sale decrements are never erased.
#[derive(Clone, Debug, Default, Deserialize, Validate)]
pub struct UpdateProduct {
    #[validate(length(min = 1, max = 100))]
    pub name: Option<String>,
    #[validate(length(max = 1000))]
    pub description: Option<String>,
    #[validate(custom = "non_negative_price")]
    pub price: Option<Decimal>,
    #[validate(length(min = 1))]
    pub category: Option<String>,
    pub image_url: Option<String>,
    pub stock_delta: Option<i32>,
}

fn non_negative_price(price: &Decimal) -> Result<(), validator::ValidationError> {
    if price.is_sign_negative() {
        return Err(validator::ValidationError::new("negative_price"));
    }
    Ok(())
}
