//! Storefront configuration.
//!
//! A single persisted row, so delivery fee and tax survive restarts and are
//! shared across replicas.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

#[derive(Clone, Debug, Serialize, Deserialize, sqlx::FromRow)]
pub struct StoreSettings {
    pub store_name: String,
    pub support_email: String,
    pub delivery_fee: Decimal,
    pub tax_rate: Decimal,
    pub currency: String,
    pub currency_symbol: String,
    pub updated_at: DateTime<Utc>,
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self {
            store_name: "FreshMart".to_string(),
            support_email: "support@freshmart.example".to_string(),
            delivery_fee: Decimal::new(40, 0),
            tax_rate: Decimal::new(5, 0),
            currency: "INR".to_string(),
            currency_symbol: "₹".to_string(),
            updated_at: Utc::now(),
        }
    }
}

impl StoreSettings {
    /// Applies a patch; absent fields keep their current value.
    pub fn apply(&mut self, patch: &SettingsPatch, now: DateTime<Utc>) {
        if let Some(store_name) = &patch.store_name {
            self.store_name = store_name.clone();
        }
        if let Some(support_email) = &patch.support_email {
            self.support_email = support_email.clone();
        }
        if let Some(delivery_fee) = patch.delivery_fee {
            self.delivery_fee = delivery_fee;
        }
        if let Some(tax_rate) = patch.tax_rate {
            self.tax_rate = tax_rate;
        }
        if let Some(currency) = &patch.currency {
            self.currency = currency.clone();
        }
        if let Some(currency_symbol) = &patch.currency_symbol {
            self.currency_symbol = currency_symbol.clone();
        }
        self.updated_at = now;
    }
}

/// Partial settings update submitted by an admin.
#[derive(Clone, Debug, Default, Deserialize, Validate)]
pub struct SettingsPatch {
    #[validate(length(min = 1, max = 100))]
    pub store_name: Option<String>,
    #[validate(email)]
    pub support_email: Option<String>,
    #[validate(custom = "non_negative_fee")]
    pub delivery_fee: Option<Decimal>,
    #[validate(custom = "percentage")]
    pub tax_rate: Option<Decimal>,
    #[validate(length(equal = 3))]
    pub currency: Option<String>,
    #[validate(length(min = 1, max = 5))]
    pub currency_symbol: Option<String>,
}

fn non_negative_fee(fee: &Decimal) -> Result<(), ValidationError> {
    if fee.is_sign_negative() {
        return Err(ValidationError::new("delivery fee cannot be negative"));
    }
    Ok(())
}

fn percentage(rate: &Decimal) -> Result<(), ValidationError> {
    if rate.is_sign_negative() || *rate > Decimal::new(100, 0) {
        return Err(ValidationError::new("tax rate must be between 0 and 100"));
    }
    Ok(())
}
