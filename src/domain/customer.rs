//! Customer directory records.
//!
//! Identities are provisioned by the auth service; this crate reads them for
//! ownership checks, admin gating and dashboard counts, and exposes the
//! upsert the collaborator writes through.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

#[derive(Clone, Debug, Serialize, Deserialize, sqlx::FromRow)]
pub struct Customer {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub is_admin: bool,
    pub created_at: DateTime<Utc>,
}

/// Upsert input for the auth collaborator.
#[derive(Clone, Debug, Deserialize, Validate)]
pub struct NewCustomer {
    pub id: Uuid,
    #[validate(length(min = 1))]
    pub name: String,
    #[validate(email)]
    pub email: String,
    #[serde(default)]
    pub is_admin: bool,
}

impl NewCustomer {
    pub fn into_customer(self, now: DateTime<Utc>) -> Customer {
        Customer {
            id: self.id,
            name: self.name,
            email: self.email,
            is_admin: self.is_admin,
            created_at: now,
        }
    }
}
