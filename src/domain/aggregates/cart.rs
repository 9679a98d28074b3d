//! Cart aggregate.
//!
//! Holds the unresolved lines (product reference plus quantity); product
//! details are resolved by the store at read time. Adding never checks
//! stock; stock is authoritative only at placement.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    pub product_id: Uuid,
    pub quantity: u32,
}

#[derive(Clone, Debug)]
pub struct Cart {
    customer_id: Uuid,
    lines: Vec<CartLine>,
}

impl Cart {
    pub fn for_customer(customer_id: Uuid) -> Self {
        Self {
            customer_id,
            lines: vec![],
        }
    }

    pub fn customer_id(&self) -> Uuid {
        self.customer_id
    }

    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn total_units(&self) -> u64 {
        self.lines.iter().map(|l| u64::from(l.quantity)).sum()
    }

    /// Adds a line, accumulating the quantity when the product is already
    /// present.
    pub fn add(&mut self, product_id: Uuid, quantity: u32) -> Result<(), CartError> {
        if quantity == 0 {
            return Err(CartError::ZeroQuantity);
        }
        if let Some(line) = self.lines.iter_mut().find(|l| l.product_id == product_id) {
            line.quantity = line.quantity.saturating_add(quantity);
        } else {
            self.lines.push(CartLine {
                product_id,
                quantity,
            });
        }
        Ok(())
    }

    /// Sets a line's quantity. Zero removes the line and is a no-op when the
    /// line is already gone; a positive quantity on an absent line is an
    /// error.
    pub fn set_quantity(&mut self, product_id: Uuid, quantity: u32) -> Result<(), CartError> {
        if quantity == 0 {
            self.remove(product_id);
            return Ok(());
        }
        let line = self
            .lines
            .iter_mut()
            .find(|l| l.product_id == product_id)
            .ok_or(CartError::ItemNotFound)?;
        line.quantity = quantity;
        Ok(())
    }

    pub fn remove(&mut self, product_id: Uuid) {
        self.lines.retain(|l| l.product_id != product_id);
    }

    pub fn clear(&mut self) {
        self.lines.clear();
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CartError {
    ItemNotFound,
    ZeroQuantity,
}

impl std::error::Error for CartError {}
impl std::fmt::Display for CartError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ItemNotFound => write!(f, "item not found in cart"),
            Self::ZeroQuantity => write!(f, "quantity must be at least 1"),
        }
    }
}

impl From<CartError> for crate::error::Error {
    fn from(err: CartError) -> Self {
        match err {
            CartError::ItemNotFound => Self::NotFound("cart item"),
            CartError::ZeroQuantity => Self::validation("quantity must be at least 1"),
        }
    }
}
