//! Aggregates module
pub mod cart;
pub mod order;
pub mod product;

pub use cart::{Cart, CartError, CartLine};
pub use order::{LineItem, Order, OrderError, OrderStatus, ShippingAddress, StatusEntry};
pub use product::{NewProduct, Product, UpdateProduct};
