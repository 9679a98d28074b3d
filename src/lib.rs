//! FreshMart Grocery - Storefront Order and Inventory Service
//!
//! Backend for a grocery storefront: product catalog with stock tracking,
//! server-held carts, transactional order placement, an append-only order
//! status lifecycle and the admin views over all of it.
//!
//! ## Features
//! - Product catalog with filtered, paged listings
//! - Per-customer carts with guest-cart merge
//! - All-or-nothing order placement with conditional stock decrements
//! - Append-only status history with sticky cancellation
//! - Admin dashboard aggregates and storefront settings

pub mod domain;
pub mod error;
pub mod http;
pub mod service;
pub mod store;

pub use error::{Error, Result};
