//! Application services: the storefront operations behind the HTTP surface.

pub mod admin;
pub mod carts;
pub mod lifecycle;
pub mod placement;
