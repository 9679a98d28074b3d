//! Domain model: aggregates, directory entities and value objects.

pub mod aggregates;
pub mod customer;
pub mod settings;
pub mod value_objects;

pub use aggregates::{
    Cart, CartLine, LineItem, NewProduct, Order, OrderStatus, Product, ShippingAddress,
    StatusEntry, UpdateProduct,
};
pub use customer::{Customer, NewCustomer};
pub use settings::{SettingsPatch, StoreSettings};
pub use value_objects::{OrderNumber, PaymentMethod};
