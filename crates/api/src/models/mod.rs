//! Domain types for the settlement service.
//!
//! These are validated domain objects separate from database row types;
//! row-to-domain conversion lives in the `db` module.

pub mod order;
pub mod product;
pub mod user;

pub use order::{NewOrder, NewOrderItem, Order, OrderLineView, OrderView};
pub use product::{NewProduct, Product, ProductFilter};
pub use user::User;
