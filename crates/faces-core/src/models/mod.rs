//! Data models for Faces API entities.
//!
//! - `User`: the authenticated account
//! - `Product`, `ImageRef`: the recommended product and its pictures
//! - `CreateOrderRequest`, `CreatedOrder`, `OrderReceipt`: the two-phase purchase

pub mod order;
pub mod product;
pub mod user;

pub use order::{CreateOrderRequest, CreatedOrder, OrderReceipt};
pub use product::{ImageRef, Product};
pub use user::User;
