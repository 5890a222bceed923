//! Domain models for the POS Inventory Platform

mod activity;
mod business;
mod product;
mod stock;
mod user;

pub use activity::*;
pub use business::*;
pub use product::*;
pub use stock::*;
pub use user::*;
