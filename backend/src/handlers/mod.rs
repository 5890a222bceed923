//! HTTP request handlers

pub mod activity;
pub mod auth;
pub mod businesses;
pub mod health;
pub mod products;
pub mod reports;
pub mod stock;

pub use activity::*;
pub use auth::*;
pub use businesses::*;
pub use health::*;
pub use products::*;
pub use reports::*;
pub use stock::*;
