//! Shared types and models for the POS Inventory Platform
//!
//! This crate contains types shared between the backend and other components
//! of the system, plus the pure (storage-free) core of the stock
//! reconciliation engine.

pub mod models;
pub mod reconcile;
pub mod types;
pub mod validation;

pub use models::*;
pub use reconcile::*;
pub use types::*;
pub use validation::*;
