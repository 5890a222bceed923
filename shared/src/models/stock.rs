//! Stock ledger models
//!
//! The ledger holds one row per (product, location) pair. Quantities are
//! integers and never go negative; decrements are clamped at zero.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A stock ledger row for one product at one location
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StockLedgerEntry {
    pub id: Uuid,
    pub product_id: Uuid,
    pub business_id: Uuid,
    pub quantity: i32,
    pub updated_at: DateTime<Utc>,
}

/// Stock quantity at a named location, as surfaced to callers
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StockLevel {
    pub business_id: Uuid,
    pub business_name: String,
    pub quantity: i32,
}
