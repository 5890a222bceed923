//! Activity log (audit trail) models

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Why a stock quantity changed.
///
/// Only decrements may be tagged `Loss`; increments are always `Creation` or
/// `Correction`. The classification is a human judgment supplied by the
/// caller at entry time, never inferred by the engine.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ActivityReason {
    Creation,
    Correction,
    Loss,
}

impl ActivityReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActivityReason::Creation => "creation",
            ActivityReason::Correction => "correction",
            ActivityReason::Loss => "loss",
        }
    }

    pub fn from_str(s: &str) -> Option<ActivityReason> {
        match s {
            "creation" => Some(ActivityReason::Creation),
            "correction" => Some(ActivityReason::Correction),
            "loss" => Some(ActivityReason::Loss),
            _ => None,
        }
    }
}

/// An append-only audit record of a catalog or stock change
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivityLogEntry {
    pub id: Uuid,
    /// Null for catalog entries, which carry no location
    pub business_id: Option<Uuid>,
    /// Null when the product has since been deleted, or for entries that do
    /// not concern a single product
    pub product_id: Option<Uuid>,
    /// Human-readable summary embedding actor, product, location and the
    /// old/new quantities
    pub details: String,
    pub reason: ActivityReason,
    /// Monetary loss estimate; populated only for Loss-reasoned decrements
    pub lost_cash: Option<Decimal>,
    pub created_at: DateTime<Utc>,
}
