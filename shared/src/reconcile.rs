//! Pure core of the stock reconciliation engine
//!
//! The backend drives the storage loop; everything that can be computed
//! without I/O lives here: which locations changed, how conflicts are
//! reported, and how a loss is valued.

use std::collections::HashMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::validation::clamp_quantity;

/// A detected difference between the desired stock and the snapshot taken
/// when the draft was opened
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StockDelta {
    pub business_id: Uuid,
    /// Quantity the caller last observed for this location
    pub old_quantity: i32,
    /// Requested target, already clamped to be non-negative
    pub new_quantity: i32,
}

/// Compute the changed-location set.
///
/// Locations absent from `desired` are never touched. A location missing
/// from the snapshot is assumed to have been observed at zero. Targets are
/// clamped to zero, and locations whose clamped target equals the observed
/// quantity are dropped. The result is sorted by location id so the write
/// loop is deterministic.
pub fn stock_deltas(
    desired: &HashMap<Uuid, i32>,
    snapshot: &HashMap<Uuid, i32>,
) -> Vec<StockDelta> {
    let mut deltas: Vec<StockDelta> = desired
        .iter()
        .filter_map(|(&business_id, &target)| {
            let old_quantity = snapshot.get(&business_id).copied().unwrap_or(0);
            let new_quantity = clamp_quantity(target);
            if new_quantity != old_quantity {
                Some(StockDelta {
                    business_id,
                    old_quantity,
                    new_quantity,
                })
            } else {
                None
            }
        })
        .collect();
    deltas.sort_by_key(|d| d.business_id);
    deltas
}

/// Monetary value of a loss: units lost times the current selling price
pub fn loss_value(quantity_decreased: i32, selling_price: Decimal) -> Decimal {
    Decimal::from(quantity_decreased) * selling_price
}

/// A stock change that was persisted
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppliedChange {
    pub business_id: Uuid,
    pub business_name: String,
    pub old_quantity: i32,
    pub new_quantity: i32,
}

/// A stock change that was rejected because the stored quantity no longer
/// matched the caller's snapshot
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConflictedChange {
    pub business_id: Uuid,
    pub business_name: String,
    /// Quantity the caller's snapshot expected to find
    pub expected_quantity: i32,
    /// Target that was discarded
    pub target_quantity: i32,
}

/// Result of a reconcile call: which locations were written and which were
/// skipped due to concurrent edits. Conflicts are terminal for the
/// invocation; the caller refreshes its view and re-edits.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReconcileOutcome {
    pub product_id: Uuid,
    pub applied: Vec<AppliedChange>,
    pub conflicted: Vec<ConflictedChange>,
}

impl ReconcileOutcome {
    pub fn has_conflicts(&self) -> bool {
        !self.conflicted.is_empty()
    }

    /// Location names for the conflict warning shown to the actor
    pub fn conflicted_names(&self) -> Vec<&str> {
        self.conflicted
            .iter()
            .map(|c| c.business_name.as_str())
            .collect()
    }
}
