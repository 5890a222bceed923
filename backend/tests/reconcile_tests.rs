//! Stock reconciliation engine tests
//!
//! Exercises the engine's write discipline against an in-memory ledger that
//! honors the same conditional-update contract as the database:
//! - a no-op reconcile writes nothing
//! - quantities never go negative
//! - concurrent edits are detected and skipped, never overwritten
//! - every applied change produces exactly one audit record
//! - losses are valued at units lost times the selling price

use std::collections::HashMap;

use proptest::prelude::*;
use rust_decimal::Decimal;
use std::str::FromStr;
use uuid::Uuid;

use shared::reconcile::{loss_value, stock_deltas, StockDelta};
use shared::validation::clamp_quantity;

fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

fn id(n: u128) -> Uuid {
    Uuid::from_u128(n)
}

/// One audit record, mirroring what the engine inserts per applied delta
#[derive(Debug, Clone, PartialEq)]
struct AuditRecord {
    business_id: Uuid,
    old_quantity: i32,
    new_quantity: i32,
    reason: &'static str,
    lost_cash: Option<Decimal>,
}

/// In-memory stand-in for the stock ledger. Writes go through the same
/// conditional-update contract the engine uses against the database.
#[derive(Debug, Default)]
struct Ledger {
    rows: HashMap<Uuid, i32>,
    audit: Vec<AuditRecord>,
}

impl Ledger {
    fn with_rows(rows: &[(Uuid, i32)]) -> Self {
        Ledger {
            rows: rows.iter().copied().collect(),
            audit: Vec::new(),
        }
    }

    /// Write `target` only if the stored quantity still equals `expected`.
    /// An absent row behaves like the insert path: it succeeds when the
    /// expectation is that nothing was there.
    fn conditional_write(&mut self, business_id: Uuid, expected: i32, target: i32) -> bool {
        match self.rows.get_mut(&business_id) {
            Some(quantity) if *quantity == expected => {
                *quantity = target;
                true
            }
            Some(_) => false,
            None if expected == 0 => {
                self.rows.insert(business_id, target);
                true
            }
            None => false,
        }
    }

    /// Drive the engine's per-location loop over a delta set
    fn apply(
        &mut self,
        deltas: &[StockDelta],
        loss_locations: &[Uuid],
        selling_price: Decimal,
    ) -> (Vec<StockDelta>, Vec<StockDelta>) {
        self.try_apply(deltas, loss_locations, selling_price, None)
            .unwrap()
    }

    /// Same loop, but the write for `fail_at` raises a hard storage error.
    /// Mirrors the engine's behavior: the error aborts the remaining
    /// locations while everything already written stays written.
    fn try_apply(
        &mut self,
        deltas: &[StockDelta],
        loss_locations: &[Uuid],
        selling_price: Decimal,
        fail_at: Option<Uuid>,
    ) -> Result<(Vec<StockDelta>, Vec<StockDelta>), &'static str> {
        let mut applied = Vec::new();
        let mut conflicted = Vec::new();

        for delta in deltas {
            if fail_at == Some(delta.business_id) {
                return Err("storage failure");
            }

            let is_loss = loss_locations.contains(&delta.business_id);
            // Row absent at write time means the expectation falls back to
            // zero, matching the engine's insert-then-retry path. The
            // expectation is also what audit records report as the old
            // quantity: the value actually overwritten.
            let expected = if self.rows.contains_key(&delta.business_id) {
                delta.old_quantity
            } else {
                0
            };

            if self.conditional_write(delta.business_id, expected, delta.new_quantity) {
                self.audit.push(AuditRecord {
                    business_id: delta.business_id,
                    old_quantity: expected,
                    new_quantity: delta.new_quantity,
                    reason: if is_loss { "loss" } else { "correction" },
                    lost_cash: if is_loss && expected > delta.new_quantity {
                        Some(loss_value(expected - delta.new_quantity, selling_price))
                    } else {
                        None
                    },
                });
                applied.push(StockDelta {
                    business_id: delta.business_id,
                    old_quantity: expected,
                    new_quantity: delta.new_quantity,
                });
            } else {
                conflicted.push(delta.clone());
            }
        }

        Ok((applied, conflicted))
    }
}

// ============================================================================
// Unit Tests
// ============================================================================

mod unit_tests {
    use super::*;

    /// A reconcile where desired matches the snapshot writes nothing
    #[test]
    fn test_noop_reconcile_writes_nothing() {
        let mut ledger = Ledger::with_rows(&[(id(1), 10), (id(2), 3)]);
        let desired = HashMap::from([(id(1), 10), (id(2), 3)]);
        let snapshot = HashMap::from([(id(1), 10), (id(2), 3)]);

        let deltas = stock_deltas(&desired, &snapshot);
        let (applied, conflicted) = ledger.apply(&deltas, &[], dec("10"));

        assert!(applied.is_empty());
        assert!(conflicted.is_empty());
        assert!(ledger.audit.is_empty());
        assert_eq!(ledger.rows[&id(1)], 10);
        assert_eq!(ledger.rows[&id(2)], 3);
    }

    /// A fresh-snapshot reconcile applies every delta
    #[test]
    fn test_fresh_snapshot_applies_all() {
        let mut ledger = Ledger::with_rows(&[(id(1), 10), (id(2), 3)]);
        let desired = HashMap::from([(id(1), 15), (id(2), 0)]);
        let snapshot = HashMap::from([(id(1), 10), (id(2), 3)]);

        let deltas = stock_deltas(&desired, &snapshot);
        let (applied, conflicted) = ledger.apply(&deltas, &[], dec("10"));

        assert_eq!(applied.len(), 2);
        assert!(conflicted.is_empty());
        assert_eq!(ledger.rows[&id(1)], 15);
        assert_eq!(ledger.rows[&id(2)], 0);
    }

    /// A concurrent edit between snapshot and write is skipped, not clobbered
    #[test]
    fn test_concurrent_edit_is_detected_and_skipped() {
        // Snapshot saw 10, but another actor already moved it to 12
        let mut ledger = Ledger::with_rows(&[(id(1), 12)]);
        let desired = HashMap::from([(id(1), 15)]);
        let snapshot = HashMap::from([(id(1), 10)]);

        let deltas = stock_deltas(&desired, &snapshot);
        let (applied, conflicted) = ledger.apply(&deltas, &[], dec("10"));

        assert!(applied.is_empty());
        assert_eq!(conflicted.len(), 1);
        // The concurrent writer's value survives
        assert_eq!(ledger.rows[&id(1)], 12);
        // Conflicted writes are never logged
        assert!(ledger.audit.is_empty());
    }

    /// One conflicted location does not block the others
    #[test]
    fn test_conflict_is_per_location() {
        let mut ledger = Ledger::with_rows(&[(id(1), 99), (id(2), 3)]);
        let desired = HashMap::from([(id(1), 15), (id(2), 8)]);
        let snapshot = HashMap::from([(id(1), 10), (id(2), 3)]);

        let deltas = stock_deltas(&desired, &snapshot);
        let (applied, conflicted) = ledger.apply(&deltas, &[], dec("10"));

        assert_eq!(applied.len(), 1);
        assert_eq!(applied[0].business_id, id(2));
        assert_eq!(conflicted.len(), 1);
        assert_eq!(conflicted[0].business_id, id(1));
        assert_eq!(ledger.rows[&id(1)], 99);
        assert_eq!(ledger.rows[&id(2)], 8);
    }

    /// A location with no ledger row yet is created at the target quantity
    #[test]
    fn test_absent_row_is_created() {
        let mut ledger = Ledger::default();
        let desired = HashMap::from([(id(1), 7)]);
        let snapshot = HashMap::new();

        let deltas = stock_deltas(&desired, &snapshot);
        let (applied, conflicted) = ledger.apply(&deltas, &[], dec("10"));

        assert_eq!(applied.len(), 1);
        assert!(conflicted.is_empty());
        assert_eq!(ledger.rows[&id(1)], 7);
    }

    /// A hard failure mid-loop aborts the remaining locations, but writes
    /// already applied stay applied with their audit records. Nothing is
    /// rolled back.
    #[test]
    fn test_hard_failure_mid_loop_keeps_earlier_writes() {
        let mut ledger = Ledger::with_rows(&[(id(1), 10), (id(2), 3), (id(3), 5)]);
        let desired = HashMap::from([(id(1), 15), (id(2), 8), (id(3), 9)]);
        let snapshot = HashMap::from([(id(1), 10), (id(2), 3), (id(3), 5)]);

        // Deltas are ordered by location id, so id(1) is written first
        let deltas = stock_deltas(&desired, &snapshot);
        let result = ledger.try_apply(&deltas, &[], dec("10"), Some(id(2)));

        assert!(result.is_err());
        assert_eq!(ledger.rows[&id(1)], 15);
        assert_eq!(ledger.audit.len(), 1);
        assert_eq!(ledger.audit[0].business_id, id(1));
        // The failed location and everything after it are untouched
        assert_eq!(ledger.rows[&id(2)], 3);
        assert_eq!(ledger.rows[&id(3)], 5);
    }

    /// The audit old quantity is what the write actually overwrote: a row
    /// the snapshot saw but that has since disappeared is recreated from
    /// zero, and zero is what gets logged
    #[test]
    fn test_recreated_row_logs_stored_old_quantity() {
        let mut ledger = Ledger::default();
        let desired = HashMap::from([(id(1), 4)]);
        // Stale snapshot: the caller saw 10 before the row went away
        let snapshot = HashMap::from([(id(1), 10)]);

        let deltas = stock_deltas(&desired, &snapshot);
        let (applied, conflicted) = ledger.apply(&deltas, &[], dec("10"));

        assert!(conflicted.is_empty());
        assert_eq!(applied[0].old_quantity, 0);
        assert_eq!(ledger.audit[0].old_quantity, 0);
        assert_eq!(ledger.audit[0].new_quantity, 4);
        assert_eq!(ledger.rows[&id(1)], 4);
    }

    /// Negative targets are clamped to zero rather than rejected
    #[test]
    fn test_negative_target_clamps_to_zero() {
        let mut ledger = Ledger::with_rows(&[(id(1), 4)]);
        let desired = HashMap::from([(id(1), -10)]);
        let snapshot = HashMap::from([(id(1), 4)]);

        let deltas = stock_deltas(&desired, &snapshot);
        let (applied, _) = ledger.apply(&deltas, &[], dec("10"));

        assert_eq!(applied.len(), 1);
        assert_eq!(ledger.rows[&id(1)], 0);
    }

    /// Every applied change has exactly one audit record with matching
    /// old/new values
    #[test]
    fn test_audit_completeness() {
        let mut ledger = Ledger::with_rows(&[(id(1), 10), (id(2), 3), (id(3), 5)]);
        let desired = HashMap::from([(id(1), 12), (id(2), 0), (id(3), 5)]);
        let snapshot = HashMap::from([(id(1), 10), (id(2), 3), (id(3), 5)]);

        let deltas = stock_deltas(&desired, &snapshot);
        let (applied, _) = ledger.apply(&deltas, &[], dec("10"));

        assert_eq!(ledger.audit.len(), applied.len());
        for change in &applied {
            let records: Vec<_> = ledger
                .audit
                .iter()
                .filter(|r| r.business_id == change.business_id)
                .collect();
            assert_eq!(records.len(), 1);
            assert_eq!(records[0].old_quantity, change.old_quantity);
            assert_eq!(records[0].new_quantity, change.new_quantity);
        }
    }

    /// A loss-tagged decrement is valued at units lost times selling price
    #[test]
    fn test_loss_accounting() {
        let mut ledger = Ledger::with_rows(&[(id(1), 10)]);
        let desired = HashMap::from([(id(1), 6)]);
        let snapshot = HashMap::from([(id(1), 10)]);

        let deltas = stock_deltas(&desired, &snapshot);
        let (_, _) = ledger.apply(&deltas, &[id(1)], dec("15.50"));

        assert_eq!(ledger.audit.len(), 1);
        assert_eq!(ledger.audit[0].reason, "loss");
        assert_eq!(ledger.audit[0].lost_cash, Some(dec("62.00")));
    }

    /// Correction-tagged changes carry no loss value
    #[test]
    fn test_correction_has_no_loss_value() {
        let mut ledger = Ledger::with_rows(&[(id(1), 10)]);
        let desired = HashMap::from([(id(1), 6)]);
        let snapshot = HashMap::from([(id(1), 10)]);

        let deltas = stock_deltas(&desired, &snapshot);
        let (_, _) = ledger.apply(&deltas, &[], dec("15.50"));

        assert_eq!(ledger.audit[0].reason, "correction");
        assert_eq!(ledger.audit[0].lost_cash, None);
    }

    /// Quick adjustments clamp at zero when the decrement exceeds the stock
    #[test]
    fn test_quick_adjust_clamps_at_zero() {
        let observed = 3;
        let new_quantity = clamp_quantity(observed + (-10));
        assert_eq!(new_quantity, 0);

        // The loss is the actual decrease, not the requested one
        assert_eq!(loss_value(observed - new_quantity, dec("2.00")), dec("6.00"));
    }
}

// ============================================================================
// Property Tests
// ============================================================================

proptest! {
    /// Applying deltas from a fresh snapshot always lands the ledger on the
    /// clamped desired quantities, with no conflicts.
    #[test]
    fn prop_fresh_snapshot_converges(
        targets in proptest::collection::hash_map(1u128..20, -50i32..200, 0..10),
        initial in proptest::collection::hash_map(1u128..20, 0i32..200, 0..10),
    ) {
        let initial: HashMap<Uuid, i32> =
            initial.into_iter().map(|(k, v)| (id(k), v)).collect();
        let desired: HashMap<Uuid, i32> =
            targets.into_iter().map(|(k, v)| (id(k), v)).collect();
        let rows: Vec<(Uuid, i32)> = initial.iter().map(|(&k, &v)| (k, v)).collect();

        let mut ledger = Ledger::with_rows(&rows);
        // Snapshot matches storage exactly
        let deltas = stock_deltas(&desired, &initial);
        let (applied, conflicted) = ledger.apply(&deltas, &[], dec("10"));

        prop_assert!(conflicted.is_empty());
        prop_assert_eq!(applied.len(), deltas.len());
        for (business_id, target) in &desired {
            let expected = clamp_quantity(*target);
            let stored = ledger.rows.get(business_id).copied()
                .unwrap_or_else(|| initial.get(business_id).copied().unwrap_or(0));
            prop_assert_eq!(stored, expected);
        }
    }

    /// Quantities never go negative, whatever the targets
    #[test]
    fn prop_quantities_never_negative(
        targets in proptest::collection::hash_map(1u128..20, -500i32..500, 0..10),
        initial in proptest::collection::hash_map(1u128..20, 0i32..200, 0..10),
    ) {
        let initial: HashMap<Uuid, i32> =
            initial.into_iter().map(|(k, v)| (id(k), v)).collect();
        let desired: HashMap<Uuid, i32> =
            targets.into_iter().map(|(k, v)| (id(k), v)).collect();
        let rows: Vec<(Uuid, i32)> = initial.iter().map(|(&k, &v)| (k, v)).collect();

        let mut ledger = Ledger::with_rows(&rows);
        let deltas = stock_deltas(&desired, &initial);
        ledger.apply(&deltas, &[], dec("10"));

        for quantity in ledger.rows.values() {
            prop_assert!(*quantity >= 0);
        }
    }

    /// A stale snapshot never overwrites a concurrent edit: for every
    /// location where storage diverged from the snapshot, the stored value
    /// survives and the delta is reported as conflicted.
    #[test]
    fn prop_stale_snapshot_never_clobbers(
        target in -50i32..200,
        snapshot_qty in 0i32..100,
        stored_qty in 0i32..100,
    ) {
        prop_assume!(snapshot_qty != stored_qty);

        let mut ledger = Ledger::with_rows(&[(id(1), stored_qty)]);
        let desired = HashMap::from([(id(1), target)]);
        let snapshot = HashMap::from([(id(1), snapshot_qty)]);

        let deltas = stock_deltas(&desired, &snapshot);
        let (applied, conflicted) = ledger.apply(&deltas, &[], dec("10"));

        if deltas.is_empty() {
            // Target matched the snapshot, nothing attempted
            prop_assert_eq!(ledger.rows[&id(1)], stored_qty);
        } else {
            prop_assert!(applied.is_empty());
            prop_assert_eq!(conflicted.len(), 1);
            prop_assert_eq!(ledger.rows[&id(1)], stored_qty);
            prop_assert!(ledger.audit.is_empty());
        }
    }

    /// Audit count always equals applied count
    #[test]
    fn prop_one_audit_record_per_applied_change(
        targets in proptest::collection::hash_map(1u128..20, -50i32..200, 0..10),
        initial in proptest::collection::hash_map(1u128..20, 0i32..200, 0..10),
        drift in proptest::collection::hash_map(1u128..20, 0i32..200, 0..5),
    ) {
        let snapshot: HashMap<Uuid, i32> =
            initial.iter().map(|(&k, &v)| (id(k), v)).collect();
        let desired: HashMap<Uuid, i32> =
            targets.into_iter().map(|(k, v)| (id(k), v)).collect();

        // Storage starts at the snapshot, then some locations drift
        let mut rows: HashMap<Uuid, i32> = snapshot.clone();
        for (k, v) in drift {
            rows.insert(id(k), v);
        }
        let rows: Vec<(Uuid, i32)> = rows.into_iter().collect();

        let mut ledger = Ledger::with_rows(&rows);
        let deltas = stock_deltas(&desired, &snapshot);
        let (applied, conflicted) = ledger.apply(&deltas, &[], dec("10"));

        prop_assert_eq!(ledger.audit.len(), applied.len());
        prop_assert_eq!(applied.len() + conflicted.len(), deltas.len());
    }

    /// Loss value is linear in the units lost
    #[test]
    fn prop_loss_value_is_units_times_price(
        units in 0i32..10_000,
        price_cents in 0i64..1_000_000,
    ) {
        let price = Decimal::new(price_cents, 2);
        let expected = Decimal::from(units) * price;
        prop_assert_eq!(loss_value(units, price), expected);
    }
}
