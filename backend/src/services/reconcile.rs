//! Stock reconciliation engine
//!
//! Persists a product draft's master fields, then applies only the stock
//! deltas that changed against the caller's snapshot, location by location,
//! using conditional updates as the optimistic-concurrency guard. Every
//! applied delta is recorded in the activity log; conflicted deltas are
//! reported back and never written or logged.
//!
//! The per-location loop is sequential on purpose: conflict detection for
//! one location must not race the read for another, and partial-failure
//! reporting must be able to say exactly which locations were written. A
//! hard failure mid-loop aborts the remaining locations but does not roll
//! back earlier ones; ledger rows are independently valid, so the engine
//! applies what it can and reports the rest.

use std::collections::HashMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use shared::models::{ActivityReason, ProductDraft};
use shared::reconcile::{
    loss_value, stock_deltas, AppliedChange, ConflictedChange, ReconcileOutcome, StockDelta,
};
use shared::validation::{clamp_quantity, validate_product_draft};

use super::GENERIC_ACTOR;
use crate::error::{AppError, AppResult};

/// Stock reconciliation service
#[derive(Clone)]
pub struct ReconcileService {
    db: PgPool,
}

/// Input for a full reconcile: the draft's master fields plus the desired
/// and previously-observed stock per location
#[derive(Debug, Deserialize)]
pub struct ReconcileInput {
    pub draft: ProductDraft,
    /// Target quantity per location; omitted locations are never touched
    #[serde(default)]
    pub desired_stock: HashMap<Uuid, i32>,
    /// Quantity per location the caller observed when the draft was opened
    #[serde(default)]
    pub prior_snapshot: HashMap<Uuid, i32>,
    /// Locations whose decrement should be recorded as a loss
    #[serde(default)]
    pub loss_locations: Vec<Uuid>,
}

/// Input for a single-location "+stock / -stock" shortcut adjustment
#[derive(Debug, Deserialize)]
pub struct QuickAdjustInput {
    pub product_id: Uuid,
    pub business_id: Uuid,
    /// Signed quantity change; the resulting quantity is clamped at zero
    pub delta: i32,
    pub reason: ActivityReason,
}

/// A persisted stock write: the quantity the conditional write actually
/// overwrote and the loss recorded alongside it
struct AppliedWrite {
    old_quantity: i32,
    lost_cash: Option<Decimal>,
}

/// Result of a quick adjustment
#[derive(Debug, Serialize)]
pub struct QuickAdjustOutcome {
    pub product_id: Uuid,
    pub business_id: Uuid,
    pub business_name: String,
    pub old_quantity: i32,
    pub new_quantity: i32,
    pub applied: bool,
    pub conflicted: bool,
    pub lost_cash: Option<Decimal>,
}

impl ReconcileService {
    /// Create a new ReconcileService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Persist a product draft and apply its stock deltas.
    ///
    /// The master write is a hard precondition: if it fails, no ledger write
    /// is attempted. Conflicted locations are reported, not retried.
    pub async fn reconcile(
        &self,
        actor: Option<&str>,
        input: ReconcileInput,
    ) -> AppResult<ReconcileOutcome> {
        validate_product_draft(&input.draft).map_err(|msg| AppError::Validation {
            field: "draft".to_string(),
            message: msg.to_string(),
            message_es: "Los datos del producto no son válidos".to_string(),
        })?;

        let deltas = stock_deltas(&input.desired_stock, &input.prior_snapshot);
        validate_loss_tags(&deltas, &input.loss_locations).map_err(|msg| {
            AppError::Validation {
                field: "loss_locations".to_string(),
                message: msg.to_string(),
                message_es: "La merma sólo aplica a disminuciones de inventario".to_string(),
            }
        })?;

        let actor = actor.unwrap_or(GENERIC_ACTOR);
        let name = input.draft.full_name();

        // Master fields are written first so audit entries can reference the
        // final product name.
        let product_id = self.write_master(actor, &input.draft, &name).await?;

        if deltas.is_empty() {
            return Ok(ReconcileOutcome {
                product_id,
                applied: vec![],
                conflicted: vec![],
            });
        }

        // Resolve location names up front; an unknown location aborts before
        // any ledger write.
        let names = self
            .business_names(deltas.iter().map(|d| d.business_id))
            .await?;
        for delta in &deltas {
            if !names.contains_key(&delta.business_id) {
                return Err(AppError::NotFound("Business".to_string()));
            }
        }

        let mut applied = Vec::new();
        let mut conflicted = Vec::new();

        for delta in &deltas {
            let business_name = names[&delta.business_id].clone();
            let reason = if input.loss_locations.contains(&delta.business_id) {
                ActivityReason::Loss
            } else {
                ActivityReason::Correction
            };
            let write = self
                .apply_delta(
                    actor,
                    product_id,
                    &name,
                    input.draft.selling_price,
                    delta,
                    &business_name,
                    reason,
                )
                .await?;

            match write {
                Some(write) => applied.push(AppliedChange {
                    business_id: delta.business_id,
                    business_name,
                    old_quantity: write.old_quantity,
                    new_quantity: delta.new_quantity,
                }),
                None => {
                    tracing::warn!(
                        product_id = %product_id,
                        business_id = %delta.business_id,
                        expected = delta.old_quantity,
                        "stock write skipped: quantity changed concurrently"
                    );
                    conflicted.push(ConflictedChange {
                        business_id: delta.business_id,
                        business_name,
                        expected_quantity: delta.old_quantity,
                        target_quantity: delta.new_quantity,
                    });
                }
            }
        }

        Ok(ReconcileOutcome {
            product_id,
            applied,
            conflicted,
        })
    }

    /// Apply a single-location adjustment with the same conditional-update
    /// discipline as a full reconcile.
    ///
    /// Loss-reasoned decrements are valued at the current selling price and
    /// logged in the same transaction as the quantity change, so the
    /// classification cannot be lost to a later batch save.
    pub async fn quick_adjust(
        &self,
        actor: Option<&str>,
        input: QuickAdjustInput,
    ) -> AppResult<QuickAdjustOutcome> {
        validate_quick_adjust(input.delta, input.reason).map_err(|msg| AppError::Validation {
            field: "reason".to_string(),
            message: msg.to_string(),
            message_es: "La merma sólo aplica a disminuciones de inventario".to_string(),
        })?;

        let actor = actor.unwrap_or(GENERIC_ACTOR);

        let (product_name, selling_price) = sqlx::query_as::<_, (String, Decimal)>(
            "SELECT name, selling_price FROM products_master WHERE id = $1",
        )
        .bind(input.product_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Product".to_string()))?;

        let business_name =
            sqlx::query_scalar::<_, String>("SELECT name FROM businesses WHERE id = $1")
                .bind(input.business_id)
                .fetch_optional(&self.db)
                .await?
                .ok_or_else(|| AppError::NotFound("Business".to_string()))?;

        let old_quantity = sqlx::query_scalar::<_, i32>(
            "SELECT quantity FROM business_inventory WHERE product_id = $1 AND business_id = $2",
        )
        .bind(input.product_id)
        .bind(input.business_id)
        .fetch_optional(&self.db)
        .await?
        .unwrap_or(0);

        let new_quantity = clamp_quantity(old_quantity.saturating_add(input.delta));

        if new_quantity == old_quantity {
            return Ok(QuickAdjustOutcome {
                product_id: input.product_id,
                business_id: input.business_id,
                business_name,
                old_quantity,
                new_quantity,
                applied: false,
                conflicted: false,
                lost_cash: None,
            });
        }

        let delta = StockDelta {
            business_id: input.business_id,
            old_quantity,
            new_quantity,
        };

        let write = self
            .apply_delta(
                actor,
                input.product_id,
                &product_name,
                selling_price,
                &delta,
                &business_name,
                input.reason,
            )
            .await?;

        if write.is_none() {
            tracing::warn!(
                product_id = %input.product_id,
                business_id = %input.business_id,
                expected = old_quantity,
                "quick adjust skipped: quantity changed concurrently"
            );
        }

        Ok(match write {
            Some(write) => QuickAdjustOutcome {
                product_id: input.product_id,
                business_id: input.business_id,
                business_name,
                old_quantity: write.old_quantity,
                new_quantity,
                applied: true,
                conflicted: false,
                lost_cash: write.lost_cash,
            },
            None => QuickAdjustOutcome {
                product_id: input.product_id,
                business_id: input.business_id,
                business_name,
                old_quantity,
                new_quantity,
                applied: false,
                conflicted: true,
                lost_cash: None,
            },
        })
    }

    /// Insert or update the product master row and log the catalog change.
    async fn write_master(
        &self,
        actor: &str,
        draft: &ProductDraft,
        name: &str,
    ) -> AppResult<Uuid> {
        let mut tx = self.db.begin().await?;

        let (product_id, reason, details) = match draft.id {
            None => {
                let id = sqlx::query_scalar::<_, Uuid>(
                    r#"
                    INSERT INTO products_master (code, name, purchase_cost, margin_percent, selling_price)
                    VALUES ($1, $2, $3, $4, $5)
                    RETURNING id
                    "#,
                )
                .bind(&draft.code)
                .bind(name)
                .bind(draft.purchase_cost)
                .bind(draft.margin_percent)
                .bind(draft.selling_price)
                .fetch_one(&mut *tx)
                .await?;

                (
                    id,
                    ActivityReason::Creation,
                    format!("{} creó el producto {}", actor, name),
                )
            }
            Some(id) => {
                let result = sqlx::query(
                    r#"
                    UPDATE products_master
                    SET code = $1, name = $2, purchase_cost = $3, margin_percent = $4,
                        selling_price = $5, updated_at = NOW()
                    WHERE id = $6
                    "#,
                )
                .bind(&draft.code)
                .bind(name)
                .bind(draft.purchase_cost)
                .bind(draft.margin_percent)
                .bind(draft.selling_price)
                .bind(id)
                .execute(&mut *tx)
                .await?;

                if result.rows_affected() == 0 {
                    return Err(AppError::NotFound("Product".to_string()));
                }

                (
                    id,
                    ActivityReason::Correction,
                    format!("{} actualizó el producto {}", actor, name),
                )
            }
        };

        // Catalog entries carry no location and no quantity
        sqlx::query(
            "INSERT INTO activity_logs (business_id, product_id, details, reason) VALUES (NULL, $1, $2, $3)",
        )
        .bind(product_id)
        .bind(&details)
        .bind(reason.as_str())
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(product_id)
    }

    /// Apply one location's delta and, if it was written, its audit entry,
    /// in a single transaction. Returns the write record on success and
    /// `None` when the conditional write found a concurrently-changed
    /// quantity.
    ///
    /// The recorded old quantity is the value the write was actually keyed
    /// on: zero when the row was created (or won on the insert-race
    /// fallback), which can differ from the caller's snapshot.
    #[allow(clippy::too_many_arguments)]
    async fn apply_delta(
        &self,
        actor: &str,
        product_id: Uuid,
        product_name: &str,
        selling_price: Decimal,
        delta: &StockDelta,
        business_name: &str,
        reason: ActivityReason,
    ) -> AppResult<Option<AppliedWrite>> {
        let mut tx = self.db.begin().await?;

        let existing = sqlx::query_scalar::<_, i32>(
            "SELECT quantity FROM business_inventory WHERE product_id = $1 AND business_id = $2",
        )
        .bind(product_id)
        .bind(delta.business_id)
        .fetch_optional(&mut *tx)
        .await?;

        let written_old = match existing {
            None => {
                let inserted = sqlx::query(
                    r#"
                    INSERT INTO business_inventory (product_id, business_id, quantity)
                    VALUES ($1, $2, $3)
                    ON CONFLICT (product_id, business_id) DO NOTHING
                    "#,
                )
                .bind(product_id)
                .bind(delta.business_id)
                .bind(delta.new_quantity)
                .execute(&mut *tx)
                .await?
                .rows_affected()
                    == 1;

                if inserted {
                    Some(0)
                } else {
                    // A concurrent writer created the row between our read
                    // and the insert; retry as a conditional update keyed on
                    // the old value the absence implied.
                    Self::conditional_update(&mut tx, product_id, delta, 0)
                        .await?
                        .then_some(0)
                }
            }
            Some(_) => Self::conditional_update(&mut tx, product_id, delta, delta.old_quantity)
                .await?
                .then_some(delta.old_quantity),
        };

        let write = match written_old {
            Some(old_quantity) => {
                let lost_cash = match reason {
                    ActivityReason::Loss if old_quantity > delta.new_quantity => Some(
                        loss_value(old_quantity - delta.new_quantity, selling_price),
                    ),
                    _ => None,
                };
                let details = stock_details(
                    actor,
                    product_name,
                    business_name,
                    old_quantity,
                    delta.new_quantity,
                    reason,
                );
                sqlx::query(
                    r#"
                    INSERT INTO activity_logs (business_id, product_id, details, reason, lost_cash)
                    VALUES ($1, $2, $3, $4, $5)
                    "#,
                )
                .bind(delta.business_id)
                .bind(product_id)
                .bind(&details)
                .bind(reason.as_str())
                .bind(lost_cash)
                .execute(&mut *tx)
                .await?;

                Some(AppliedWrite {
                    old_quantity,
                    lost_cash,
                })
            }
            None => None,
        };

        tx.commit().await?;
        Ok(write)
    }

    /// The optimistic-concurrency guard: write the target quantity only if
    /// the stored quantity still equals the expected value.
    async fn conditional_update(
        tx: &mut Transaction<'_, Postgres>,
        product_id: Uuid,
        delta: &StockDelta,
        expected: i32,
    ) -> AppResult<bool> {
        let affected = sqlx::query(
            r#"
            UPDATE business_inventory
            SET quantity = $1, updated_at = NOW()
            WHERE product_id = $2 AND business_id = $3 AND quantity = $4
            "#,
        )
        .bind(delta.new_quantity)
        .bind(product_id)
        .bind(delta.business_id)
        .bind(expected)
        .execute(&mut **tx)
        .await?
        .rows_affected();

        Ok(affected == 1)
    }

    /// Resolve location display names for conflict/audit reporting
    async fn business_names(
        &self,
        ids: impl Iterator<Item = Uuid>,
    ) -> AppResult<HashMap<Uuid, String>> {
        let ids: Vec<Uuid> = ids.collect();
        let rows =
            sqlx::query_as::<_, (Uuid, String)>("SELECT id, name FROM businesses WHERE id = ANY($1)")
                .bind(&ids)
                .fetch_all(&self.db)
                .await?;
        Ok(rows.into_iter().collect())
    }
}

/// Loss can only be recorded for decrements; the engine trusts the tag but
/// rejects tags that contradict the delta's direction.
fn validate_loss_tags(deltas: &[StockDelta], loss_locations: &[Uuid]) -> Result<(), &'static str> {
    for delta in deltas {
        if loss_locations.contains(&delta.business_id) && delta.new_quantity >= delta.old_quantity
        {
            return Err("Loss can only be recorded for stock decrements");
        }
    }
    Ok(())
}

fn validate_quick_adjust(delta: i32, reason: ActivityReason) -> Result<(), &'static str> {
    match reason {
        ActivityReason::Creation => Err("Creation is reserved for product creation"),
        ActivityReason::Loss if delta >= 0 => {
            Err("Loss can only be recorded for stock decrements")
        }
        _ => Ok(()),
    }
}

/// Human-readable audit summary for a stock change
fn stock_details(
    actor: &str,
    product_name: &str,
    business_name: &str,
    old_quantity: i32,
    new_quantity: i32,
    reason: ActivityReason,
) -> String {
    match reason {
        ActivityReason::Loss => format!(
            "{} registró una merma de {} en {}: {} → {}",
            actor, product_name, business_name, old_quantity, new_quantity
        ),
        _ => format!(
            "{} ajustó el inventario de {} en {}: {} → {}",
            actor, product_name, business_name, old_quantity, new_quantity
        ),
    }
}
