//! Product catalog service
//!
//! Bulk fetch of the catalog merged with per-location stock. Both tables are
//! read in fixed-size pages until a short page signals the end, so the
//! catalog view stays complete past any single-query row cap.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use shared::models::{ActivityReason, ProductMaster, StockLevel};
use shared::types::FETCH_PAGE_SIZE;

use super::GENERIC_ACTOR;
use crate::error::{AppError, AppResult};

/// Product catalog service
#[derive(Clone)]
pub struct CatalogService {
    db: PgPool,
}

#[derive(Debug, FromRow)]
struct ProductRow {
    id: Uuid,
    code: String,
    name: String,
    purchase_cost: Decimal,
    margin_percent: Decimal,
    selling_price: Decimal,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<ProductRow> for ProductMaster {
    fn from(row: ProductRow) -> Self {
        ProductMaster {
            id: row.id,
            code: row.code,
            name: row.name,
            purchase_cost: row.purchase_cost,
            margin_percent: row.margin_percent,
            selling_price: row.selling_price,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, FromRow)]
struct StockRow {
    product_id: Uuid,
    business_id: Uuid,
    business_name: String,
    quantity: i32,
}

/// A catalog entry with its stock across every location
#[derive(Debug, Serialize)]
pub struct ProductWithStock {
    #[serde(flatten)]
    pub product: ProductMaster,
    pub stock: Vec<StockLevel>,
}

impl CatalogService {
    /// Create a new CatalogService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Fetch the whole catalog with per-location stock merged in.
    ///
    /// Products without any ledger row appear with an empty stock list.
    pub async fn list_products_with_stock(&self) -> AppResult<Vec<ProductWithStock>> {
        let products = self.fetch_all_products().await?;
        let stock = self.fetch_all_stock().await?;

        let mut by_product: HashMap<Uuid, Vec<StockLevel>> = HashMap::new();
        for row in stock {
            by_product
                .entry(row.product_id)
                .or_default()
                .push(StockLevel {
                    business_id: row.business_id,
                    business_name: row.business_name,
                    quantity: row.quantity,
                });
        }

        Ok(products
            .into_iter()
            .map(|product| {
                let mut stock = by_product.remove(&product.id).unwrap_or_default();
                stock.sort_by(|a, b| a.business_name.cmp(&b.business_name));
                ProductWithStock { product, stock }
            })
            .collect())
    }

    /// Fetch a single product with its stock levels
    pub async fn get_product(&self, product_id: Uuid) -> AppResult<ProductWithStock> {
        let product = sqlx::query_as::<_, ProductRow>(
            r#"
            SELECT id, code, name, purchase_cost, margin_percent, selling_price,
                   created_at, updated_at
            FROM products_master
            WHERE id = $1
            "#,
        )
        .bind(product_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Product".to_string()))?;

        let stock = sqlx::query_as::<_, StockRow>(
            r#"
            SELECT bi.product_id, bi.business_id, b.name AS business_name, bi.quantity
            FROM business_inventory bi
            JOIN businesses b ON b.id = bi.business_id
            WHERE bi.product_id = $1
            ORDER BY b.name
            "#,
        )
        .bind(product_id)
        .fetch_all(&self.db)
        .await?;

        Ok(ProductWithStock {
            product: product.into(),
            stock: stock
                .into_iter()
                .map(|row| StockLevel {
                    business_id: row.business_id,
                    business_name: row.business_name,
                    quantity: row.quantity,
                })
                .collect(),
        })
    }

    /// Delete a product, its ledger rows, and log the removal.
    ///
    /// Audit entries that referenced the product keep their text; their
    /// product link is nulled by the schema.
    pub async fn delete_product(&self, actor: Option<&str>, product_id: Uuid) -> AppResult<()> {
        let actor = actor.unwrap_or(GENERIC_ACTOR);

        let name = sqlx::query_scalar::<_, String>("SELECT name FROM products_master WHERE id = $1")
            .bind(product_id)
            .fetch_optional(&self.db)
            .await?
            .ok_or_else(|| AppError::NotFound("Product".to_string()))?;

        let mut tx = self.db.begin().await?;

        sqlx::query("DELETE FROM business_inventory WHERE product_id = $1")
            .bind(product_id)
            .execute(&mut *tx)
            .await?;

        sqlx::query("DELETE FROM products_master WHERE id = $1")
            .bind(product_id)
            .execute(&mut *tx)
            .await?;

        sqlx::query(
            "INSERT INTO activity_logs (business_id, product_id, details, reason) VALUES (NULL, NULL, $1, $2)",
        )
        .bind(format!("{} eliminó el producto {}", actor, name))
        .bind(ActivityReason::Correction.as_str())
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        tracing::info!(product_id = %product_id, "product deleted");
        Ok(())
    }

    async fn fetch_all_products(&self) -> AppResult<Vec<ProductMaster>> {
        let mut all = Vec::new();
        let mut offset = 0i64;

        loop {
            let rows = sqlx::query_as::<_, ProductRow>(
                r#"
                SELECT id, code, name, purchase_cost, margin_percent, selling_price,
                       created_at, updated_at
                FROM products_master
                ORDER BY name, id
                LIMIT $1 OFFSET $2
                "#,
            )
            .bind(FETCH_PAGE_SIZE)
            .bind(offset)
            .fetch_all(&self.db)
            .await?;

            let short_page = (rows.len() as i64) < FETCH_PAGE_SIZE;
            all.extend(rows.into_iter().map(ProductMaster::from));
            if short_page {
                break;
            }
            offset += FETCH_PAGE_SIZE;
        }

        Ok(all)
    }

    async fn fetch_all_stock(&self) -> AppResult<Vec<StockRow>> {
        let mut all = Vec::new();
        let mut offset = 0i64;

        loop {
            let rows = sqlx::query_as::<_, StockRow>(
                r#"
                SELECT bi.product_id, bi.business_id, b.name AS business_name, bi.quantity
                FROM business_inventory bi
                JOIN businesses b ON b.id = bi.business_id
                ORDER BY bi.product_id, bi.business_id
                LIMIT $1 OFFSET $2
                "#,
            )
            .bind(FETCH_PAGE_SIZE)
            .bind(offset)
            .fetch_all(&self.db)
            .await?;

            let short_page = (rows.len() as i64) < FETCH_PAGE_SIZE;
            all.extend(rows);
            if short_page {
                break;
            }
            offset += FETCH_PAGE_SIZE;
        }

        Ok(all)
    }
}
