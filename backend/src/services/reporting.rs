//! Reporting service for dashboard metrics and data export

use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use shared::models::ActivityLogEntry;

use crate::error::{AppError, AppResult};

/// Reporting service
#[derive(Clone)]
pub struct ReportingService {
    db: PgPool,
}

/// Cross-location overview for the dashboard
#[derive(Debug, Serialize)]
pub struct DashboardMetrics {
    pub product_count: i64,
    pub location_count: i64,
    pub total_units: i64,
    /// Stock valued at current selling prices
    pub total_stock_value: Decimal,
    pub losses_last_30_days: Decimal,
    pub activity_last_7_days: i64,
}

/// Per-location stock totals
#[derive(Debug, Serialize, FromRow)]
pub struct LocationStockSummary {
    pub business_id: Uuid,
    pub business_name: String,
    pub total_units: i64,
    pub stock_value: Decimal,
}

/// Flat activity row for CSV export
#[derive(Debug, Serialize)]
pub struct ActivityExportRow {
    pub fecha: String,
    pub negocio: String,
    pub detalle: String,
    pub motivo: String,
    pub merma: String,
}

impl ReportingService {
    /// Create a new ReportingService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Aggregate dashboard metrics across all locations
    pub async fn dashboard(&self) -> AppResult<DashboardMetrics> {
        let product_count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products_master")
            .fetch_one(&self.db)
            .await?;

        let location_count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM businesses")
            .fetch_one(&self.db)
            .await?;

        let total_units: i64 = sqlx::query_scalar(
            "SELECT COALESCE(SUM(quantity), 0)::BIGINT FROM business_inventory",
        )
        .fetch_one(&self.db)
        .await?;

        let total_stock_value: Decimal = sqlx::query_scalar(
            r#"
            SELECT COALESCE(SUM(bi.quantity * pm.selling_price), 0)
            FROM business_inventory bi
            JOIN products_master pm ON pm.id = bi.product_id
            "#,
        )
        .fetch_one(&self.db)
        .await?;

        let losses_last_30_days: Decimal = sqlx::query_scalar(
            r#"
            SELECT COALESCE(SUM(lost_cash), 0)
            FROM activity_logs
            WHERE reason = 'loss'
              AND created_at >= NOW() - INTERVAL '30 days'
            "#,
        )
        .fetch_one(&self.db)
        .await?;

        let activity_last_7_days: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM activity_logs WHERE created_at >= NOW() - INTERVAL '7 days'",
        )
        .fetch_one(&self.db)
        .await?;

        Ok(DashboardMetrics {
            product_count,
            location_count,
            total_units,
            total_stock_value,
            losses_last_30_days,
            activity_last_7_days,
        })
    }

    /// Stock totals per location, valued at current selling prices
    pub async fn stock_by_location(&self) -> AppResult<Vec<LocationStockSummary>> {
        let rows = sqlx::query_as::<_, LocationStockSummary>(
            r#"
            SELECT b.id AS business_id,
                   b.name AS business_name,
                   COALESCE(SUM(bi.quantity), 0)::BIGINT AS total_units,
                   COALESCE(SUM(bi.quantity * pm.selling_price), 0) AS stock_value
            FROM businesses b
            LEFT JOIN business_inventory bi ON bi.business_id = b.id
            LEFT JOIN products_master pm ON pm.id = bi.product_id
            GROUP BY b.id, b.name
            ORDER BY b.name
            "#,
        )
        .fetch_all(&self.db)
        .await?;

        Ok(rows)
    }

    /// Render activity entries as flat CSV export rows
    pub fn activity_export_rows(
        entries: &[ActivityLogEntry],
        business_names: impl Fn(Uuid) -> Option<String>,
    ) -> Vec<ActivityExportRow> {
        entries
            .iter()
            .map(|entry| ActivityExportRow {
                fecha: entry.created_at.format("%Y-%m-%d %H:%M:%S").to_string(),
                negocio: entry
                    .business_id
                    .and_then(&business_names)
                    .unwrap_or_default(),
                detalle: entry.details.clone(),
                motivo: entry.reason.as_str().to_string(),
                merma: entry
                    .lost_cash
                    .map(|v| v.to_string())
                    .unwrap_or_default(),
            })
            .collect()
    }

    /// Export report data as CSV
    pub fn export_to_csv<T: Serialize>(data: &[T]) -> AppResult<String> {
        let mut wtr = csv::Writer::from_writer(vec![]);
        for record in data {
            wtr.serialize(record)
                .map_err(|e| AppError::Internal(format!("CSV serialization error: {}", e)))?;
        }
        let csv_data = String::from_utf8(
            wtr.into_inner()
                .map_err(|e| AppError::Internal(format!("CSV writer error: {}", e)))?,
        )
        .map_err(|e| AppError::Internal(format!("UTF-8 conversion error: {}", e)))?;
        Ok(csv_data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use rust_decimal::Decimal;
    use shared::models::ActivityReason;
    use std::str::FromStr;

    fn entry(lost_cash: Option<&str>) -> ActivityLogEntry {
        ActivityLogEntry {
            id: Uuid::from_u128(1),
            business_id: Some(Uuid::from_u128(2)),
            product_id: Some(Uuid::from_u128(3)),
            details: "Ana registró una merma de Pan dulce en Centro: 5 → 2".to_string(),
            reason: ActivityReason::Loss,
            lost_cash: lost_cash.map(|s| Decimal::from_str(s).unwrap()),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_export_rows_resolve_business_names() {
        let entries = vec![entry(Some("37.50"))];
        let rows = ReportingService::activity_export_rows(&entries, |_| {
            Some("Sucursal Centro".to_string())
        });
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].negocio, "Sucursal Centro");
        assert_eq!(rows[0].motivo, "loss");
        assert_eq!(rows[0].merma, "37.50");
    }

    #[test]
    fn test_export_to_csv_produces_header_and_rows() {
        let entries = vec![entry(None)];
        let rows = ReportingService::activity_export_rows(&entries, |_| None);
        let csv = ReportingService::export_to_csv(&rows).unwrap();
        let mut lines = csv.lines();
        assert_eq!(lines.next(), Some("fecha,negocio,detalle,motivo,merma"));
        assert!(lines.next().is_some());
    }
}
