//! Activity log queries
//!
//! The log itself is append-only and written by the reconcile and catalog
//! services inside their own transactions; this service only reads it.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use shared::models::{ActivityLogEntry, ActivityReason};
use shared::types::{PaginatedResponse, Pagination, PaginationMeta};

use crate::error::{AppError, AppResult};

/// Activity log query service
#[derive(Clone)]
pub struct ActivityService {
    db: PgPool,
}

/// Optional filters for listing activity
#[derive(Debug, Default, Deserialize)]
pub struct ActivityFilter {
    pub business_id: Option<Uuid>,
    pub reason: Option<ActivityReason>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

#[derive(Debug, FromRow)]
struct ActivityRow {
    id: Uuid,
    business_id: Option<Uuid>,
    product_id: Option<Uuid>,
    details: String,
    reason: String,
    lost_cash: Option<Decimal>,
    created_at: DateTime<Utc>,
}

impl TryFrom<ActivityRow> for ActivityLogEntry {
    type Error = AppError;

    fn try_from(row: ActivityRow) -> Result<Self, Self::Error> {
        let reason = ActivityReason::from_str(&row.reason)
            .ok_or_else(|| AppError::Internal(format!("Unknown activity reason: {}", row.reason)))?;
        Ok(ActivityLogEntry {
            id: row.id,
            business_id: row.business_id,
            product_id: row.product_id,
            details: row.details,
            reason,
            lost_cash: row.lost_cash,
            created_at: row.created_at,
        })
    }
}

impl ActivityService {
    /// Create a new ActivityService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// List activity entries, newest first, with optional filters
    pub async fn list(
        &self,
        filter: &ActivityFilter,
        pagination: &Pagination,
    ) -> AppResult<PaginatedResponse<ActivityLogEntry>> {
        let reason = filter.reason.map(|r| r.as_str().to_string());

        let rows = sqlx::query_as::<_, ActivityRow>(
            r#"
            SELECT id, business_id, product_id, details, reason, lost_cash, created_at
            FROM activity_logs
            WHERE ($1::uuid IS NULL OR business_id = $1)
              AND ($2::text IS NULL OR reason = $2)
              AND ($3::date IS NULL OR created_at >= $3::date)
              AND ($4::date IS NULL OR created_at < $4::date + INTERVAL '1 day')
            ORDER BY created_at DESC, id DESC
            LIMIT $5 OFFSET $6
            "#,
        )
        .bind(filter.business_id)
        .bind(&reason)
        .bind(filter.start_date)
        .bind(filter.end_date)
        .bind(pagination.limit())
        .bind(pagination.offset())
        .fetch_all(&self.db)
        .await?;

        let total_items = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*)
            FROM activity_logs
            WHERE ($1::uuid IS NULL OR business_id = $1)
              AND ($2::text IS NULL OR reason = $2)
              AND ($3::date IS NULL OR created_at >= $3::date)
              AND ($4::date IS NULL OR created_at < $4::date + INTERVAL '1 day')
            "#,
        )
        .bind(filter.business_id)
        .bind(&reason)
        .bind(filter.start_date)
        .bind(filter.end_date)
        .fetch_one(&self.db)
        .await?;

        let data: Vec<ActivityLogEntry> = rows
            .into_iter()
            .map(ActivityLogEntry::try_from)
            .collect::<Result<_, _>>()?;

        Ok(PaginatedResponse {
            data,
            pagination: PaginationMeta::new(
                pagination.page,
                pagination.per_page,
                total_items.max(0) as u64,
            ),
        })
    }

    /// Fetch every entry matching the filter, newest first, for exports
    pub async fn list_all(&self, filter: &ActivityFilter) -> AppResult<Vec<ActivityLogEntry>> {
        let reason = filter.reason.map(|r| r.as_str().to_string());

        let rows = sqlx::query_as::<_, ActivityRow>(
            r#"
            SELECT id, business_id, product_id, details, reason, lost_cash, created_at
            FROM activity_logs
            WHERE ($1::uuid IS NULL OR business_id = $1)
              AND ($2::text IS NULL OR reason = $2)
              AND ($3::date IS NULL OR created_at >= $3::date)
              AND ($4::date IS NULL OR created_at < $4::date + INTERVAL '1 day')
            ORDER BY created_at DESC, id DESC
            "#,
        )
        .bind(filter.business_id)
        .bind(&reason)
        .bind(filter.start_date)
        .bind(filter.end_date)
        .fetch_all(&self.db)
        .await?;

        rows.into_iter().map(ActivityLogEntry::try_from).collect()
    }
}
