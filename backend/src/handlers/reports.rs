//! Reporting handlers

use std::collections::HashMap;

use axum::{
    extract::{Query, State},
    http::header,
    response::IntoResponse,
    Json,
};

use crate::error::AppError;
use crate::handlers::activity::ActivityQuery;
use crate::middleware::{require_admin, CurrentUser};
use crate::services::reporting::{DashboardMetrics, LocationStockSummary};
use crate::services::{ActivityService, BusinessService, ReportingService};
use crate::AppState;

/// Cross-location dashboard metrics (admin only)
pub async fn get_dashboard(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<DashboardMetrics>, AppError> {
    require_admin(&user)?;

    let service = ReportingService::new(state.db.clone());
    let metrics = service.dashboard().await?;

    Ok(Json(metrics))
}

/// Stock totals per location (admin only)
pub async fn get_stock_by_location(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<Vec<LocationStockSummary>>, AppError> {
    require_admin(&user)?;

    let service = ReportingService::new(state.db.clone());
    let summary = service.stock_by_location().await?;

    Ok(Json(summary))
}

/// Export the activity log as CSV (admin only)
pub async fn export_activity_csv(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Query(query): Query<ActivityQuery>,
) -> Result<impl IntoResponse, AppError> {
    require_admin(&user)?;

    let activity = ActivityService::new(state.db.clone());
    let entries = activity.list_all(&query.filter()).await?;

    let businesses = BusinessService::new(state.db.clone()).list().await?;
    let names: HashMap<_, _> = businesses.into_iter().map(|b| (b.id, b.name)).collect();

    let rows = ReportingService::activity_export_rows(&entries, |id| names.get(&id).cloned());
    let csv = ReportingService::export_to_csv(&rows)?;

    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8"),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"actividad.csv\"",
            ),
        ],
        csv,
    ))
}
