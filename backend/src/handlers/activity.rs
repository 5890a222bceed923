//! Activity log handlers

use axum::{
    extract::{Query, State},
    Json,
};
use chrono::NaiveDate;
use serde::Deserialize;
use uuid::Uuid;

use shared::models::{ActivityLogEntry, ActivityReason};
use shared::types::{PaginatedResponse, Pagination};

use crate::error::AppError;
use crate::middleware::CurrentUser;
use crate::services::activity::ActivityFilter;
use crate::services::ActivityService;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct ActivityQuery {
    pub business_id: Option<Uuid>,
    pub reason: Option<ActivityReason>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

impl ActivityQuery {
    pub fn filter(&self) -> ActivityFilter {
        ActivityFilter {
            business_id: self.business_id,
            reason: self.reason,
            start_date: self.start_date,
            end_date: self.end_date,
        }
    }

    pub fn pagination(&self) -> Pagination {
        let defaults = Pagination::default();
        Pagination {
            page: self.page.unwrap_or(defaults.page).max(1),
            per_page: self.per_page.unwrap_or(defaults.per_page).clamp(1, 100),
        }
    }
}

/// List activity entries, newest first
pub async fn list_activity(
    State(state): State<AppState>,
    CurrentUser(_user): CurrentUser,
    Query(query): Query<ActivityQuery>,
) -> Result<Json<PaginatedResponse<ActivityLogEntry>>, AppError> {
    let service = ActivityService::new(state.db.clone());
    let response = service.list(&query.filter(), &query.pagination()).await?;

    Ok(Json(response))
}
