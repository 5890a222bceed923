//! Business (location) management handlers

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use shared::models::Business;

use crate::error::AppError;
use crate::middleware::{require_admin, CurrentUser};
use crate::services::business::CreateBusinessInput;
use crate::services::BusinessService;
use crate::AppState;

/// List all locations
pub async fn list_businesses(
    State(state): State<AppState>,
    CurrentUser(_user): CurrentUser,
) -> Result<Json<Vec<Business>>, AppError> {
    let service = BusinessService::new(state.db.clone());
    let businesses = service.list().await?;

    Ok(Json(businesses))
}

/// Fetch a single location
pub async fn get_business(
    State(state): State<AppState>,
    CurrentUser(_user): CurrentUser,
    Path(business_id): Path<Uuid>,
) -> Result<Json<Business>, AppError> {
    let service = BusinessService::new(state.db.clone());
    let business = service.get(business_id).await?;

    Ok(Json(business))
}

/// Add a new location (admin only)
pub async fn create_business(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(body): Json<CreateBusinessInput>,
) -> Result<(StatusCode, Json<Business>), AppError> {
    require_admin(&user)?;

    let service = BusinessService::new(state.db.clone());
    let business = service.create(body).await?;

    Ok((StatusCode::CREATED, Json(business)))
}
