//! Product catalog and reconciliation handlers

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use shared::reconcile::ReconcileOutcome;

use crate::error::AppError;
use crate::middleware::{require_admin, CurrentUser};
use crate::services::catalog::ProductWithStock;
use crate::services::reconcile::ReconcileInput;
use crate::services::{CatalogService, ReconcileService};
use crate::AppState;

/// List the full catalog with per-location stock
pub async fn list_products(
    State(state): State<AppState>,
    CurrentUser(_user): CurrentUser,
) -> Result<Json<Vec<ProductWithStock>>, AppError> {
    let catalog = CatalogService::new(state.db.clone());
    let products = catalog.list_products_with_stock().await?;

    Ok(Json(products))
}

/// Fetch a single product with its stock levels
pub async fn get_product(
    State(state): State<AppState>,
    CurrentUser(_user): CurrentUser,
    Path(product_id): Path<Uuid>,
) -> Result<Json<ProductWithStock>, AppError> {
    let catalog = CatalogService::new(state.db.clone());
    let product = catalog.get_product(product_id).await?;

    Ok(Json(product))
}

/// Save a product draft and apply its stock changes.
///
/// Returns 200 even when some locations conflicted; the outcome body says
/// which locations were applied and which were skipped.
pub async fn reconcile_product(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(body): Json<ReconcileInput>,
) -> Result<Json<ReconcileOutcome>, AppError> {
    let service = ReconcileService::new(state.db.clone());
    let outcome = service.reconcile(Some(&user.name), body).await?;

    Ok(Json(outcome))
}

/// Delete a product and its ledger rows (admin only)
pub async fn delete_product(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(product_id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    require_admin(&user)?;

    let catalog = CatalogService::new(state.db.clone());
    catalog.delete_product(Some(&user.name), product_id).await?;

    Ok(StatusCode::NO_CONTENT)
}
