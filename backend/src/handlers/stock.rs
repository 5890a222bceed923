//! Quick stock adjustment handlers

use axum::{extract::State, Json};

use crate::error::AppError;
use crate::middleware::CurrentUser;
use crate::services::reconcile::{QuickAdjustInput, QuickAdjustOutcome};
use crate::services::ReconcileService;
use crate::AppState;

/// Apply a single-location "+/-" stock adjustment
pub async fn quick_adjust(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(body): Json<QuickAdjustInput>,
) -> Result<Json<QuickAdjustOutcome>, AppError> {
    let service = ReconcileService::new(state.db.clone());
    let outcome = service.quick_adjust(Some(&user.name), body).await?;

    Ok(Json(outcome))
}
