//! Handlers for milestones.

use axum::extract::{Path, State};
use axum::response::IntoResponse;
use axum::Json;
use quoteflow_core::types::DbId;
use quoteflow_db::lifecycle;
use quoteflow_db::models::milestone::{CreateMilestone, Milestone, UpdateMilestone};
use quoteflow_db::models::quote_version::QuoteVersion;

use crate::error::AppResult;
use crate::extract::AppJson;
use crate::middleware::rbac::RequireAdmin;
use crate::response::{created, DataResponse};
use crate::state::AppState;

/// POST /api/v1/deliverables/{id}/milestones
pub async fn create_milestone(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    Path(deliverable_id): Path<DbId>,
    AppJson(input): AppJson<CreateMilestone>,
) -> AppResult<impl IntoResponse> {
    let milestone = lifecycle::create_milestone(&state.pool, deliverable_id, &input).await?;
    Ok(created(milestone))
}

/// PATCH /api/v1/milestones/{id}
pub async fn update_milestone(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    Path(milestone_id): Path<DbId>,
    AppJson(input): AppJson<UpdateMilestone>,
) -> AppResult<Json<DataResponse<Milestone>>> {
    let milestone = lifecycle::update_milestone(&state.pool, milestone_id, &input).await?;
    Ok(Json(DataResponse { data: milestone }))
}

/// DELETE /api/v1/milestones/{id}
///
/// Responds with the owning version's refreshed totals.
pub async fn delete_milestone(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    Path(milestone_id): Path<DbId>,
) -> AppResult<Json<DataResponse<QuoteVersion>>> {
    let version = lifecycle::delete_milestone(&state.pool, milestone_id).await?;
    Ok(Json(DataResponse { data: version }))
}
