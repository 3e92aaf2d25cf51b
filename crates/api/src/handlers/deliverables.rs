//! Handlers for deliverables. Every mutation recomputes the owning
//! version's totals before responding.

use axum::extract::{Path, State};
use axum::response::IntoResponse;
use axum::Json;
use quoteflow_core::types::DbId;
use quoteflow_db::lifecycle;
use quoteflow_db::models::deliverable::{CreateDeliverable, Deliverable, UpdateDeliverable};
use quoteflow_db::models::quote_version::QuoteVersion;

use crate::error::AppResult;
use crate::extract::AppJson;
use crate::middleware::rbac::RequireAdmin;
use crate::response::{created, DataResponse};
use crate::state::AppState;

/// POST /api/v1/versions/{id}/deliverables
pub async fn create_deliverable(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Path(version_id): Path<DbId>,
    AppJson(input): AppJson<CreateDeliverable>,
) -> AppResult<impl IntoResponse> {
    let deliverable = lifecycle::create_deliverable(&state.pool, version_id, &input).await?;

    tracing::info!(
        deliverable_id = deliverable.id,
        version_id,
        user_id = admin.user_id,
        "Deliverable created",
    );

    Ok(created(deliverable))
}

/// PATCH /api/v1/deliverables/{id}
pub async fn update_deliverable(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    Path(deliverable_id): Path<DbId>,
    AppJson(input): AppJson<UpdateDeliverable>,
) -> AppResult<Json<DataResponse<Deliverable>>> {
    let deliverable = lifecycle::update_deliverable(&state.pool, deliverable_id, &input).await?;
    Ok(Json(DataResponse { data: deliverable }))
}

/// DELETE /api/v1/deliverables/{id}
///
/// Removes the deliverable and its milestones. Responds with the owning
/// version's refreshed totals.
pub async fn delete_deliverable(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Path(deliverable_id): Path<DbId>,
) -> AppResult<Json<DataResponse<QuoteVersion>>> {
    let version = lifecycle::delete_deliverable(&state.pool, deliverable_id).await?;

    tracing::info!(
        deliverable_id,
        version_id = version.id,
        user_id = admin.user_id,
        "Deliverable deleted",
    );

    Ok(Json(DataResponse { data: version }))
}
