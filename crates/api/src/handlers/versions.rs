//! Handlers for the `/versions` resource.

use axum::extract::{Path, State};
use axum::Json;
use quoteflow_core::types::DbId;
use quoteflow_db::lifecycle;
use quoteflow_db::models::quote_version::{QuoteVersion, UpdateQuoteVersion, VersionDetail};

use crate::error::AppResult;
use crate::extract::AppJson;
use crate::middleware::auth::AuthUser;
use crate::middleware::rbac::RequireAdmin;
use crate::response::DataResponse;
use crate::state::AppState;

/// GET /api/v1/versions/{id}
///
/// The version with its ordered deliverables and their milestones.
pub async fn get_version(
    _user: AuthUser,
    State(state): State<AppState>,
    Path(version_id): Path<DbId>,
) -> AppResult<Json<DataResponse<VersionDetail>>> {
    let detail = lifecycle::load_version_detail(&state.pool, version_id).await?;
    Ok(Json(DataResponse { data: detail }))
}

/// PATCH /api/v1/versions/{id}
///
/// Change GST settings or notes; totals are recomputed in the same
/// transaction.
pub async fn update_version(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Path(version_id): Path<DbId>,
    AppJson(input): AppJson<UpdateQuoteVersion>,
) -> AppResult<Json<DataResponse<QuoteVersion>>> {
    let version = lifecycle::update_version_settings(&state.pool, version_id, &input).await?;

    tracing::info!(
        version_id,
        user_id = admin.user_id,
        total = version.total,
        "Version settings updated",
    );

    Ok(Json(DataResponse { data: version }))
}
