//! Handlers for the `/quotes` resource: creation, listing, versions,
//! publishing, and the client action log.

use axum::body::Bytes;
use axum::extract::{Path, Query, State};
use axum::response::IntoResponse;
use axum::Json;
use quoteflow_core::error::CoreError;
use quoteflow_core::quote_status;
use quoteflow_core::types::DbId;
use quoteflow_db::models::access_code::{IssuedAccessCode, PublishRequest};
use quoteflow_db::models::quote::{CreateQuote, Quote};
use quoteflow_db::models::quote_version::{CloneVersionRequest, QuoteVersion, VersionDetail};
use quoteflow_db::repositories::{ClientActionRepo, QuoteRepo, QuoteVersionRepo};
use quoteflow_db::{access, lifecycle};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};
use crate::extract::{optional_json, AppJson};
use crate::middleware::auth::AuthUser;
use crate::middleware::rbac::RequireAdmin;
use crate::notifications;
use crate::response::{created, DataResponse};
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

/// Query parameters for `GET /quotes`.
#[derive(Debug, Deserialize)]
pub struct ListQuotesParams {
    pub status: Option<String>,
}

/// A quote with its current version tree.
#[derive(Debug, Serialize)]
pub struct QuoteDetail {
    pub quote: Quote,
    pub current_version: VersionDetail,
}

/// Response for `POST /quotes`.
#[derive(Debug, Serialize)]
pub struct CreatedQuote {
    pub quote: Quote,
    pub version: QuoteVersion,
}

/// Response for `POST /quotes/{id}/publish`. The plaintext code appears
/// here once and is never retrievable again.
#[derive(Debug, Serialize)]
pub struct PublishResponse {
    pub quote: Quote,
    pub access_code: IssuedAccessCode,
    pub email_sent: bool,
}

async fn find_quote(state: &AppState, quote_id: DbId) -> AppResult<Quote> {
    QuoteRepo::find_by_id(&state.pool, quote_id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Quote",
            id: quote_id,
        }))
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// POST /api/v1/quotes
///
/// Create a draft quote together with version 1.
pub async fn create_quote(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    AppJson(input): AppJson<CreateQuote>,
) -> AppResult<impl IntoResponse> {
    let (quote, version) = lifecycle::create_quote(&state.pool, &input, Some(admin.user_id)).await?;

    Ok(created(CreatedQuote { quote, version }))
}

/// GET /api/v1/quotes?status=published
pub async fn list_quotes(
    _user: AuthUser,
    State(state): State<AppState>,
    Query(params): Query<ListQuotesParams>,
) -> AppResult<Json<DataResponse<Vec<Quote>>>> {
    if let Some(status) = params.status.as_deref() {
        if !quote_status::VALID_STATUSES.contains(&status) {
            return Err(AppError::BadRequest(format!(
                "Unknown status '{status}'. Must be one of: {}",
                quote_status::VALID_STATUSES.join(", ")
            )));
        }
    }
    let quotes = QuoteRepo::list(&state.pool, params.status.as_deref()).await?;
    Ok(Json(DataResponse { data: quotes }))
}

/// GET /api/v1/quotes/{id}
pub async fn get_quote(
    _user: AuthUser,
    State(state): State<AppState>,
    Path(quote_id): Path<DbId>,
) -> AppResult<Json<DataResponse<QuoteDetail>>> {
    let quote = find_quote(&state, quote_id).await?;
    let current_version = lifecycle::load_current_version_detail(&state.pool, quote_id).await?;

    Ok(Json(DataResponse {
        data: QuoteDetail {
            quote,
            current_version,
        },
    }))
}

/// GET /api/v1/quotes/{id}/versions
///
/// All versions, oldest first.
pub async fn list_versions(
    _user: AuthUser,
    State(state): State<AppState>,
    Path(quote_id): Path<DbId>,
) -> AppResult<Json<DataResponse<Vec<QuoteVersion>>>> {
    find_quote(&state, quote_id).await?;
    let versions = QuoteVersionRepo::list_by_quote(&state.pool, quote_id).await?;
    Ok(Json(DataResponse { data: versions }))
}

/// POST /api/v1/quotes/{id}/versions
///
/// Clone a version (default: the current one) into a new current version.
/// The body is optional.
pub async fn clone_version(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Path(quote_id): Path<DbId>,
    body: Bytes,
) -> AppResult<impl IntoResponse> {
    let input: CloneVersionRequest = optional_json(&body)?;
    let version = lifecycle::clone_version(&state.pool, quote_id, input.source_version_id).await?;

    tracing::info!(
        quote_id,
        version_id = version.id,
        version_number = version.version_number,
        user_id = admin.user_id,
        "Quote version cloned",
    );

    Ok(created(version))
}

/// POST /api/v1/quotes/{id}/publish
///
/// Publish the quote and issue its access code, rotating any active one.
/// The code is emailed to the contact unless `send_email` is `false`;
/// delivery failure does not fail the request.
pub async fn publish_quote(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Path(quote_id): Path<DbId>,
    body: Bytes,
) -> AppResult<Json<DataResponse<PublishResponse>>> {
    let input: PublishRequest = optional_json(&body)?;
    if input.expires_in_days.is_some_and(|d| d < 0) {
        return Err(AppError::Core(CoreError::Validation(
            "expires_in_days must not be negative".into(),
        )));
    }

    let ttl = state.config.access_code.code_ttl(input.expires_in_days);
    let (quote, issued) = access::publish_quote(&state.pool, quote_id, ttl).await?;

    let email_sent = if input.send_email.unwrap_or(true) {
        notifications::deliver_access_code(&state, &quote, &issued).await
    } else {
        false
    };

    tracing::info!(quote_id, user_id = admin.user_id, email_sent, "Access code issued");

    Ok(Json(DataResponse {
        data: PublishResponse {
            quote,
            access_code: issued,
            email_sent,
        },
    }))
}

/// POST /api/v1/quotes/{id}/access-code/revoke
pub async fn revoke_access_code(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Path(quote_id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let revoked = access::revoke_access_code(&state.pool, quote_id).await?;
    tracing::info!(quote_id, user_id = admin.user_id, "Access code revoked by admin");
    Ok(Json(DataResponse { data: revoked }))
}

/// GET /api/v1/quotes/{id}/actions
///
/// The client action log, oldest first.
pub async fn list_actions(
    _user: AuthUser,
    State(state): State<AppState>,
    Path(quote_id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    find_quote(&state, quote_id).await?;
    let actions = ClientActionRepo::list_by_quote(&state.pool, quote_id).await?;
    Ok(Json(DataResponse { data: actions }))
}
