//! Client portal handlers: access-code entry, the quote view, actions, and
//! logout.
//!
//! The client view is a projection of the current version that leaves out
//! internal cost rates, costs, and margins.

use axum::extract::State;
use axum::http::header::SET_COOKIE;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use chrono::Utc;
use quoteflow_core::error::CoreError;
use quoteflow_core::rate_limit::rate_limit_key;
use quoteflow_core::types::{DbId, Timestamp};
use quoteflow_db::decisions;
use quoteflow_db::lifecycle;
use quoteflow_db::models::client_action::ClientActionRequest;
use quoteflow_db::models::deliverable::Deliverable;
use quoteflow_db::models::milestone::Milestone;
use quoteflow_db::models::quote_version::{DeliverableWithMilestones, QuoteVersion};
use quoteflow_db::repositories::QuoteRepo;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};
use crate::extract::AppJson;
use crate::middleware::client::{clear_session_cookie, session_cookie, ClientIp, ClientSession};
use crate::response::{created, DataResponse};
use crate::state::AppState;

/// Rate-limit bucket for access-code attempts.
const ACCESS_CODE_ACTION: &str = "access_code";

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

/// Request body for `POST /client/access`.
#[derive(Debug, Deserialize)]
pub struct AccessRequest {
    pub code: String,
}

/// Response for a successful access-code entry. The session itself travels
/// in the cookie.
#[derive(Debug, Serialize)]
pub struct AccessGranted {
    pub quote_id: DbId,
    pub session_expires_at: Timestamp,
}

#[derive(Debug, Serialize)]
pub struct ClientMilestoneView {
    pub id: DbId,
    pub title: String,
    pub description: Option<String>,
    pub sort_order: i32,
    pub hours: f64,
    pub is_billable: bool,
    pub client_rate: Option<f64>,
    pub due_date: Option<chrono::NaiveDate>,
}

impl From<Milestone> for ClientMilestoneView {
    fn from(m: Milestone) -> Self {
        Self {
            id: m.id,
            title: m.title,
            description: m.description,
            sort_order: m.sort_order,
            hours: m.hours,
            is_billable: m.is_billable,
            client_rate: m.client_rate,
            due_date: m.due_date,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ClientDeliverableView {
    pub id: DbId,
    pub title: String,
    pub description: Option<String>,
    pub sort_order: i32,
    pub pricing_mode: String,
    pub total_hours: f64,
    /// Ex-GST price of this deliverable.
    pub price: f64,
    pub milestones: Vec<ClientMilestoneView>,
}

impl From<DeliverableWithMilestones> for ClientDeliverableView {
    fn from(item: DeliverableWithMilestones) -> Self {
        let Deliverable {
            id,
            title,
            description,
            sort_order,
            pricing_mode,
            total_hours,
            client_value,
            ..
        } = item.deliverable;
        Self {
            id,
            title,
            description,
            sort_order,
            pricing_mode,
            total_hours,
            price: client_value,
            milestones: item.milestones.into_iter().map(Into::into).collect(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ClientVersionView {
    pub version_number: i32,
    pub notes: Option<String>,
    pub gst_enabled: bool,
    pub gst_rate: f64,
    pub tax_inclusive: bool,
    pub subtotal: f64,
    pub tax_amount: f64,
    pub total: f64,
}

impl From<QuoteVersion> for ClientVersionView {
    fn from(v: QuoteVersion) -> Self {
        Self {
            version_number: v.version_number,
            notes: v.notes,
            gst_enabled: v.gst_enabled,
            gst_rate: v.gst_rate,
            tax_inclusive: v.tax_inclusive,
            subtotal: v.subtotal,
            tax_amount: v.tax_amount,
            total: v.total,
        }
    }
}

/// What a client sees of their quote.
#[derive(Debug, Serialize)]
pub struct ClientQuoteView {
    pub quote_id: DbId,
    pub quote_number: String,
    pub title: String,
    pub status: String,
    pub contact_name: Option<String>,
    pub version: ClientVersionView,
    pub deliverables: Vec<ClientDeliverableView>,
}

/// Result of a client action, without internal quote fields.
#[derive(Debug, Serialize)]
pub struct ClientActionResult {
    pub action: String,
    pub status: String,
    pub recorded_at: Timestamp,
    pub project_id: Option<DbId>,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// POST /api/v1/client/access
///
/// Exchange an access code for a session cookie. Attempts are limited per
/// client address; over the limit the code is not even looked up.
pub async fn access(
    State(state): State<AppState>,
    ClientIp(ip): ClientIp,
    AppJson(input): AppJson<AccessRequest>,
) -> AppResult<impl IntoResponse> {
    let decision = state
        .rate_limiter
        .check(&rate_limit_key(ACCESS_CODE_ACTION, &ip));
    if !decision.allowed {
        tracing::warn!(client_ip = %ip, "Access code attempts rate limited");
        return Err(AppError::Core(CoreError::RateLimited(
            "Too many attempts. Please wait a minute and try again".into(),
        )));
    }

    let code = quoteflow_db::access::validate_access_code(&state.pool, &input.code, Utc::now())
        .await?;

    let ttl = state.config.session.ttl();
    let token = state.sessions.encode(code.id, ttl);
    let cookie = session_cookie(&state.config.session, &token);

    tracing::info!(
        quote_id = code.quote_id,
        access_code_id = code.id,
        remaining = decision.remaining,
        "Client session started",
    );

    Ok((
        [(SET_COOKIE, cookie)],
        Json(DataResponse {
            data: AccessGranted {
                quote_id: code.quote_id,
                session_expires_at: Utc::now() + ttl,
            },
        }),
    ))
}

/// GET /api/v1/client/quote
///
/// The current version of the session's quote, without cost or margin
/// figures.
pub async fn get_quote(
    session: ClientSession,
    State(state): State<AppState>,
) -> AppResult<Json<DataResponse<ClientQuoteView>>> {
    let quote = QuoteRepo::find_by_id(&state.pool, session.quote_id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Quote",
            id: session.quote_id,
        }))?;
    let detail = lifecycle::load_current_version_detail(&state.pool, quote.id).await?;

    Ok(Json(DataResponse {
        data: ClientQuoteView {
            quote_id: quote.id,
            quote_number: quote.quote_number,
            title: quote.title,
            status: quote.status,
            contact_name: quote.contact_name,
            version: detail.version.into(),
            deliverables: detail.deliverables.into_iter().map(Into::into).collect(),
        },
    }))
}

/// POST /api/v1/client/quote/actions
///
/// Record `viewed`, `note`, `approve`, or `reject` for the session's quote.
pub async fn post_action(
    session: ClientSession,
    State(state): State<AppState>,
    AppJson(input): AppJson<ClientActionRequest>,
) -> AppResult<impl IntoResponse> {
    let outcome = decisions::record_client_action(&state.pool, session.quote_id, &input).await?;

    Ok(created(ClientActionResult {
        action: outcome.action.action,
        status: outcome.quote.status,
        recorded_at: outcome.action.created_at,
        project_id: outcome.project.map(|p| p.id),
    }))
}

/// POST /api/v1/client/logout
///
/// Clears the session cookie. Works with or without a valid session.
pub async fn logout(State(state): State<AppState>) -> impl IntoResponse {
    (
        StatusCode::NO_CONTENT,
        [(SET_COOKIE, clear_session_cookie(&state.config.session))],
    )
}
