use axum::extract::State;
use axum::http::StatusCode;
use axum::{routing::get, Json, Router};
use serde::Serialize;

use crate::state::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    /// `ok`, or `degraded` when Postgres does not answer.
    pub status: &'static str,
    pub version: &'static str,
    pub database: bool,
    /// Whether access codes can be emailed; publishing works either way.
    pub email: bool,
    pub payment_webhook: bool,
}

/// GET /health
///
/// 200 when the database answers, 503 otherwise. Email and webhook flags
/// only describe configuration and never degrade the status.
async fn health_check(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let database = quoteflow_db::health_check(&state.pool).await.is_ok();
    if !database {
        tracing::warn!("Health check: database unreachable");
    }

    let (code, status) = if database {
        (StatusCode::OK, "ok")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "degraded")
    };

    let body = HealthResponse {
        status,
        version: env!("CARGO_PKG_VERSION"),
        database,
        email: state.mailer.is_some(),
        payment_webhook: state.config.payment_webhook_secret.is_some(),
    };
    (code, Json(body))
}

pub fn router() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}
