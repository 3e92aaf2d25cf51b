use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use quoteflow_core::error::CoreError;
use quoteflow_db::ServiceError;
use serde_json::json;

/// Error returned by every handler and extractor.
///
/// Rendered as `{"error": <message>, "code": <CODE>}`. Internal failures
/// are logged in full and answered with a generic message.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Internal error: {0}")]
    InternalError(String),
}

pub type AppResult<T> = Result<T, AppError>;

const INTERNAL_MESSAGE: &str = "An internal error occurred";

impl From<ServiceError> for AppError {
    fn from(err: ServiceError) -> Self {
        let core = match err {
            ServiceError::NotFound { entity, id } => CoreError::NotFound { entity, id },
            ServiceError::Validation(msg) => CoreError::Validation(msg),
            ServiceError::Conflict(msg) => CoreError::Conflict(msg),
            // The client sees why the code failed, never which row matched.
            ServiceError::AccessDenied(failure) => {
                CoreError::Unauthorized(failure.user_message().to_string())
            }
            ServiceError::Database(err) => return AppError::Database(err),
        };
        AppError::Core(core)
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::Core(CoreError::Validation(rejection.body_text()))
    }
}

impl AppError {
    /// Status, machine-readable code, and user-facing message.
    fn parts(&self) -> (StatusCode, &'static str, String) {
        match self {
            AppError::Core(core) => core_parts(core),
            AppError::Database(err) => classify_sqlx_error(err),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg.clone()),
            AppError::InternalError(msg) => {
                tracing::error!(error = %msg, "Internal error");
                internal()
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = self.parts();
        (status, Json(json!({ "error": message, "code": code }))).into_response()
    }
}

fn internal() -> (StatusCode, &'static str, String) {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        "INTERNAL_ERROR",
        INTERNAL_MESSAGE.to_string(),
    )
}

fn core_parts(err: &CoreError) -> (StatusCode, &'static str, String) {
    match err {
        CoreError::NotFound { entity, id } => (
            StatusCode::NOT_FOUND,
            "NOT_FOUND",
            format!("{entity} with id {id} not found"),
        ),
        CoreError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
        CoreError::Conflict(msg) => (StatusCode::CONFLICT, "CONFLICT", msg.clone()),
        CoreError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED", msg.clone()),
        CoreError::Forbidden(msg) => (StatusCode::FORBIDDEN, "FORBIDDEN", msg.clone()),
        CoreError::RateLimited(msg) => {
            (StatusCode::TOO_MANY_REQUESTS, "RATE_LIMITED", msg.clone())
        }
        CoreError::Internal(msg) => {
            tracing::error!(error = %msg, "Internal core error");
            internal()
        }
    }
}

/// Message for a unique violation on one of our `uq_` constraints.
fn conflict_message(constraint: &str) -> String {
    match constraint {
        "uq_users_email" => "An account with this email already exists".to_string(),
        "uq_access_codes_active_quote" => {
            "This quote already has an active access code".to_string()
        }
        "uq_quote_versions_quote_number" => {
            "Another version was created at the same time. Reload and try again".to_string()
        }
        "uq_projects_quote_id" => "A project already exists for this quote".to_string(),
        other => format!("Duplicate value violates unique constraint: {other}"),
    }
}

/// `RowNotFound` is 404 and a unique violation (23505) on a `uq_`
/// constraint is 409. Anything else is a sanitized 500.
fn classify_sqlx_error(err: &sqlx::Error) -> (StatusCode, &'static str, String) {
    match err {
        sqlx::Error::RowNotFound => (
            StatusCode::NOT_FOUND,
            "NOT_FOUND",
            "Resource not found".to_string(),
        ),
        sqlx::Error::Database(db_err)
            if db_err.code().as_deref() == Some("23505")
                && db_err.constraint().is_some_and(|c| c.starts_with("uq_")) =>
        {
            let constraint = db_err.constraint().unwrap_or_default();
            tracing::info!(constraint, "Unique constraint conflict");
            (StatusCode::CONFLICT, "CONFLICT", conflict_message(constraint))
        }
        other => {
            tracing::error!(error = %other, "Database error");
            internal()
        }
    }
}
