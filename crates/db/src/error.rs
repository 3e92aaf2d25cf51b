use quoteflow_core::access_code::AccessCodeFailure;
use quoteflow_core::types::DbId;

/// Error type for multi-step operations that span several repositories.
///
/// Single-table repository functions return `sqlx::Error` directly.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("{entity} with id {id} not found")]
    NotFound { entity: &'static str, id: DbId },

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    /// A presented access code does not grant access.
    #[error("Access denied: {}", .0.as_str())]
    AccessDenied(AccessCodeFailure),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl ServiceError {
    pub fn not_found(entity: &'static str, id: DbId) -> Self {
        Self::NotFound { entity, id }
    }
}
