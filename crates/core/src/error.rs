use crate::types::DbId;

/// Domain failures shared by every quoteflow crate.
///
/// The HTTP layer maps each variant to one status: 404, 400, 409, 401, 403,
/// 429 and 500 in declaration order.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("{entity} with id {id} not found")]
    NotFound { entity: &'static str, id: DbId },

    /// Malformed or missing input. Retrying unchanged will fail again.
    #[error("Invalid input: {0}")]
    Validation(String),

    /// The request clashes with current state, e.g. editing a superseded
    /// version or deciding an already-decided quote.
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Missing, expired or rejected credentials (admin token, access code,
    /// or client session).
    #[error("Not authenticated: {0}")]
    Unauthorized(String),

    #[error("Not allowed: {0}")]
    Forbidden(String),

    #[error("Rate limited: {0}")]
    RateLimited(String),

    #[error("Internal error: {0}")]
    Internal(String),
}
