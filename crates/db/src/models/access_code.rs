//! Access code model and DTOs.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use quoteflow_core::access_code::CodeState;
use quoteflow_core::types::{DbId, Timestamp};

/// A row from the `access_codes` table. Holds only the code's hash.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct AccessCode {
    pub id: DbId,
    pub quote_id: DbId,
    #[serde(skip_serializing)]
    pub code_hash: String,
    pub expires_at: Option<Timestamp>,
    pub revoked_at: Option<Timestamp>,
    pub last_used_at: Option<Timestamp>,
    pub use_count: i32,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl AccessCode {
    pub fn state(&self) -> CodeState {
        CodeState {
            expires_at: self.expires_at,
            revoked_at: self.revoked_at,
        }
    }
}

/// Request body for publishing a quote.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PublishRequest {
    /// Override the configured code lifetime. `0` issues a non-expiring code.
    pub expires_in_days: Option<i64>,
    /// Email the code to the quote's contact (default `true`).
    pub send_email: Option<bool>,
}

/// Returned once, at issuance. The plaintext is not retrievable afterwards.
#[derive(Debug, Clone, Serialize)]
pub struct IssuedAccessCode {
    pub access_code_id: DbId,
    pub quote_id: DbId,
    pub code: String,
    pub expires_at: Option<Timestamp>,
    /// `true` when an existing active code was rewritten in place.
    pub rotated: bool,
}
