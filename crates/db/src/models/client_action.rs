//! Client action log model and DTOs.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use quoteflow_core::types::{DbId, Timestamp};

/// A row from the append-only `client_actions` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ClientAction {
    pub id: DbId,
    pub quote_id: DbId,
    pub quote_version_id: Option<DbId>,
    pub action: String,
    pub client_name: Option<String>,
    pub note: Option<String>,
    pub created_at: Timestamp,
}

/// Request body for `POST /client/quote/actions`.
#[derive(Debug, Clone, Deserialize)]
pub struct ClientActionRequest {
    /// One of `approve`, `reject`, `note`, `viewed`.
    pub action: String,
    pub client_name: Option<String>,
    pub note: Option<String>,
}
