//! Delivery project model.

use serde::Serialize;
use sqlx::FromRow;
use quoteflow_core::types::{DbId, Timestamp};

/// A row from the `projects` table. One per approved quote.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Project {
    pub id: DbId,
    pub quote_id: DbId,
    pub name: String,
    pub status: String,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}
