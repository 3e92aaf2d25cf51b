//! Quote entity model and DTOs.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use quoteflow_core::types::{DbId, Timestamp};

/// A row from the `quotes` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Quote {
    pub id: DbId,
    pub quote_number: String,
    pub title: String,
    pub status: String,
    pub organization_id: Option<DbId>,
    pub contact_id: Option<DbId>,
    pub contact_name: Option<String>,
    pub contact_email: Option<String>,
    pub last_version_number: i32,
    pub created_by: Option<DbId>,
    pub published_at: Option<Timestamp>,
    pub decided_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for creating a quote. Version 1 is created alongside it.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateQuote {
    pub title: String,
    pub organization_id: Option<DbId>,
    pub contact_id: Option<DbId>,
    pub contact_name: Option<String>,
    pub contact_email: Option<String>,
    /// GST settings for version 1; defaults to enabled at the standard rate.
    pub gst_enabled: Option<bool>,
    pub gst_rate: Option<f64>,
    pub tax_inclusive: Option<bool>,
    pub notes: Option<String>,
}
