//! Quote version entity model and DTOs.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use quoteflow_core::pricing::GstConfig;
use quoteflow_core::types::{DbId, Timestamp};

use crate::models::deliverable::Deliverable;
use crate::models::milestone::Milestone;

/// A row from the `quote_versions` table.
///
/// `subtotal`, `tax_amount` and `total` are derived; only the recompute
/// step writes them.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct QuoteVersion {
    pub id: DbId,
    pub quote_id: DbId,
    pub version_number: i32,
    pub notes: Option<String>,
    pub gst_enabled: bool,
    pub gst_rate: f64,
    pub tax_inclusive: bool,
    pub subtotal: f64,
    pub tax_amount: f64,
    pub total: f64,
    pub totals_computed_at: Option<Timestamp>,
    pub cloned_from_id: Option<DbId>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl QuoteVersion {
    pub fn gst_config(&self) -> GstConfig {
        GstConfig {
            gst_enabled: self.gst_enabled,
            gst_rate: self.gst_rate,
        }
    }
}

/// Insert payload for a version. Built internally, never deserialized.
#[derive(Debug, Clone)]
pub struct NewQuoteVersion {
    pub quote_id: DbId,
    pub version_number: i32,
    pub notes: Option<String>,
    pub gst_enabled: bool,
    pub gst_rate: f64,
    pub tax_inclusive: bool,
    pub cloned_from_id: Option<DbId>,
}

/// DTO for changing a version's pricing configuration. All fields optional.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateQuoteVersion {
    pub gst_enabled: Option<bool>,
    pub gst_rate: Option<f64>,
    pub tax_inclusive: Option<bool>,
    pub notes: Option<String>,
}

/// Request body for cloning a version.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CloneVersionRequest {
    /// Version to copy; defaults to the quote's current version.
    pub source_version_id: Option<DbId>,
}

/// A deliverable together with its ordered milestones.
#[derive(Debug, Clone, Serialize)]
pub struct DeliverableWithMilestones {
    #[serde(flatten)]
    pub deliverable: Deliverable,
    pub milestones: Vec<Milestone>,
}

/// A version with its full deliverable/milestone tree.
#[derive(Debug, Clone, Serialize)]
pub struct VersionDetail {
    pub version: QuoteVersion,
    pub is_current: bool,
    pub deliverables: Vec<DeliverableWithMilestones>,
}
