//! Deliverable entity model and DTOs.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use quoteflow_core::pricing::{DeliverableDefaults, DeliverableLine, PricingMode};
use quoteflow_core::types::{DbId, Timestamp};

/// A row from the `deliverables` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Deliverable {
    pub id: DbId,
    pub quote_version_id: DbId,
    pub title: String,
    pub description: Option<String>,
    pub sort_order: i32,
    pub status: String,
    pub pricing_mode: String,
    pub fixed_price_ex_gst: Option<f64>,
    pub default_client_rate: Option<f64>,
    pub default_hours: Option<f64>,
    pub total_hours: f64,
    pub total_cost: f64,
    pub client_value: f64,
    pub margin: f64,
    pub margin_percent: Option<f64>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Deliverable {
    /// Parsed pricing mode. The column is CHECK-constrained, so unknown
    /// values only arise from manual edits and fall back to roll-up pricing.
    pub fn mode(&self) -> PricingMode {
        PricingMode::parse(&self.pricing_mode).unwrap_or_default()
    }

    pub fn defaults(&self) -> DeliverableDefaults {
        DeliverableDefaults {
            pricing_mode: self.mode(),
            fixed_price_ex_gst: self.fixed_price_ex_gst,
            default_client_rate: self.default_client_rate,
            default_hours: self.default_hours,
        }
    }

    pub fn line(&self) -> DeliverableLine {
        DeliverableLine {
            pricing_mode: self.mode(),
            fixed_price_ex_gst: self.fixed_price_ex_gst,
            default_client_rate: self.default_client_rate,
            total_hours: Some(self.total_hours),
        }
    }
}

/// DTO for creating a deliverable.
///
/// `quote_version_id` comes from the URL path. Omitted fields default to
/// draft status, roll-up pricing, and the next sort order in the version.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateDeliverable {
    pub title: String,
    pub description: Option<String>,
    pub sort_order: Option<i32>,
    pub status: Option<String>,
    pub pricing_mode: Option<String>,
    pub fixed_price_ex_gst: Option<f64>,
    pub default_client_rate: Option<f64>,
    pub default_hours: Option<f64>,
}

/// DTO for updating a deliverable. All fields optional.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateDeliverable {
    pub title: Option<String>,
    pub description: Option<String>,
    pub sort_order: Option<i32>,
    pub status: Option<String>,
    pub pricing_mode: Option<String>,
    pub fixed_price_ex_gst: Option<f64>,
    pub default_client_rate: Option<f64>,
    pub default_hours: Option<f64>,
}
