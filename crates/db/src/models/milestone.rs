//! Milestone entity model and DTOs.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use quoteflow_core::pricing::MilestoneLine;
use quoteflow_core::types::{DbId, Timestamp};

/// A row from the `milestones` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Milestone {
    pub id: DbId,
    pub deliverable_id: DbId,
    pub title: String,
    pub description: Option<String>,
    pub sort_order: i32,
    pub status: String,
    pub hours: f64,
    pub is_billable: bool,
    pub client_rate: Option<f64>,
    pub cost_rate: Option<f64>,
    pub due_date: Option<chrono::NaiveDate>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Milestone {
    pub fn line(&self) -> MilestoneLine {
        MilestoneLine {
            hours: Some(self.hours),
            is_billable: self.is_billable,
            client_rate: self.client_rate,
            cost_rate: self.cost_rate,
        }
    }
}

/// DTO for creating a milestone. `deliverable_id` comes from the URL path.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateMilestone {
    pub title: String,
    pub description: Option<String>,
    pub sort_order: Option<i32>,
    pub status: Option<String>,
    pub hours: Option<f64>,
    pub is_billable: Option<bool>,
    pub client_rate: Option<f64>,
    pub cost_rate: Option<f64>,
    pub due_date: Option<chrono::NaiveDate>,
}

/// DTO for updating a milestone. All fields optional.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateMilestone {
    pub title: Option<String>,
    pub description: Option<String>,
    pub sort_order: Option<i32>,
    pub status: Option<String>,
    pub hours: Option<f64>,
    pub is_billable: Option<bool>,
    pub client_rate: Option<f64>,
    pub cost_rate: Option<f64>,
    pub due_date: Option<chrono::NaiveDate>,
}
