//! Payment provider webhook event model.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use quoteflow_core::types::{DbId, Timestamp};

/// A row from the `payment_events` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct PaymentEvent {
    pub id: DbId,
    pub provider_event_id: String,
    pub event_type: String,
    pub quote_id: Option<DbId>,
    pub payload: serde_json::Value,
    pub received_at: Timestamp,
}

/// The fields of a webhook body the core relies on.
#[derive(Debug, Clone, Deserialize)]
pub struct PaymentWebhookBody {
    pub event_id: String,
    pub event_type: String,
    pub quote_id: Option<DbId>,
}
