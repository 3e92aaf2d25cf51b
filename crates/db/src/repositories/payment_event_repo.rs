//! Repository for the `payment_events` table.

use sqlx::PgExecutor;
use quoteflow_core::types::DbId;

use crate::models::payment_event::PaymentEvent;

const COLUMNS: &str = "id, provider_event_id, event_type, quote_id, payload, received_at";

/// Records payment provider webhooks, deduplicated on the provider's event id.
pub struct PaymentEventRepo;

impl PaymentEventRepo {
    /// Store an event. Returns `None` if the event id was already recorded.
    pub async fn record<'e>(
        executor: impl PgExecutor<'e>,
        provider_event_id: &str,
        event_type: &str,
        quote_id: Option<DbId>,
        payload: &serde_json::Value,
    ) -> Result<Option<PaymentEvent>, sqlx::Error> {
        let query = format!(
            "INSERT INTO payment_events (provider_event_id, event_type, quote_id, payload)
             VALUES ($1, $2, $3, $4)
             ON CONFLICT ON CONSTRAINT uq_payment_events_provider_event_id DO NOTHING
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, PaymentEvent>(&query)
            .bind(provider_event_id)
            .bind(event_type)
            .bind(quote_id)
            .bind(payload)
            .fetch_optional(executor)
            .await
    }
}
