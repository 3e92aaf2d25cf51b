//! Payment provider webhook processing.

use chrono::Duration;
use sqlx::PgPool;
use quoteflow_core::access_code::generate_access_code;
use quoteflow_core::quote_status::{self, STATUS_PUBLISHED};
use quoteflow_core::webhook::EVENT_CHECKOUT_COMPLETED;

use crate::access;
use crate::error::ServiceError;
use crate::models::access_code::IssuedAccessCode;
use crate::models::payment_event::PaymentWebhookBody;
use crate::models::quote::Quote;
use crate::repositories::{PaymentEventRepo, QuoteRepo};

/// What processing a webhook event did.
#[derive(Debug, Clone)]
pub enum PaymentOutcome {
    /// The event id was seen before; nothing changed.
    Duplicate,
    /// Recorded; no code issued (other event type, no quote, or a quote
    /// that can no longer be published).
    Recorded,
    /// Recorded and an access code was issued for the quote.
    CodeIssued {
        quote: Quote,
        issued: IssuedAccessCode,
    },
}

/// Record a verified webhook event and, for a completed checkout, publish
/// the referenced quote with a fresh access code.
///
/// Recording and publishing share one transaction. The event is
/// deduplicated on its provider id, so a redelivered event never issues a
/// second code; a publish that fails leaves no record behind, so the
/// provider's retry is processed in full.
pub async fn process_payment_event(
    pool: &PgPool,
    body: &PaymentWebhookBody,
    payload: &serde_json::Value,
    code_ttl: Option<Duration>,
) -> Result<PaymentOutcome, ServiceError> {
    if body.event_id.trim().is_empty() {
        return Err(ServiceError::Validation("event_id must not be empty".into()));
    }

    let mut tx = pool.begin().await?;
    let quote = match body.quote_id {
        Some(id) => QuoteRepo::find_for_update(&mut *tx, id).await?,
        None => None,
    };
    let recorded = PaymentEventRepo::record(
        &mut *tx,
        &body.event_id,
        &body.event_type,
        quote.as_ref().map(|q| q.id),
        payload,
    )
    .await?;
    if recorded.is_none() {
        tracing::info!(event_id = %body.event_id, "Duplicate payment event ignored");
        return Ok(PaymentOutcome::Duplicate);
    }

    if body.event_type != EVENT_CHECKOUT_COMPLETED {
        tx.commit().await?;
        return Ok(PaymentOutcome::Recorded);
    }
    let Some(quote) = quote else {
        tracing::warn!(event_id = %body.event_id, quote_id = ?body.quote_id, "Checkout event without a known quote");
        tx.commit().await?;
        return Ok(PaymentOutcome::Recorded);
    };
    if quote_status::validate_transition(&quote.status, STATUS_PUBLISHED).is_err() {
        tracing::warn!(quote_id = quote.id, status = %quote.status, "Checkout for a quote that cannot be published");
        tx.commit().await?;
        return Ok(PaymentOutcome::Recorded);
    }

    let (quote, issued) =
        access::publish_on(&mut tx, quote.id, code_ttl, generate_access_code).await?;
    tx.commit().await?;
    Ok(PaymentOutcome::CodeIssued { quote, issued })
}
