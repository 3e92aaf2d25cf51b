//! Inbound payment provider webhook.
//!
//! The raw body is verified against `x-payment-signature` (hex
//! HMAC-SHA256 under `PAYMENT_WEBHOOK_SECRET`) before it is parsed.

use axum::body::Bytes;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::Json;
use quoteflow_core::error::CoreError;
use quoteflow_core::webhook::verify_signature;
use quoteflow_db::models::payment_event::PaymentWebhookBody;
use quoteflow_db::payments::{self, PaymentOutcome};
use serde::Serialize;

use crate::error::{AppError, AppResult};
use crate::notifications;
use crate::response::DataResponse;
use crate::state::AppState;

/// Header carrying the provider's signature.
pub const SIGNATURE_HEADER: &str = "x-payment-signature";

/// Acknowledgement returned to the provider.
#[derive(Debug, Serialize)]
pub struct WebhookAck {
    /// `duplicate`, `recorded`, or `code_issued`.
    pub status: &'static str,
    pub email_sent: bool,
}

/// POST /api/v1/webhooks/payment
pub async fn payment(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> AppResult<Json<DataResponse<WebhookAck>>> {
    let secret = state
        .config
        .payment_webhook_secret
        .as_deref()
        .ok_or_else(|| AppError::InternalError("Payment webhook secret is not configured".into()))?;

    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();
    if !verify_signature(secret, &body, signature) {
        tracing::warn!("Payment webhook signature rejected");
        return Err(AppError::Core(CoreError::Unauthorized(
            "Invalid webhook signature".into(),
        )));
    }

    let payload: serde_json::Value = serde_json::from_slice(&body)
        .map_err(|e| AppError::BadRequest(format!("Invalid JSON body: {e}")))?;
    let event: PaymentWebhookBody = serde_json::from_value(payload.clone())
        .map_err(|e| AppError::BadRequest(format!("Invalid webhook event: {e}")))?;

    let ttl = state.config.access_code.code_ttl(None);
    let outcome = payments::process_payment_event(&state.pool, &event, &payload, ttl).await?;

    let ack = match outcome {
        PaymentOutcome::Duplicate => WebhookAck {
            status: "duplicate",
            email_sent: false,
        },
        PaymentOutcome::Recorded => WebhookAck {
            status: "recorded",
            email_sent: false,
        },
        PaymentOutcome::CodeIssued { quote, issued } => {
            let email_sent = notifications::deliver_access_code(&state, &quote, &issued).await;
            tracing::info!(
                quote_id = quote.id,
                event_id = %event.event_id,
                email_sent,
                "Access code issued from payment",
            );
            WebhookAck {
                status: "code_issued",
                email_sent,
            }
        }
    };

    Ok(Json(DataResponse { data: ack }))
}
