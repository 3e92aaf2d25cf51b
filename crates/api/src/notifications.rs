//! Best-effort delivery of access codes to quote contacts.

use quoteflow_db::models::access_code::IssuedAccessCode;
use quoteflow_db::models::quote::Quote;
use quoteflow_events::AccessCodeEmail;

use crate::state::AppState;

/// Email a freshly issued code to the quote's contact.
///
/// Returns whether the email was sent. A missing mailer, a quote without a
/// contact email, or a delivery failure all return `false`; the issued code
/// stays valid either way.
pub async fn deliver_access_code(state: &AppState, quote: &Quote, issued: &IssuedAccessCode) -> bool {
    let Some(mailer) = state.mailer.as_ref() else {
        tracing::debug!(quote_id = quote.id, "Mailer not configured, skipping access code email");
        return false;
    };
    let Some(to) = quote.contact_email.as_deref().filter(|e| !e.trim().is_empty()) else {
        tracing::warn!(quote_id = quote.id, "Quote has no contact email, access code not sent");
        return false;
    };

    let email = AccessCodeEmail {
        to: to.to_string(),
        contact_name: quote.contact_name.clone(),
        quote_number: quote.quote_number.clone(),
        quote_title: quote.title.clone(),
        code: issued.code.clone(),
        portal_url: state.config.client_portal_url.clone(),
        expires_at: issued.expires_at,
    };

    match mailer.send_access_code(&email).await {
        Ok(()) => true,
        Err(e) => {
            tracing::warn!(quote_id = quote.id, error = %e, "Failed to send access code email");
            false
        }
    }
}
