//! Access-code issuance, rotation, revocation, and validation.
//!
//! A quote has at most one non-revoked code. Reissuing rewrites that row
//! with a fresh hash, so the previous plaintext stops working at once and
//! no second active code ever exists.

use chrono::{Duration, Utc};
use sqlx::{Connection, PgConnection, PgPool};
use quoteflow_core::access_code::{
    self, generate_access_code, hash_access_code, AccessCodeFailure, GeneratedAccessCode,
    MAX_ISSUE_ATTEMPTS,
};
use quoteflow_core::quote_status::{self, STATUS_PUBLISHED};
use quoteflow_core::types::{DbId, Timestamp};

use crate::error::ServiceError;
use crate::is_unique_violation;
use crate::models::access_code::{AccessCode, IssuedAccessCode};
use crate::models::quote::Quote;
use crate::repositories::{AccessCodeRepo, QuoteRepo};

const CODE_HASH_CONSTRAINT: &str = "uq_access_codes_code_hash";

/// Publish (or republish) a quote and issue its access code.
///
/// `expires_in` of `None` issues a code without expiry. The quote row is
/// locked for the duration, so concurrent publishes of one quote queue up.
pub async fn publish_quote(
    pool: &PgPool,
    quote_id: DbId,
    expires_in: Option<Duration>,
) -> Result<(Quote, IssuedAccessCode), ServiceError> {
    let mut tx = pool.begin().await?;
    let (quote, issued) = publish_on(&mut tx, quote_id, expires_in, generate_access_code).await?;
    tx.commit().await?;

    tracing::info!(
        quote_id,
        access_code_id = issued.access_code_id,
        rotated = issued.rotated,
        "Quote published",
    );
    Ok((quote, issued))
}

/// [`publish_quote`] inside a transaction the caller owns, drawing codes
/// from `generate`.
///
/// Nothing is committed here. Callers that must record something together
/// with the publish (a payment event, say) do so on the same connection.
pub async fn publish_on(
    conn: &mut PgConnection,
    quote_id: DbId,
    expires_in: Option<Duration>,
    generate: impl FnMut() -> GeneratedAccessCode,
) -> Result<(Quote, IssuedAccessCode), ServiceError> {
    let quote = QuoteRepo::find_for_update(&mut *conn, quote_id)
        .await?
        .ok_or_else(|| ServiceError::not_found("Quote", quote_id))?;
    quote_status::validate_transition(&quote.status, STATUS_PUBLISHED)
        .map_err(ServiceError::Conflict)?;

    let expires_at = expires_in.map(|ttl| Utc::now() + ttl);
    let issued = issue_code(&mut *conn, quote_id, expires_at, generate).await?;
    let quote = QuoteRepo::mark_published(&mut *conn, quote_id).await?;
    Ok((quote, issued))
}

/// Write a fresh code for `quote_id`, replacing the active one if present.
///
/// Each attempt runs in a savepoint; a hash collision rolls the attempt
/// back and retries with a new code, up to [`MAX_ISSUE_ATTEMPTS`].
async fn issue_code(
    conn: &mut PgConnection,
    quote_id: DbId,
    expires_at: Option<Timestamp>,
    mut generate: impl FnMut() -> GeneratedAccessCode,
) -> Result<IssuedAccessCode, ServiceError> {
    let existing = AccessCodeRepo::find_active_for_quote(&mut *conn, quote_id).await?;

    for attempt in 1..=MAX_ISSUE_ATTEMPTS {
        let generated = generate();
        let mut savepoint = conn.begin().await?;
        let written = match &existing {
            Some(active) => {
                AccessCodeRepo::rotate(&mut *savepoint, active.id, &generated.hash, expires_at)
                    .await
            }
            None => {
                AccessCodeRepo::insert(&mut *savepoint, quote_id, &generated.hash, expires_at)
                    .await
            }
        };

        match written {
            Ok(row) => {
                savepoint.commit().await?;
                return Ok(IssuedAccessCode {
                    access_code_id: row.id,
                    quote_id,
                    code: access_code::format_for_display(&generated.plaintext),
                    expires_at: row.expires_at,
                    rotated: existing.is_some(),
                });
            }
            Err(err) if is_unique_violation(&err, CODE_HASH_CONSTRAINT) => {
                savepoint.rollback().await?;
                tracing::warn!(quote_id, attempt, "Access code hash collision, retrying");
            }
            Err(err) => return Err(err.into()),
        }
    }

    Err(ServiceError::Conflict(format!(
        "Could not issue a unique access code after {MAX_ISSUE_ATTEMPTS} attempts"
    )))
}

/// Revoke the quote's active code.
pub async fn revoke_access_code(pool: &PgPool, quote_id: DbId) -> Result<AccessCode, ServiceError> {
    QuoteRepo::find_by_id(pool, quote_id)
        .await?
        .ok_or_else(|| ServiceError::not_found("Quote", quote_id))?;
    let revoked = AccessCodeRepo::revoke_active_for_quote(pool, quote_id)
        .await?
        .ok_or_else(|| {
            ServiceError::Conflict(format!("Quote {quote_id} has no active access code"))
        })?;
    tracing::info!(quote_id, access_code_id = revoked.id, "Access code revoked");
    Ok(revoked)
}

/// Check a code a client typed in and record the successful use.
///
/// Formatting differences (case, spaces, dashes) are ignored. Failures are
/// reported as [`ServiceError::AccessDenied`] with the reason.
pub async fn validate_access_code(
    pool: &PgPool,
    input: &str,
    now: Timestamp,
) -> Result<AccessCode, ServiceError> {
    let normalized = access_code::validate_code_input(input).map_err(ServiceError::Validation)?;
    let row = AccessCodeRepo::find_by_hash(pool, &hash_access_code(&normalized)).await?;

    if let Err(failure) = access_code::classify(row.as_ref().map(AccessCode::state), now) {
        tracing::info!(reason = failure.as_str(), "Access code rejected");
        return Err(ServiceError::AccessDenied(failure));
    }
    let Some(row) = row else {
        return Err(ServiceError::AccessDenied(AccessCodeFailure::Invalid));
    };

    AccessCodeRepo::record_use(pool, row.id).await?;
    Ok(row)
}

/// Resolve the access code a client session was minted from and check that
/// it still grants access. Revoking or expiring the code ends the session.
pub async fn session_access_code(
    pool: &PgPool,
    access_code_id: DbId,
    now: Timestamp,
) -> Result<AccessCode, ServiceError> {
    let row = AccessCodeRepo::find_by_id(pool, access_code_id).await?;

    access_code::classify(row.as_ref().map(AccessCode::state), now)
        .map_err(ServiceError::AccessDenied)?;
    row.ok_or(ServiceError::AccessDenied(AccessCodeFailure::Invalid))
}
