//! Repository for the `access_codes` table.

use sqlx::PgExecutor;
use quoteflow_core::types::{DbId, Timestamp};

use crate::models::access_code::AccessCode;

const COLUMNS: &str = "id, quote_id, code_hash, expires_at, revoked_at, last_used_at, \
    use_count, created_at, updated_at";

/// Provides storage for hashed client access codes.
pub struct AccessCodeRepo;

impl AccessCodeRepo {
    /// The quote's non-revoked code, if any. Expired codes still count.
    pub async fn find_active_for_quote<'e>(
        executor: impl PgExecutor<'e>,
        quote_id: DbId,
    ) -> Result<Option<AccessCode>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM access_codes WHERE quote_id = $1 AND revoked_at IS NULL"
        );
        sqlx::query_as::<_, AccessCode>(&query)
            .bind(quote_id)
            .fetch_optional(executor)
            .await
    }

    pub async fn find_by_id<'e>(
        executor: impl PgExecutor<'e>,
        id: DbId,
    ) -> Result<Option<AccessCode>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM access_codes WHERE id = $1");
        sqlx::query_as::<_, AccessCode>(&query)
            .bind(id)
            .fetch_optional(executor)
            .await
    }

    pub async fn find_by_hash<'e>(
        executor: impl PgExecutor<'e>,
        code_hash: &str,
    ) -> Result<Option<AccessCode>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM access_codes WHERE code_hash = $1");
        sqlx::query_as::<_, AccessCode>(&query)
            .bind(code_hash)
            .fetch_optional(executor)
            .await
    }

    pub async fn insert<'e>(
        executor: impl PgExecutor<'e>,
        quote_id: DbId,
        code_hash: &str,
        expires_at: Option<Timestamp>,
    ) -> Result<AccessCode, sqlx::Error> {
        let query = format!(
            "INSERT INTO access_codes (quote_id, code_hash, expires_at)
             VALUES ($1, $2, $3)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, AccessCode>(&query)
            .bind(quote_id)
            .bind(code_hash)
            .bind(expires_at)
            .fetch_one(executor)
            .await
    }

    /// Rewrite an existing code with a new hash and expiry, resetting its
    /// usage counters. The previous plaintext stops matching immediately.
    pub async fn rotate<'e>(
        executor: impl PgExecutor<'e>,
        id: DbId,
        code_hash: &str,
        expires_at: Option<Timestamp>,
    ) -> Result<AccessCode, sqlx::Error> {
        let query = format!(
            "UPDATE access_codes SET
                code_hash = $2,
                expires_at = $3,
                last_used_at = NULL,
                use_count = 0,
                updated_at = NOW()
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, AccessCode>(&query)
            .bind(id)
            .bind(code_hash)
            .bind(expires_at)
            .fetch_one(executor)
            .await
    }

    /// Revoke the quote's active code. Returns the revoked row, if there was one.
    pub async fn revoke_active_for_quote<'e>(
        executor: impl PgExecutor<'e>,
        quote_id: DbId,
    ) -> Result<Option<AccessCode>, sqlx::Error> {
        let query = format!(
            "UPDATE access_codes SET revoked_at = NOW(), updated_at = NOW()
             WHERE quote_id = $1 AND revoked_at IS NULL
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, AccessCode>(&query)
            .bind(quote_id)
            .fetch_optional(executor)
            .await
    }

    /// Note a successful validation.
    pub async fn record_use<'e>(executor: impl PgExecutor<'e>, id: DbId) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE access_codes SET last_used_at = NOW(), use_count = use_count + 1
             WHERE id = $1",
        )
        .bind(id)
        .execute(executor)
        .await?;
        Ok(())
    }
}
