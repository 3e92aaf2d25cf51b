//! Repository for the `quotes` table.

use sqlx::PgExecutor;
use quoteflow_core::types::DbId;

use crate::models::quote::{CreateQuote, Quote};

const COLUMNS: &str = "id, quote_number, title, status, organization_id, contact_id, \
    contact_name, contact_email, last_version_number, created_by, published_at, \
    decided_at, created_at, updated_at";

/// Provides CRUD operations and status updates for quotes.
pub struct QuoteRepo;

impl QuoteRepo {
    /// Insert a new draft quote whose first version number is already
    /// reserved (`last_version_number = 1`).
    pub async fn create<'e>(
        executor: impl PgExecutor<'e>,
        input: &CreateQuote,
        created_by: Option<DbId>,
    ) -> Result<Quote, sqlx::Error> {
        let query = format!(
            "INSERT INTO quotes
                (title, organization_id, contact_id, contact_name, contact_email,
                 last_version_number, created_by)
             VALUES ($1, $2, $3, $4, $5, 1, $6)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Quote>(&query)
            .bind(&input.title)
            .bind(input.organization_id)
            .bind(input.contact_id)
            .bind(&input.contact_name)
            .bind(&input.contact_email)
            .bind(created_by)
            .fetch_one(executor)
            .await
    }

    pub async fn find_by_id<'e>(
        executor: impl PgExecutor<'e>,
        id: DbId,
    ) -> Result<Option<Quote>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM quotes WHERE id = $1");
        sqlx::query_as::<_, Quote>(&query)
            .bind(id)
            .fetch_optional(executor)
            .await
    }

    /// Find a quote and lock its row until the surrounding transaction ends.
    ///
    /// Serializes status changes and version creation for one quote.
    pub async fn find_for_update<'e>(
        executor: impl PgExecutor<'e>,
        id: DbId,
    ) -> Result<Option<Quote>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM quotes WHERE id = $1 FOR UPDATE");
        sqlx::query_as::<_, Quote>(&query)
            .bind(id)
            .fetch_optional(executor)
            .await
    }

    /// List quotes, newest first, optionally filtered by status.
    pub async fn list<'e>(
        executor: impl PgExecutor<'e>,
        status: Option<&str>,
    ) -> Result<Vec<Quote>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM quotes
             WHERE ($1::TEXT IS NULL OR status = $1)
             ORDER BY created_at DESC, id DESC"
        );
        sqlx::query_as::<_, Quote>(&query)
            .bind(status)
            .fetch_all(executor)
            .await
    }

    /// Advance the version high-water mark and return the new number.
    pub async fn bump_version_counter<'e>(
        executor: impl PgExecutor<'e>,
        id: DbId,
    ) -> Result<i32, sqlx::Error> {
        sqlx::query_scalar(
            "UPDATE quotes
             SET last_version_number = last_version_number + 1, updated_at = NOW()
             WHERE id = $1
             RETURNING last_version_number",
        )
        .bind(id)
        .fetch_one(executor)
        .await
    }

    /// Mark a quote published. `published_at` keeps the first publication time.
    pub async fn mark_published<'e>(
        executor: impl PgExecutor<'e>,
        id: DbId,
    ) -> Result<Quote, sqlx::Error> {
        let query = format!(
            "UPDATE quotes SET
                status = 'published',
                published_at = COALESCE(published_at, NOW()),
                updated_at = NOW()
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Quote>(&query)
            .bind(id)
            .fetch_one(executor)
            .await
    }

    /// Record a client decision (`approved` or `rejected`).
    pub async fn mark_decided<'e>(
        executor: impl PgExecutor<'e>,
        id: DbId,
        status: &str,
    ) -> Result<Quote, sqlx::Error> {
        let query = format!(
            "UPDATE quotes SET status = $2, decided_at = NOW(), updated_at = NOW()
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Quote>(&query)
            .bind(id)
            .bind(status)
            .fetch_one(executor)
            .await
    }
}
