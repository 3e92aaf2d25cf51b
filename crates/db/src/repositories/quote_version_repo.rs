//! Repository for the `quote_versions` table.

use sqlx::PgExecutor;
use quoteflow_core::pricing::VersionTotals;
use quoteflow_core::types::DbId;

use crate::models::quote_version::{NewQuoteVersion, QuoteVersion, UpdateQuoteVersion};

const COLUMNS: &str = "id, quote_id, version_number, notes, gst_enabled, gst_rate, \
    tax_inclusive, subtotal, tax_amount, total, totals_computed_at, cloned_from_id, \
    created_at, updated_at";

/// Provides CRUD operations for quote versions.
pub struct QuoteVersionRepo;

impl QuoteVersionRepo {
    /// Insert a version with zeroed totals; the caller recomputes them.
    pub async fn insert<'e>(
        executor: impl PgExecutor<'e>,
        input: &NewQuoteVersion,
    ) -> Result<QuoteVersion, sqlx::Error> {
        let query = format!(
            "INSERT INTO quote_versions
                (quote_id, version_number, notes, gst_enabled, gst_rate, tax_inclusive,
                 cloned_from_id)
             VALUES ($1, $2, $3, $4, $5, $6, $7)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, QuoteVersion>(&query)
            .bind(input.quote_id)
            .bind(input.version_number)
            .bind(&input.notes)
            .bind(input.gst_enabled)
            .bind(input.gst_rate)
            .bind(input.tax_inclusive)
            .bind(input.cloned_from_id)
            .fetch_one(executor)
            .await
    }

    pub async fn find_by_id<'e>(
        executor: impl PgExecutor<'e>,
        id: DbId,
    ) -> Result<Option<QuoteVersion>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM quote_versions WHERE id = $1");
        sqlx::query_as::<_, QuoteVersion>(&query)
            .bind(id)
            .fetch_optional(executor)
            .await
    }

    /// The highest-numbered version of a quote.
    pub async fn find_current_for_quote<'e>(
        executor: impl PgExecutor<'e>,
        quote_id: DbId,
    ) -> Result<Option<QuoteVersion>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM quote_versions
             WHERE quote_id = $1
             ORDER BY version_number DESC
             LIMIT 1"
        );
        sqlx::query_as::<_, QuoteVersion>(&query)
            .bind(quote_id)
            .fetch_optional(executor)
            .await
    }

    /// All versions of a quote, oldest first.
    pub async fn list_by_quote<'e>(
        executor: impl PgExecutor<'e>,
        quote_id: DbId,
    ) -> Result<Vec<QuoteVersion>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM quote_versions
             WHERE quote_id = $1
             ORDER BY version_number ASC"
        );
        sqlx::query_as::<_, QuoteVersion>(&query)
            .bind(quote_id)
            .fetch_all(executor)
            .await
    }

    /// Apply pricing configuration changes. Only non-`None` fields are applied.
    pub async fn update_settings<'e>(
        executor: impl PgExecutor<'e>,
        id: DbId,
        input: &UpdateQuoteVersion,
    ) -> Result<Option<QuoteVersion>, sqlx::Error> {
        let query = format!(
            "UPDATE quote_versions SET
                gst_enabled = COALESCE($2, gst_enabled),
                gst_rate = COALESCE($3, gst_rate),
                tax_inclusive = COALESCE($4, tax_inclusive),
                notes = COALESCE($5, notes),
                updated_at = NOW()
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, QuoteVersion>(&query)
            .bind(id)
            .bind(input.gst_enabled)
            .bind(input.gst_rate)
            .bind(input.tax_inclusive)
            .bind(&input.notes)
            .fetch_optional(executor)
            .await
    }

    /// Persist freshly computed totals.
    pub async fn update_totals<'e>(
        executor: impl PgExecutor<'e>,
        id: DbId,
        totals: &VersionTotals,
    ) -> Result<QuoteVersion, sqlx::Error> {
        let query = format!(
            "UPDATE quote_versions SET
                subtotal = $2,
                tax_amount = $3,
                total = $4,
                totals_computed_at = NOW(),
                updated_at = NOW()
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, QuoteVersion>(&query)
            .bind(id)
            .bind(totals.subtotal)
            .bind(totals.tax_amount)
            .bind(totals.total)
            .fetch_one(executor)
            .await
    }
}
