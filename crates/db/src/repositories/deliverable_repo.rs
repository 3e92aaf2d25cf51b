//! Repository for the `deliverables` table.

use sqlx::PgExecutor;
use quoteflow_core::pricing::DeliverableRollup;
use quoteflow_core::types::DbId;

use crate::models::deliverable::{CreateDeliverable, Deliverable, UpdateDeliverable};

const COLUMNS: &str = "id, quote_version_id, title, description, sort_order, status, \
    pricing_mode, fixed_price_ex_gst, default_client_rate, default_hours, total_hours, \
    total_cost, client_value, margin, margin_percent, created_at, updated_at";

/// Provides CRUD operations for deliverables.
pub struct DeliverableRepo;

impl DeliverableRepo {
    /// Insert a deliverable at `sort_order`. Missing status and pricing mode
    /// fall back to the column defaults.
    pub async fn insert<'e>(
        executor: impl PgExecutor<'e>,
        quote_version_id: DbId,
        sort_order: i32,
        input: &CreateDeliverable,
    ) -> Result<Deliverable, sqlx::Error> {
        let query = format!(
            "INSERT INTO deliverables
                (quote_version_id, title, description, sort_order, status, pricing_mode,
                 fixed_price_ex_gst, default_client_rate, default_hours)
             VALUES ($1, $2, $3, $4, COALESCE($5, 'draft'), COALESCE($6, 'rolled_up_hours'),
                     $7, $8, $9)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Deliverable>(&query)
            .bind(quote_version_id)
            .bind(&input.title)
            .bind(&input.description)
            .bind(sort_order)
            .bind(&input.status)
            .bind(&input.pricing_mode)
            .bind(input.fixed_price_ex_gst)
            .bind(input.default_client_rate)
            .bind(input.default_hours)
            .fetch_one(executor)
            .await
    }

    /// Copy `source` into another version, keeping every field but the ids.
    pub async fn insert_copy<'e>(
        executor: impl PgExecutor<'e>,
        quote_version_id: DbId,
        source: &Deliverable,
    ) -> Result<Deliverable, sqlx::Error> {
        let query = format!(
            "INSERT INTO deliverables
                (quote_version_id, title, description, sort_order, status, pricing_mode,
                 fixed_price_ex_gst, default_client_rate, default_hours, total_hours,
                 total_cost, client_value, margin, margin_percent)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Deliverable>(&query)
            .bind(quote_version_id)
            .bind(&source.title)
            .bind(&source.description)
            .bind(source.sort_order)
            .bind(&source.status)
            .bind(&source.pricing_mode)
            .bind(source.fixed_price_ex_gst)
            .bind(source.default_client_rate)
            .bind(source.default_hours)
            .bind(source.total_hours)
            .bind(source.total_cost)
            .bind(source.client_value)
            .bind(source.margin)
            .bind(source.margin_percent)
            .fetch_one(executor)
            .await
    }

    pub async fn find_by_id<'e>(
        executor: impl PgExecutor<'e>,
        id: DbId,
    ) -> Result<Option<Deliverable>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM deliverables WHERE id = $1");
        sqlx::query_as::<_, Deliverable>(&query)
            .bind(id)
            .fetch_optional(executor)
            .await
    }

    /// Deliverables of a version ordered by `(sort_order, id)`.
    pub async fn list_by_version<'e>(
        executor: impl PgExecutor<'e>,
        quote_version_id: DbId,
    ) -> Result<Vec<Deliverable>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM deliverables
             WHERE quote_version_id = $1
             ORDER BY sort_order ASC, id ASC"
        );
        sqlx::query_as::<_, Deliverable>(&query)
            .bind(quote_version_id)
            .fetch_all(executor)
            .await
    }

    /// Highest sort order in a version, `None` when it has no deliverables.
    pub async fn max_sort_order<'e>(
        executor: impl PgExecutor<'e>,
        quote_version_id: DbId,
    ) -> Result<Option<i32>, sqlx::Error> {
        sqlx::query_scalar("SELECT MAX(sort_order) FROM deliverables WHERE quote_version_id = $1")
            .bind(quote_version_id)
            .fetch_one(executor)
            .await
    }

    /// Update a deliverable. Only non-`None` fields in `input` are applied.
    pub async fn update<'e>(
        executor: impl PgExecutor<'e>,
        id: DbId,
        input: &UpdateDeliverable,
    ) -> Result<Option<Deliverable>, sqlx::Error> {
        let query = format!(
            "UPDATE deliverables SET
                title = COALESCE($2, title),
                description = COALESCE($3, description),
                sort_order = COALESCE($4, sort_order),
                status = COALESCE($5, status),
                pricing_mode = COALESCE($6, pricing_mode),
                fixed_price_ex_gst = COALESCE($7, fixed_price_ex_gst),
                default_client_rate = COALESCE($8, default_client_rate),
                default_hours = COALESCE($9, default_hours),
                updated_at = NOW()
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Deliverable>(&query)
            .bind(id)
            .bind(&input.title)
            .bind(&input.description)
            .bind(input.sort_order)
            .bind(&input.status)
            .bind(&input.pricing_mode)
            .bind(input.fixed_price_ex_gst)
            .bind(input.default_client_rate)
            .bind(input.default_hours)
            .fetch_optional(executor)
            .await
    }

    /// Store derived roll-up figures.
    pub async fn update_rollup<'e>(
        executor: impl PgExecutor<'e>,
        id: DbId,
        rollup: &DeliverableRollup,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE deliverables SET
                total_hours = $2,
                total_cost = $3,
                client_value = $4,
                margin = $5,
                margin_percent = $6
             WHERE id = $1",
        )
        .bind(id)
        .bind(rollup.total_hours)
        .bind(rollup.total_cost)
        .bind(rollup.client_value)
        .bind(rollup.margin)
        .bind(rollup.margin_percent)
        .execute(executor)
        .await?;
        Ok(())
    }

    /// Delete a deliverable by ID. Returns `true` if a row was removed.
    pub async fn delete<'e>(executor: impl PgExecutor<'e>, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM deliverables WHERE id = $1")
            .bind(id)
            .execute(executor)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
