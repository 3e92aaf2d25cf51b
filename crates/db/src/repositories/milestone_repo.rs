//! Repository for the `milestones` table.

use sqlx::PgExecutor;
use quoteflow_core::types::DbId;

use crate::models::milestone::{CreateMilestone, Milestone, UpdateMilestone};

const COLUMNS: &str = "id, deliverable_id, title, description, sort_order, status, hours, \
    is_billable, client_rate, cost_rate, due_date, created_at, updated_at";

/// Provides CRUD operations for milestones.
pub struct MilestoneRepo;

impl MilestoneRepo {
    /// Insert a milestone at `sort_order`. Hours default to 0 and
    /// billability to `true`.
    pub async fn insert<'e>(
        executor: impl PgExecutor<'e>,
        deliverable_id: DbId,
        sort_order: i32,
        input: &CreateMilestone,
    ) -> Result<Milestone, sqlx::Error> {
        let query = format!(
            "INSERT INTO milestones
                (deliverable_id, title, description, sort_order, status, hours, is_billable,
                 client_rate, cost_rate, due_date)
             VALUES ($1, $2, $3, $4, COALESCE($5, 'draft'), COALESCE($6, 0),
                     COALESCE($7, true), $8, $9, $10)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Milestone>(&query)
            .bind(deliverable_id)
            .bind(&input.title)
            .bind(&input.description)
            .bind(sort_order)
            .bind(&input.status)
            .bind(input.hours)
            .bind(input.is_billable)
            .bind(input.client_rate)
            .bind(input.cost_rate)
            .bind(input.due_date)
            .fetch_one(executor)
            .await
    }

    /// Copy `source` under another deliverable, keeping every field but the ids.
    pub async fn insert_copy<'e>(
        executor: impl PgExecutor<'e>,
        deliverable_id: DbId,
        source: &Milestone,
    ) -> Result<Milestone, sqlx::Error> {
        let query = format!(
            "INSERT INTO milestones
                (deliverable_id, title, description, sort_order, status, hours, is_billable,
                 client_rate, cost_rate, due_date)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Milestone>(&query)
            .bind(deliverable_id)
            .bind(&source.title)
            .bind(&source.description)
            .bind(source.sort_order)
            .bind(&source.status)
            .bind(source.hours)
            .bind(source.is_billable)
            .bind(source.client_rate)
            .bind(source.cost_rate)
            .bind(source.due_date)
            .fetch_one(executor)
            .await
    }

    pub async fn find_by_id<'e>(
        executor: impl PgExecutor<'e>,
        id: DbId,
    ) -> Result<Option<Milestone>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM milestones WHERE id = $1");
        sqlx::query_as::<_, Milestone>(&query)
            .bind(id)
            .fetch_optional(executor)
            .await
    }

    /// Milestones of one deliverable ordered by `(sort_order, id)`.
    pub async fn list_by_deliverable<'e>(
        executor: impl PgExecutor<'e>,
        deliverable_id: DbId,
    ) -> Result<Vec<Milestone>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM milestones
             WHERE deliverable_id = $1
             ORDER BY sort_order ASC, id ASC"
        );
        sqlx::query_as::<_, Milestone>(&query)
            .bind(deliverable_id)
            .fetch_all(executor)
            .await
    }

    /// Every milestone under a version, grouped by deliverable and ordered
    /// within each group.
    pub async fn list_by_version<'e>(
        executor: impl PgExecutor<'e>,
        quote_version_id: DbId,
    ) -> Result<Vec<Milestone>, sqlx::Error> {
        let columns = COLUMNS
            .split(", ")
            .map(|c| format!("m.{c}"))
            .collect::<Vec<_>>()
            .join(", ");
        let query = format!(
            "SELECT {columns} FROM milestones m
             JOIN deliverables d ON d.id = m.deliverable_id
             WHERE d.quote_version_id = $1
             ORDER BY m.deliverable_id ASC, m.sort_order ASC, m.id ASC"
        );
        sqlx::query_as::<_, Milestone>(&query)
            .bind(quote_version_id)
            .fetch_all(executor)
            .await
    }

    /// Highest sort order under a deliverable, `None` when it has none.
    pub async fn max_sort_order<'e>(
        executor: impl PgExecutor<'e>,
        deliverable_id: DbId,
    ) -> Result<Option<i32>, sqlx::Error> {
        sqlx::query_scalar("SELECT MAX(sort_order) FROM milestones WHERE deliverable_id = $1")
            .bind(deliverable_id)
            .fetch_one(executor)
            .await
    }

    /// Update a milestone. Only non-`None` fields in `input` are applied.
    pub async fn update<'e>(
        executor: impl PgExecutor<'e>,
        id: DbId,
        input: &UpdateMilestone,
    ) -> Result<Option<Milestone>, sqlx::Error> {
        let query = format!(
            "UPDATE milestones SET
                title = COALESCE($2, title),
                description = COALESCE($3, description),
                sort_order = COALESCE($4, sort_order),
                status = COALESCE($5, status),
                hours = COALESCE($6, hours),
                is_billable = COALESCE($7, is_billable),
                client_rate = COALESCE($8, client_rate),
                cost_rate = COALESCE($9, cost_rate),
                due_date = COALESCE($10, due_date),
                updated_at = NOW()
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Milestone>(&query)
            .bind(id)
            .bind(&input.title)
            .bind(&input.description)
            .bind(input.sort_order)
            .bind(&input.status)
            .bind(input.hours)
            .bind(input.is_billable)
            .bind(input.client_rate)
            .bind(input.cost_rate)
            .bind(input.due_date)
            .fetch_optional(executor)
            .await
    }

    /// Delete a milestone by ID. Returns `true` if a row was removed.
    pub async fn delete<'e>(executor: impl PgExecutor<'e>, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM milestones WHERE id = $1")
            .bind(id)
            .execute(executor)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Delete every milestone of a deliverable. Returns the number removed.
    pub async fn delete_by_deliverable<'e>(
        executor: impl PgExecutor<'e>,
        deliverable_id: DbId,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM milestones WHERE deliverable_id = $1")
            .bind(deliverable_id)
            .execute(executor)
            .await?;
        Ok(result.rows_affected())
    }
}
