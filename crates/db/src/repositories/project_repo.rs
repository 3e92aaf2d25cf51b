//! Repository for the `projects` table.

use sqlx::PgExecutor;
use quoteflow_core::types::DbId;

use crate::models::project::Project;

const COLUMNS: &str = "id, quote_id, name, status, created_at, updated_at";

/// Provides provisioning and lookup of delivery projects.
pub struct ProjectRepo;

impl ProjectRepo {
    /// Create the project for an approved quote.
    ///
    /// Returns `None` when the quote already has one (`uq_projects_quote_id`).
    pub async fn create_for_quote<'e>(
        executor: impl PgExecutor<'e>,
        quote_id: DbId,
        name: &str,
    ) -> Result<Option<Project>, sqlx::Error> {
        let query = format!(
            "INSERT INTO projects (quote_id, name)
             VALUES ($1, $2)
             ON CONFLICT ON CONSTRAINT uq_projects_quote_id DO NOTHING
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Project>(&query)
            .bind(quote_id)
            .bind(name)
            .fetch_optional(executor)
            .await
    }

    pub async fn find_by_quote<'e>(
        executor: impl PgExecutor<'e>,
        quote_id: DbId,
    ) -> Result<Option<Project>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM projects WHERE quote_id = $1");
        sqlx::query_as::<_, Project>(&query)
            .bind(quote_id)
            .fetch_optional(executor)
            .await
    }
}
