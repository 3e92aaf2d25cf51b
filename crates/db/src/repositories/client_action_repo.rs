//! Repository for the append-only `client_actions` table.

use sqlx::PgExecutor;
use quoteflow_core::types::DbId;

use crate::models::client_action::ClientAction;

const COLUMNS: &str = "id, quote_id, quote_version_id, action, client_name, note, created_at";

pub struct ClientActionRepo;

impl ClientActionRepo {
    pub async fn create<'e>(
        executor: impl PgExecutor<'e>,
        quote_id: DbId,
        quote_version_id: Option<DbId>,
        action: &str,
        client_name: Option<&str>,
        note: Option<&str>,
    ) -> Result<ClientAction, sqlx::Error> {
        let query = format!(
            "INSERT INTO client_actions (quote_id, quote_version_id, action, client_name, note)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, ClientAction>(&query)
            .bind(quote_id)
            .bind(quote_version_id)
            .bind(action)
            .bind(client_name)
            .bind(note)
            .fetch_one(executor)
            .await
    }

    /// The quote's action history, oldest first.
    pub async fn list_by_quote<'e>(
        executor: impl PgExecutor<'e>,
        quote_id: DbId,
    ) -> Result<Vec<ClientAction>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM client_actions
             WHERE quote_id = $1
             ORDER BY created_at ASC, id ASC"
        );
        sqlx::query_as::<_, ClientAction>(&query)
            .bind(quote_id)
            .fetch_all(executor)
            .await
    }
}
