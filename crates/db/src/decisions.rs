//! Client actions: views, notes, and the approve/reject decision.

use sqlx::PgPool;
use quoteflow_core::quote_status;
use quoteflow_core::types::DbId;

use crate::error::ServiceError;
use crate::models::client_action::{ClientAction, ClientActionRequest};
use crate::models::project::Project;
use crate::models::quote::Quote;
use crate::repositories::{ClientActionRepo, ProjectRepo, QuoteRepo, QuoteVersionRepo};

/// Result of recording a client action.
#[derive(Debug, Clone, serde::Serialize)]
pub struct ActionOutcome {
    pub action: ClientAction,
    pub quote: Quote,
    /// The delivery project, present once the quote is approved.
    pub project: Option<Project>,
}

/// Append a client action for `quote_id` and apply any status change.
///
/// Approval and rejection are only accepted on a published quote and are
/// final. Approval provisions the quote's project; a second approval
/// attempt is rejected by the status machine, and the unique constraint on
/// `projects.quote_id` keeps provisioning to one row regardless.
pub async fn record_client_action(
    pool: &PgPool,
    quote_id: DbId,
    request: &ClientActionRequest,
) -> Result<ActionOutcome, ServiceError> {
    let action = quote_status::action_for_request(request.action.trim()).ok_or_else(|| {
        ServiceError::Validation(format!(
            "Invalid action '{}'. Must be one of: approve, reject, note, viewed",
            request.action
        ))
    })?;
    let client_name = request
        .client_name
        .as_deref()
        .map(str::trim)
        .filter(|n| !n.is_empty());
    let note = request.note.as_deref().map(str::trim).filter(|n| !n.is_empty());
    quote_status::validate_client_action(action, client_name, note)
        .map_err(ServiceError::Validation)?;

    let mut tx = pool.begin().await?;
    let mut quote = QuoteRepo::find_for_update(&mut *tx, quote_id)
        .await?
        .ok_or_else(|| ServiceError::not_found("Quote", quote_id))?;
    let version = QuoteVersionRepo::find_current_for_quote(&mut *tx, quote_id).await?;

    let mut project = None;
    if let Some(next_status) = quote_status::status_after_action(action) {
        quote_status::validate_transition(&quote.status, next_status)
            .map_err(ServiceError::Conflict)?;
        quote = QuoteRepo::mark_decided(&mut *tx, quote_id, next_status).await?;

        if next_status == quote_status::STATUS_APPROVED {
            let name = format!("{} {}", quote.quote_number, quote.title);
            project = match ProjectRepo::create_for_quote(&mut *tx, quote_id, &name).await? {
                Some(created) => {
                    tracing::info!(quote_id, project_id = created.id, "Project provisioned");
                    Some(created)
                }
                None => ProjectRepo::find_by_quote(&mut *tx, quote_id).await?,
            };
        }
    } else if quote.status == quote_status::STATUS_APPROVED {
        project = ProjectRepo::find_by_quote(&mut *tx, quote_id).await?;
    }

    let recorded = ClientActionRepo::create(
        &mut *tx,
        quote_id,
        version.map(|v| v.id),
        action,
        client_name,
        note,
    )
    .await?;
    tx.commit().await?;

    tracing::info!(quote_id, action, status = %quote.status, "Client action recorded");
    Ok(ActionOutcome {
        action: recorded,
        quote,
        project,
    })
}
