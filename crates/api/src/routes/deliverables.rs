//! Route definitions for the `/deliverables` resource.

use axum::routing::{patch, post};
use axum::Router;

use crate::handlers::{deliverables, milestones};
use crate::state::AppState;

/// Routes mounted at `/deliverables`.
///
/// ```text
/// PATCH  /{id}              -> update_deliverable
/// DELETE /{id}              -> delete_deliverable
/// POST   /{id}/milestones   -> create_milestone
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/{id}",
            patch(deliverables::update_deliverable).delete(deliverables::delete_deliverable),
        )
        .route("/{id}/milestones", post(milestones::create_milestone))
}
