use axum::routing::patch;
use axum::Router;

use crate::handlers::milestones;
use crate::state::AppState;

/// Routes mounted at `/milestones`.
///
/// ```text
/// PATCH  /{id}   -> update_milestone
/// DELETE /{id}   -> delete_milestone
/// ```
pub fn router() -> Router<AppState> {
    Router::new().route(
        "/{id}",
        patch(milestones::update_milestone).delete(milestones::delete_milestone),
    )
}
