//! Route definitions for the `/versions` resource.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::{deliverables, versions};
use crate::state::AppState;

/// Routes mounted at `/versions`.
///
/// ```text
/// GET    /{id}                -> get_version
/// PATCH  /{id}                -> update_version
/// POST   /{id}/deliverables   -> create_deliverable
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/{id}",
            get(versions::get_version).patch(versions::update_version),
        )
        .route("/{id}/deliverables", post(deliverables::create_deliverable))
}
