//! Route definitions for the `/quotes` resource.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::quotes;
use crate::state::AppState;

/// Routes mounted at `/quotes`.
///
/// ```text
/// GET    /                          -> list_quotes
/// POST   /                          -> create_quote
/// GET    /{id}                      -> get_quote
/// GET    /{id}/versions             -> list_versions
/// POST   /{id}/versions             -> clone_version
/// POST   /{id}/publish              -> publish_quote
/// POST   /{id}/access-code/revoke   -> revoke_access_code
/// GET    /{id}/actions              -> list_actions
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(quotes::list_quotes).post(quotes::create_quote))
        .route("/{id}", get(quotes::get_quote))
        .route(
            "/{id}/versions",
            get(quotes::list_versions).post(quotes::clone_version),
        )
        .route("/{id}/publish", post(quotes::publish_quote))
        .route("/{id}/access-code/revoke", post(quotes::revoke_access_code))
        .route("/{id}/actions", get(quotes::list_actions))
}
