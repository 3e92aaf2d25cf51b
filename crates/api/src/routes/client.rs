//! Route definitions for the client portal.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::client;
use crate::state::AppState;

/// Routes mounted at `/client`. No Bearer token; the session cookie set by
/// `/access` authenticates the rest.
///
/// ```text
/// POST /access          -> access
/// GET  /quote           -> get_quote
/// POST /quote/actions   -> post_action
/// POST /logout          -> logout
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/access", post(client::access))
        .route("/quote", get(client::get_quote))
        .route("/quote/actions", post(client::post_action))
        .route("/logout", post(client::logout))
}
