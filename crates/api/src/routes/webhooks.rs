use axum::routing::post;
use axum::Router;

use crate::handlers::webhooks;
use crate::state::AppState;

/// Routes mounted at `/webhooks`.
///
/// ```text
/// POST /payment   -> payment
/// ```
pub fn router() -> Router<AppState> {
    Router::new().route("/payment", post(webhooks::payment))
}
