//! Back-office sign-in. Clients of a quote never come here; they enter
//! their access code at `/client/access`.

use axum::routing::post;
use axum::Router;

use crate::handlers::auth::login;
use crate::state::AppState;

/// `POST /auth/login`: email and password in, bearer token out.
pub fn router() -> Router<AppState> {
    Router::new().route("/login", post(login))
}
