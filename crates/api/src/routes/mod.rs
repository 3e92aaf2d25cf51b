pub mod auth;
pub mod client;
pub mod deliverables;
pub mod health;
pub mod milestones;
pub mod quotes;
pub mod versions;
pub mod webhooks;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /auth/login                                  login (public)
///
/// /quotes                                      list (auth), create (admin)
/// /quotes/{id}                                 get with current version (auth)
/// /quotes/{id}/versions                        list (auth), clone (admin)
/// /quotes/{id}/publish                         issue/rotate access code (admin)
/// /quotes/{id}/access-code/revoke              revoke active code (admin)
/// /quotes/{id}/actions                         client action log (auth)
///
/// /versions/{id}                               get tree (auth), update GST (admin)
/// /versions/{id}/deliverables                  create (admin)
///
/// /deliverables/{id}                           update, delete (admin)
/// /deliverables/{id}/milestones                create (admin)
///
/// /milestones/{id}                             update, delete (admin)
///
/// /client/access                               access code -> session cookie
/// /client/quote                                quote view (session)
/// /client/quote/actions                        viewed/note/approve/reject (session)
/// /client/logout                               clear session cookie
///
/// /webhooks/payment                            payment provider events (signed)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/auth", auth::router())
        .nest("/quotes", quotes::router())
        .nest("/versions", versions::router())
        .nest("/deliverables", deliverables::router())
        .nest("/milestones", milestones::router())
        .nest("/client", client::router())
        .nest("/webhooks", webhooks::router())
}
