//! Role gate for routes that change quotes.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use quoteflow_core::error::CoreError;

use super::auth::AuthUser;
use crate::error::AppError;
use crate::state::AppState;

/// An [`AuthUser`] holding the admin role. Staff get 403 with a message
/// that says the quote is read-only to them.
pub struct RequireAdmin(pub AuthUser);

impl FromRequestParts<AppState> for RequireAdmin {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let user = AuthUser::from_request_parts(parts, state).await?;
        if !user.is_admin() {
            tracing::info!(user_id = user.user_id, role = %user.role, "Write attempt without admin role");
            return Err(AppError::Core(CoreError::Forbidden(
                "Admin role required. Staff accounts can view quotes but not change them".into(),
            )));
        }
        Ok(RequireAdmin(user))
    }
}
