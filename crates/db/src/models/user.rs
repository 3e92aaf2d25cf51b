//! Back-office accounts that build and publish quotes.

use quoteflow_core::roles::ROLE_ADMIN;
use quoteflow_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A `users` row. Carries the password hash, so it is never serialized;
/// handlers answer with [`UserResponse`].
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: DbId,
    pub email: String,
    pub display_name: String,
    pub password_hash: String,
    pub role: String,
    pub is_active: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl User {
    pub fn can_edit_quotes(&self) -> bool {
        self.is_active && self.role == ROLE_ADMIN
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct UserResponse {
    pub id: DbId,
    pub email: String,
    pub display_name: String,
    pub role: String,
    /// Lets the admin UI hide editing controls for staff.
    pub can_edit_quotes: bool,
}

impl From<&User> for UserResponse {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            email: user.email.clone(),
            display_name: user.display_name.clone(),
            role: user.role.clone(),
            can_edit_quotes: user.can_edit_quotes(),
        }
    }
}

/// Insert payload. The password arrives already hashed; `role` defaults
/// to admin in the database.
#[derive(Debug, Deserialize)]
pub struct CreateUser {
    pub email: String,
    pub display_name: String,
    pub password_hash: String,
    pub role: Option<String>,
}
