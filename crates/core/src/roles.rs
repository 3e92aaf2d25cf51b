//! Account role names stored in `users.role` and carried in JWT claims.
//!
//! Staff accounts may read quotes; only admins may change them.

pub const ROLE_ADMIN: &str = "admin";
