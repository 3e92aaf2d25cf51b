//! Request extractors for authentication and client identity.
//!
//! - [`auth::AuthUser`] -- Extracts the administrator from a JWT Bearer token.
//! - [`rbac::RequireAdmin`] -- Requires the `admin` role.
//! - [`client::ClientSession`] -- Resolves the client session cookie to a quote.
//! - [`client::ClientIp`] -- Client address for rate limiting, proxy-aware.

pub mod auth;
pub mod client;
pub mod rbac;
