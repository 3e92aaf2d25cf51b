//! Persistence for quotes, versions, deliverables, milestones, access codes,
//! and client actions.
//!
//! - [`models`] -- row structs and request DTOs.
//! - [`repositories`] -- zero-sized repos with async query functions.
//! - [`lifecycle`] -- version cloning and recompute-on-mutation.
//! - [`access`] -- access-code issuance, rotation, revocation, validation.
//! - [`decisions`] -- client action log and quote decisions.
//! - [`payments`] -- payment webhook recording and code issuance.

use sqlx::postgres::PgPoolOptions;

pub mod access;
pub mod decisions;
pub mod error;
pub mod lifecycle;
pub mod models;
pub mod payments;
pub mod repositories;

pub use error::ServiceError;

pub type DbPool = sqlx::PgPool;

/// Seconds to wait for a pooled connection before failing the request.
const ACQUIRE_TIMEOUT_SECS: u64 = 5;

/// Create a connection pool from a database URL.
pub async fn create_pool(database_url: &str) -> Result<DbPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(20)
        .acquire_timeout(std::time::Duration::from_secs(ACQUIRE_TIMEOUT_SECS))
        .connect(database_url)
        .await
}

/// Run a trivial query to confirm the database is reachable.
pub async fn health_check(pool: &DbPool) -> Result<(), sqlx::Error> {
    sqlx::query("SELECT 1").execute(pool).await?;
    Ok(())
}

/// Apply all pending migrations from `crates/db/migrations`.
pub async fn run_migrations(pool: &DbPool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("./migrations").run(pool).await
}

/// Whether `err` is a unique violation of the named constraint.
pub fn is_unique_violation(err: &sqlx::Error, constraint: &str) -> bool {
    match err {
        sqlx::Error::Database(db_err) => {
            db_err.is_unique_violation() && db_err.constraint() == Some(constraint)
        }
        _ => false,
    }
}
