use std::sync::Arc;

use quoteflow_core::rate_limit::RateLimiter;
use quoteflow_core::session::{EmptySecretError, SessionCodec};
use quoteflow_events::Mailer;

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc` or is already `Clone`).
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub pool: quoteflow_db::DbPool,
    /// Server configuration.
    pub config: Arc<ServerConfig>,
    /// Client session token codec, keyed from `SESSION_SECRET`.
    pub sessions: Arc<SessionCodec>,
    /// Attempt limiter for access-code submissions.
    pub rate_limiter: Arc<RateLimiter>,
    /// Access-code mailer; `None` when SMTP is not configured.
    pub mailer: Option<Arc<dyn Mailer>>,
}

impl AppState {
    /// Build state from configuration, deriving the session codec and the
    /// rate limiter from it.
    pub fn new(
        pool: quoteflow_db::DbPool,
        config: ServerConfig,
        mailer: Option<Arc<dyn Mailer>>,
    ) -> Result<Self, EmptySecretError> {
        let sessions = SessionCodec::new(&config.session.secret)?;
        let rate_limiter = RateLimiter::new(config.access_code.rate_limit());
        Ok(Self {
            pool,
            config: Arc::new(config),
            sessions: Arc::new(sessions),
            rate_limiter: Arc::new(rate_limiter),
            mailer,
        })
    }
}
