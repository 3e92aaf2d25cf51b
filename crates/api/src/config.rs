use std::net::IpAddr;
use std::time::Duration;

use quoteflow_core::rate_limit::{RateLimitConfig, DEFAULT_MAX_ATTEMPTS, DEFAULT_WINDOW_SECS};

use crate::auth::jwt::JwtConfig;

/// Server configuration loaded from environment variables.
///
/// All fields except the secrets have defaults suitable for local
/// development.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS` env var.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    /// Admin JWT configuration.
    pub jwt: JwtConfig,
    /// Client session cookie configuration.
    pub session: SessionConfig,
    /// Access-code lifetime and attempt limits.
    pub access_code: AccessCodeConfig,
    /// Shared secret for payment webhook signatures. `None` disables the webhook.
    pub payment_webhook_secret: Option<String>,
    /// Client portal link embedded in access-code emails.
    pub client_portal_url: String,
    /// Reverse proxies whose `X-Forwarded-For` entries are believed. Empty
    /// means the socket peer is always the client.
    pub trusted_proxies: Vec<IpAddr>,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                   | Default                         |
    /// |---------------------------|---------------------------------|
    /// | `HOST`                    | `0.0.0.0`                       |
    /// | `PORT`                    | `3000`                          |
    /// | `CORS_ORIGINS`            | `http://localhost:5173`         |
    /// | `REQUEST_TIMEOUT_SECS`    | `30`                            |
    /// | `PAYMENT_WEBHOOK_SECRET`  | unset (webhook disabled)        |
    /// | `CLIENT_PORTAL_URL`       | `http://localhost:5173/portal`  |
    /// | `TRUSTED_PROXIES`         | empty (comma-separated IPs)     |
    ///
    /// See [`JwtConfig::from_env`], [`SessionConfig::from_env`] and
    /// [`AccessCodeConfig::from_env`] for the rest.
    pub fn from_env() -> Self {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());

        let port: u16 = std::env::var("PORT")
            .unwrap_or_else(|_| "3000".into())
            .parse()
            .expect("PORT must be a valid u16");

        let cors_origins: Vec<String> = std::env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:5173".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let request_timeout_secs: u64 = std::env::var("REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".into())
            .parse()
            .expect("REQUEST_TIMEOUT_SECS must be a valid u64");

        let payment_webhook_secret = std::env::var("PAYMENT_WEBHOOK_SECRET")
            .ok()
            .filter(|s| !s.is_empty());

        let client_portal_url = std::env::var("CLIENT_PORTAL_URL")
            .unwrap_or_else(|_| "http://localhost:5173/portal".into());

        let trusted_proxies = parse_ip_list(&std::env::var("TRUSTED_PROXIES").unwrap_or_default())
            .expect("TRUSTED_PROXIES must be a comma-separated list of IP addresses");

        Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            jwt: JwtConfig::from_env(),
            session: SessionConfig::from_env(),
            access_code: AccessCodeConfig::from_env(),
            payment_webhook_secret,
            client_portal_url,
            trusted_proxies,
        }
    }
}

/// Parse a comma-separated list of IP addresses, ignoring blank entries.
fn parse_ip_list(raw: &str) -> Result<Vec<IpAddr>, std::net::AddrParseError> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::parse)
        .collect()
}

/// Default client session lifetime in hours.
const DEFAULT_SESSION_TTL_HOURS: i64 = 12;

/// Default session cookie name.
const DEFAULT_SESSION_COOKIE: &str = "qf_session";

/// Client session cookie settings.
#[derive(Clone)]
pub struct SessionConfig {
    /// Key material for the session codec.
    pub secret: String,
    pub ttl_hours: i64,
    pub cookie_name: String,
}

impl std::fmt::Debug for SessionConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionConfig")
            .field("secret", &"<redacted>")
            .field("ttl_hours", &self.ttl_hours)
            .field("cookie_name", &self.cookie_name)
            .finish()
    }
}

impl SessionConfig {
    /// Load session configuration from environment variables.
    ///
    /// | Env Var               | Required | Default      |
    /// |-----------------------|----------|--------------|
    /// | `SESSION_SECRET`      | **yes**  | --           |
    /// | `SESSION_TTL_HOURS`   | no       | `12`         |
    /// | `SESSION_COOKIE_NAME` | no       | `qf_session` |
    ///
    /// # Panics
    ///
    /// Panics if `SESSION_SECRET` is not set or is empty.
    pub fn from_env() -> Self {
        let secret =
            std::env::var("SESSION_SECRET").expect("SESSION_SECRET must be set in the environment");
        assert!(!secret.is_empty(), "SESSION_SECRET must not be empty");

        let ttl_hours: i64 = std::env::var("SESSION_TTL_HOURS")
            .unwrap_or_else(|_| DEFAULT_SESSION_TTL_HOURS.to_string())
            .parse()
            .expect("SESSION_TTL_HOURS must be a valid i64");

        let cookie_name = std::env::var("SESSION_COOKIE_NAME")
            .unwrap_or_else(|_| DEFAULT_SESSION_COOKIE.to_string());

        Self {
            secret,
            ttl_hours,
            cookie_name,
        }
    }

    pub fn ttl(&self) -> chrono::Duration {
        chrono::Duration::hours(self.ttl_hours)
    }
}

/// Access-code issuance and attempt-limiting settings.
#[derive(Debug, Clone)]
pub struct AccessCodeConfig {
    pub rate_limit_max: u32,
    pub rate_limit_window_secs: u64,
    /// Lifetime of issued codes in days; `0` issues codes that never expire.
    pub expiry_days: i64,
}

impl AccessCodeConfig {
    /// | Env Var                              | Default |
    /// |--------------------------------------|---------|
    /// | `ACCESS_CODE_RATE_LIMIT_MAX`         | `8`     |
    /// | `ACCESS_CODE_RATE_LIMIT_WINDOW_SECS` | `60`    |
    /// | `ACCESS_CODE_EXPIRY_DAYS`            | `30`    |
    pub fn from_env() -> Self {
        let rate_limit_max: u32 = std::env::var("ACCESS_CODE_RATE_LIMIT_MAX")
            .unwrap_or_else(|_| DEFAULT_MAX_ATTEMPTS.to_string())
            .parse()
            .expect("ACCESS_CODE_RATE_LIMIT_MAX must be a valid u32");

        let rate_limit_window_secs: u64 = std::env::var("ACCESS_CODE_RATE_LIMIT_WINDOW_SECS")
            .unwrap_or_else(|_| DEFAULT_WINDOW_SECS.to_string())
            .parse()
            .expect("ACCESS_CODE_RATE_LIMIT_WINDOW_SECS must be a valid u64");

        let expiry_days: i64 = std::env::var("ACCESS_CODE_EXPIRY_DAYS")
            .unwrap_or_else(|_| quoteflow_core::access_code::DEFAULT_EXPIRY_DAYS.to_string())
            .parse()
            .expect("ACCESS_CODE_EXPIRY_DAYS must be a valid i64");

        Self {
            rate_limit_max,
            rate_limit_window_secs,
            expiry_days,
        }
    }

    pub fn rate_limit(&self) -> RateLimitConfig {
        RateLimitConfig {
            max_attempts: self.rate_limit_max,
            window: Duration::from_secs(self.rate_limit_window_secs),
            ..RateLimitConfig::default()
        }
    }

    /// Lifetime for a code issued now, with an optional per-request override
    /// in days. Zero or negative days mean no expiry.
    pub fn code_ttl(&self, override_days: Option<i64>) -> Option<chrono::Duration> {
        let days = override_days.unwrap_or(self.expiry_days);
        (days > 0).then(|| chrono::Duration::days(days))
    }
}
