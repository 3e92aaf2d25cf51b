//! Client-side extractors: the session cookie and the caller's address.
//!
//! Clients never hold accounts. A session is an encrypted token naming the
//! access code it was minted from; every request re-checks that code, so
//! revoking or expiring it ends all sessions built on it.

use std::convert::Infallible;
use std::net::{IpAddr, SocketAddr};

use axum::extract::{ConnectInfo, FromRequestParts};
use axum::http::header::COOKIE;
use axum::http::request::Parts;
use axum::http::HeaderMap;
use chrono::Utc;
use quoteflow_core::error::CoreError;
use quoteflow_core::types::DbId;

use crate::config::SessionConfig;
use crate::error::AppError;
use crate::state::AppState;

/// An authenticated client session, scoped to one quote.
#[derive(Debug, Clone)]
pub struct ClientSession {
    pub access_code_id: DbId,
    pub quote_id: DbId,
}

impl FromRequestParts<AppState> for ClientSession {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = read_cookie(&parts.headers, &state.config.session.cookie_name)
            .ok_or_else(|| {
                AppError::Core(CoreError::Unauthorized(
                    "Enter your access code to continue".into(),
                ))
            })?;

        let access_code_id = state.sessions.decode(token).ok_or_else(|| {
            AppError::Core(CoreError::Unauthorized(
                "Session expired. Enter your access code again".into(),
            ))
        })?;

        let code =
            quoteflow_db::access::session_access_code(&state.pool, access_code_id, Utc::now())
                .await?;

        Ok(ClientSession {
            access_code_id: code.id,
            quote_id: code.quote_id,
        })
    }
}

/// The caller's address, used to key access-code attempts.
///
/// The socket peer, unless that peer is one of the configured trusted
/// proxies. Then the rightmost `X-Forwarded-For` hop that is not itself a
/// trusted proxy is used. `"unknown"` when no peer address is available.
#[derive(Debug, Clone)]
pub struct ClientIp(pub String);

impl FromRequestParts<AppState> for ClientIp {
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let peer = parts
            .extensions
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| addr.ip());

        let ip = resolve_client_ip(peer, &parts.headers, &state.config.trusted_proxies);
        Ok(ClientIp(ip.map_or_else(|| "unknown".to_string(), |ip| ip.to_string())))
    }
}

/// Walk `X-Forwarded-For` from the right, skipping trusted proxies.
///
/// Hops left of the first untrusted one were written by the client and are
/// never consulted. A malformed hop ends the walk at the last trusted
/// address.
pub fn resolve_client_ip(
    peer: Option<IpAddr>,
    headers: &HeaderMap,
    trusted_proxies: &[IpAddr],
) -> Option<IpAddr> {
    let mut client = peer?;
    if !trusted_proxies.contains(&client) {
        return Some(client);
    }

    let hops: Vec<&str> = headers
        .get_all("x-forwarded-for")
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(','))
        .map(str::trim)
        .collect();

    for hop in hops.into_iter().rev() {
        match hop.parse::<IpAddr>() {
            Ok(ip) if trusted_proxies.contains(&ip) => client = ip,
            Ok(ip) => return Some(ip),
            Err(_) => break,
        }
    }
    Some(client)
}

/// Find a cookie value by name across all `Cookie` headers.
pub fn read_cookie<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value)
        .filter(|value| !value.is_empty())
}

/// `Set-Cookie` value carrying a fresh session token.
pub fn session_cookie(config: &SessionConfig, token: &str) -> String {
    format!(
        "{}={token}; Path=/; HttpOnly; Secure; SameSite=Lax; Max-Age={}",
        config.cookie_name,
        config.ttl().num_seconds()
    )
}

/// `Set-Cookie` value that removes the session cookie.
pub fn clear_session_cookie(config: &SessionConfig) -> String {
    format!(
        "{}=; Path=/; HttpOnly; Secure; SameSite=Lax; Max-Age=0",
        config.cookie_name
    )
}
