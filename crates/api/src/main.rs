use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;

use quoteflow_api::config::ServerConfig;
use quoteflow_api::router::build_app_router;
use quoteflow_api::state::AppState;
use quoteflow_db::DbPool;
use quoteflow_events::{EmailConfig, Mailer, SmtpMailer};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

const DEFAULT_LOG_FILTER: &str =
    "quoteflow_api=debug,quoteflow_db=info,quoteflow_events=info,tower_http=debug";

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    init_tracing();

    let config = ServerConfig::from_env();
    let pool = connect_database().await;
    let mailer = build_mailer();

    let state =
        AppState::new(pool, config.clone(), mailer).expect("SESSION_SECRET must not be empty");
    let app = build_app_router(state, &config);

    let ip: IpAddr = config.host.parse().expect("HOST must be an IP address");
    let addr = SocketAddr::new(ip, config.port);
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .unwrap_or_else(|e| panic!("Failed to bind {addr}: {e}"));
    tracing::info!(%addr, portal = %config.client_portal_url, "quoteflow API listening");

    // Peer addresses feed the access-code rate limiter.
    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");

    tracing::info!("Shut down cleanly");
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| DEFAULT_LOG_FILTER.into());
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Connect, confirm the database answers, and apply pending migrations.
async fn connect_database() -> DbPool {
    let url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");
    let pool = quoteflow_db::create_pool(&url)
        .await
        .expect("Failed to connect to database");
    quoteflow_db::health_check(&pool)
        .await
        .expect("Database health check failed");
    quoteflow_db::run_migrations(&pool)
        .await
        .expect("Failed to run database migrations");
    tracing::info!("Database ready");
    pool
}

/// SMTP delivery for access codes. Without it quotes still publish and the
/// admin hands the code over themselves.
fn build_mailer() -> Option<Arc<dyn Mailer>> {
    let Some(email_config) = EmailConfig::from_env() else {
        tracing::info!("SMTP_HOST not set, access codes will not be emailed");
        return None;
    };
    match SmtpMailer::new(email_config) {
        Ok(mailer) => Some(Arc::new(mailer)),
        Err(e) => {
            tracing::warn!(error = %e, "SMTP mailer unavailable, access codes will not be emailed");
            None
        }
    }
}

/// Resolves on Ctrl-C, or SIGTERM on Unix.
async fn shutdown_signal() {
    let interrupt = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Ctrl-C handler failed");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "SIGTERM handler failed");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = interrupt => tracing::info!("SIGINT received, draining connections"),
        () = terminate => tracing::info!("SIGTERM received, draining connections"),
    }
}
