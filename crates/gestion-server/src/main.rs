mod config;

use std::net::SocketAddr;
use std::sync::Arc;

use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use gestion_api::auth::hash_password;
use gestion_api::logos::LogoStorage;
use gestion_api::{AppState, AppStateInner, JwtSettings};
use gestion_db::Database;
use gestion_types::models::ROLE_SUPER_ADMIN;

use crate::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    // Init logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "gestion=debug,gestion_api=debug,gestion_db=info,tower_http=debug".into()),
        )
        .init();

    let config = Config::from_env()?;

    // Init database and logo storage
    let db = Database::open(&config.db_path)?;
    let logos = LogoStorage::new(config.upload_dir.clone()).await?;

    if let Some((email, password)) = &config.bootstrap_admin {
        bootstrap_admin(&db, email, password)?;
    }

    let state: AppState = Arc::new(AppStateInner {
        db,
        jwt: JwtSettings::new(config.jwt_secret.clone(), config.jwt_ttl_minutes),
        logos,
    });

    let app = gestion_api::router(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http());

    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
    info!("Gestion server listening on {}", addr);
    info!("Token lifetime: {} minutes", config.jwt_ttl_minutes);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

/// Create the first super admin unless that email already exists.
fn bootstrap_admin(db: &Database, email: &str, password: &str) -> anyhow::Result<()> {
    let email = email.trim().to_lowercase();
    if db.get_user_by_email(&email)?.is_some() {
        return Ok(());
    }
    if password.len() < gestion_api::auth::MIN_PASSWORD_LEN {
        warn!("Bootstrap admin password is too short; skipping creation of {}", email);
        return Ok(());
    }

    let hash = hash_password(password)?;
    let id = db.create_user("Administrator", &email, &hash, ROLE_SUPER_ADMIN, None)?;
    info!("Created bootstrap super admin {} ({})", id, email);
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = tokio::signal::ctrl_c();
    #[cfg(unix)]
    {
        let mut sigterm =
            match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
                Ok(signal) => signal,
                Err(e) => {
                    warn!("Failed to install SIGTERM handler: {}", e);
                    ctrl_c.await.ok();
                    info!("Received Ctrl+C, shutting down...");
                    return;
                }
            };
        tokio::select! {
            _ = ctrl_c => info!("Received Ctrl+C, shutting down..."),
            _ = sigterm.recv() => info!("Received SIGTERM, shutting down..."),
        }
    }
    #[cfg(not(unix))]
    {
        ctrl_c.await.ok();
        info!("Received Ctrl+C, shutting down...");
    }
}
