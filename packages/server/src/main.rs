use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use common::storage::BlobStore;
use common::storage::memory::MemoryBlobStore;
use common::storage::telegram::TelegramBlobStore;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use tgphoto_server::build_router;
use tgphoto_server::config::AppConfig;
use tgphoto_server::database::{ensure_indexes, init_db};
use tgphoto_server::oauth::GitHubProvider;
use tgphoto_server::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,sqlx=warn,tower_http=info")),
        )
        .init();

    let config = AppConfig::load().context("Failed to load configuration")?;
    if config.auth.jwt_secret.len() < 16 {
        anyhow::bail!("auth.jwt_secret must be set to at least 16 characters");
    }
    if config.auth.admin_ids.is_empty() {
        warn!("No admin identities configured; admin endpoints are unreachable");
    }

    let db = init_db(&config.database.url)
        .await
        .context("Failed to connect to database")?;
    ensure_indexes(&db).await?;
    info!("Database ready");

    let blob_store: Arc<dyn BlobStore> = if config.telegram.is_configured() {
        info!(chat_id = %config.telegram.chat_id, method = ?config.telegram.method, "Using Telegram blob store");
        Arc::new(TelegramBlobStore::new(config.telegram.clone())?)
    } else {
        warn!("Telegram not configured; blobs are kept in memory and lost on restart");
        Arc::new(MemoryBlobStore::new())
    };

    let identity_provider = Arc::new(GitHubProvider::new(config.github.clone())?);

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .context("Invalid server.host / server.port")?;

    let state = AppState::new(config, db.clone(), blob_store, identity_provider);
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Server running at http://{}", addr);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    info!("Server stopped, closing database pool");
    db.close().await?;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl-C: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                warn!("Failed to listen for SIGTERM: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!("Received shutdown signal");
}
