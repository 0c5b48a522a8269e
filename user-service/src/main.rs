mod api;
mod config;
mod db;
mod service;

use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use anyhow::{Context, Result};
use shared::worker::DbWorker;
use crate::config::Config;
use crate::db::UserDb;
use crate::service::UserService;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("user_service=info,discovery=info,shared=info"))
        )
        .init();

    tracing::info!("Starting user-service");

    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "/etc/cloud-demo/user-service.toml".to_string());

    let config = Config::load(&config_path)
        .with_context(|| format!("Failed to load config from {}", config_path))?;

    tracing::info!("Loaded config from {}", config_path);

    let db = UserDb::open(&config.database.path)?;
    tracing::info!("Opened database at {:?}", config.database.path);

    if config.database.seed_demo_data {
        let added = db.seed_demo_data()?;
        tracing::info!("Seeded {} demo users", added);
    }

    let db_worker = DbWorker::spawn("user-db", db)
        .context("Failed to start database thread")?;

    let cancel = CancellationToken::new();
    let registry = discovery::open(&config.discovery, cancel.clone())?;

    let app_state = api::routes::AppState {
        users: UserService::new(db_worker.clone()),
        pattern: Arc::new(config.pattern.clone()),
    };
    let app = api::routes::router(app_state).context("Invalid route table")?;

    let listener = tokio::net::TcpListener::bind(config.api.listen)
        .await
        .with_context(|| format!("Failed to bind to {}", config.api.listen))?;
    let local_addr = listener.local_addr().context("Failed to read listen address")?;

    tracing::info!("API listening on {}", local_addr);

    let instance = config.registration.to_instance(local_addr)?;
    registry.register(&instance)?;
    tracing::info!("Registered {} as {}", instance.service, instance.instance_id);

    let server_cancel = cancel.clone();
    let server_handle = tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app)
            .with_graceful_shutdown(async move { server_cancel.cancelled().await })
            .await
        {
            tracing::error!("Server error: {}", e);
        }
    });

    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for ctrl-c")?;

    tracing::info!("Shutdown signal received");

    // Leave the registry first so callers stop picking this instance
    if let Err(e) = registry.deregister(&instance) {
        tracing::error!("Failed to deregister {}: {}", instance.instance_id, e);
    }

    cancel.cancel();
    let _ = server_handle.await;

    if let Err(e) = db_worker.shutdown().await {
        tracing::error!("Failed to shutdown database thread: {}", e);
    }

    if let Err(e) = registry.shutdown() {
        tracing::error!("Failed to shutdown registry: {}", e);
    }

    tracing::info!("Shutdown complete");
    Ok(())
}
