//! contribution-marketplace server entry point.
//!
//! Starts the Axum HTTP server with the REST endpoints.

use std::sync::Arc;

use anyhow::Context;
use axum::Router;
use sqlx::postgres::PgPoolOptions;
use tower_http::cors::CorsLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use contribution_marketplace::api;
use contribution_marketplace::app_state::AppState;
use contribution_marketplace::config::{LogFormat, MarketplaceConfig, StorageBackend};
use contribution_marketplace::storage::{Dataset, MemoryStorage, PostgresStorage, Storage};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    let config = MarketplaceConfig::from_env()?;

    // Initialize tracing
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    match config.log_format {
        LogFormat::Json => tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init(),
        LogFormat::Text => tracing_subscriber::fmt().with_env_filter(filter).init(),
    }
    tracing::info!(addr = %config.listen_addr, "starting contribution-marketplace");

    // Build storage layer
    let storage: Arc<dyn Storage> = match config.storage_backend {
        StorageBackend::Postgres => {
            let pool = PgPoolOptions::new()
                .max_connections(config.database_max_connections)
                .min_connections(config.database_min_connections)
                .acquire_timeout(config.database_connect_timeout())
                .connect(&config.database_url)
                .await
                .context("cannot connect to the database")?;
            let storage = PostgresStorage::new(pool);
            if config.database_run_migrations {
                storage.migrate().await?;
                tracing::info!("database migrations applied");
            }
            Arc::new(storage)
        }
        StorageBackend::Memory => {
            tracing::warn!("using in-memory storage, data is lost on shutdown");
            Arc::new(MemoryStorage::new(Dataset::default()))
        }
    };

    // Build application state
    let app_state = AppState::new(storage, config.default_page_size);

    // Build router
    let app = Router::new()
        .merge(api::build_router())
        .layer(TimeoutLayer::new(config.request_timeout()))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(app_state);

    // Start server
    let listener = tokio::net::TcpListener::bind(config.listen_addr).await?;
    tracing::info!(addr = %config.listen_addr, "server listening");

    axum::serve(listener, app).await?;

    Ok(())
}
