use std::sync::Arc;

use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower_http::cors::CorsLayer;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use tjm_core::{Pipeline, PipelineConfig};
use tjm_db::{Database, DatabaseConfig};
use tjm_server::routes;
use tjm_server::state::AppState;

const MAX_BODY_BYTES: usize = 64 * 1024;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("tjm=info".parse()?))
        .with_target(false)
        .init();

    let api_key = std::env::var("TJM_SERVER_API_KEY")
        .ok()
        .filter(|k| !k.is_empty());
    if api_key.is_none() {
        tracing::warn!("TJM_SERVER_API_KEY not set, /v1 endpoints are unauthenticated");
    }
    let port = std::env::var("TJM_SERVER_PORT").unwrap_or_else(|_| "3000".to_string());
    let addr = format!("0.0.0.0:{port}");

    let config = PipelineConfig::from_env()?;
    let primary = match DatabaseConfig::from_env()? {
        Some(db_config) => {
            let db = Database::connect_lazy(&db_config)?;
            if let Err(e) = db.migrate().await {
                tracing::warn!("Could not apply migrations: {e}");
            }
            Some(db.offers())
        }
        None => {
            tracing::info!("DATABASE_URL not set, running with the backup sink only");
            None
        }
    };

    let state = Arc::new(AppState::new(Pipeline::new(config, primary), api_key));
    let shutdown = state.shutdown.clone();

    let app = routes::router(state)
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    tracing::info!("Starting server on {addr}");
    let listener = TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(shutdown))
        .await?;

    Ok(())
}

async fn shutdown_signal(shutdown: CancellationToken) {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {e}");
    }
    tracing::info!("Shutdown signal received");
    shutdown.cancel();
}
