//! CRUD API server: built-in models plus optional models from CRUDAPI_MODELS.
//!
//! Run from repo root: `cargo run -p application`

mod models;

use crudapi::{
    build_router, ensure_database_exists, ensure_tables, init_tracing, load_from_path, PgSessionProvider, Settings,
};
use std::sync::Arc;
use tokio::net::TcpListener;

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
    }
    tracing::info!("shutting down");
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let settings = Settings::from_env()?;
    init_tracing(&settings);

    let mut registry = models::registry()?;
    if let Some(path) = &settings.models_path {
        registry.merge(load_from_path(path).await?)?;
    }

    ensure_database_exists(&settings.database_url).await?;
    let provider = PgSessionProvider::connect(&settings.database_url, settings.database_max_connections).await?;
    ensure_tables(provider.pool(), &registry).await?;

    let app = build_router(&registry, Arc::new(provider), &settings)?;
    let listener = TcpListener::bind(settings.bind_addr()).await?;
    tracing::info!("crudapi listening on http://{}", listener.local_addr()?);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}
