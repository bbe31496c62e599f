//! Common routes: health.

use crate::error::AppError;
use crate::session::SessionProvider;
use axum::{extract::State, http::StatusCode, routing::get, Router};
use std::sync::Arc;

async fn check(provider: &dyn SessionProvider) -> Result<(), AppError> {
    let mut session = provider.acquire().await?;
    session.ping().await
}

/// 200 on a successful round-trip to the store, 500 otherwise. Both with an empty body.
async fn health(State(provider): State<Arc<dyn SessionProvider>>) -> StatusCode {
    match check(provider.as_ref()).await {
        Ok(()) => StatusCode::OK,
        Err(e) => {
            tracing::error!(error = %e, "health check failed");
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

/// GET /health.
pub fn common_routes(provider: Arc<dyn SessionProvider>) -> Router {
    Router::new().route("/health", get(health)).with_state(provider)
}
