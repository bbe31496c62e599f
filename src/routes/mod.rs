//! Router assembly: one route group per registered model, mounted under
//! `/{category}/{ModelName}`, plus health and the OpenAPI document.

mod common;
mod crud;
mod group;

pub use common::common_routes;
pub use crud::crud_routes;
pub use group::RouteGroup;

use crate::error::SchemaDerivationError;
use crate::model::ModelRegistry;
use crate::openapi;
use crate::session::SessionProvider;
use crate::settings::Settings;
use axum::{extract::State, routing::get, Json, Router};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::{limit::RequestBodyLimitLayer, trace::TraceLayer};
use utoipa::openapi::OpenApi;

/// One route group per registered model, categories in name order.
pub fn build_route_groups(registry: &ModelRegistry) -> Result<Vec<RouteGroup>, SchemaDerivationError> {
    registry
        .list_categories()
        .values()
        .flatten()
        .map(|model| RouteGroup::new(model.clone()))
        .collect()
}

/// Mount every group's routes at its `/{category}/{ModelName}` path.
pub fn crud_router(groups: &[Arc<RouteGroup>], provider: Arc<dyn SessionProvider>, max_limit: Option<u64>) -> Router {
    let mut router = Router::new();
    for group in groups {
        let path = group.path();
        tracing::info!(path = %path, tag = %group.tag, "mounting route group");
        router = router.nest(&path, crud_routes(Arc::clone(group), Arc::clone(&provider), max_limit));
    }
    router
}

async fn openapi_json(State(doc): State<Arc<OpenApi>>) -> Json<OpenApi> {
    Json(doc.as_ref().clone())
}

/// Full application router: health, CRUD routes (under the optional prefix), GET /openapi.json.
pub fn build_router(
    registry: &ModelRegistry,
    provider: Arc<dyn SessionProvider>,
    settings: &Settings,
) -> Result<Router, SchemaDerivationError> {
    let groups: Vec<Arc<RouteGroup>> = build_route_groups(registry)?.into_iter().map(Arc::new).collect();
    let doc = Arc::new(openapi::document(&groups, &settings.api_prefix));
    let api = crud_router(&groups, Arc::clone(&provider), settings.max_limit);
    // nest("") is rejected by axum
    let api = if settings.api_prefix.is_empty() {
        api
    } else {
        Router::new().nest(&settings.api_prefix, api)
    };
    let router = Router::new()
        .merge(common_routes(provider))
        .merge(api)
        .merge(Router::new().route("/openapi.json", get(openapi_json)).with_state(doc))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(RequestBodyLimitLayer::new(settings.body_limit)),
        );
    Ok(router)
}
