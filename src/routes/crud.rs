//! Route generator: the six CRUD routes of one route group.

use crate::handlers::crud::{create, delete_all, delete_one, get_one, list, update_one};
use crate::session::SessionProvider;
use crate::state::CrudState;
use crate::routes::RouteGroup;
use axum::{routing::get, Router};
use std::sync::Arc;

/// Routes relative to the group's mount point: `/` and `/:pk`.
pub fn crud_routes(group: Arc<RouteGroup>, provider: Arc<dyn SessionProvider>, max_limit: Option<u64>) -> Router {
    let state = CrudState {
        group,
        provider,
        max_limit,
    };
    Router::new()
        .route("/", get(list).post(create).delete(delete_all))
        .route("/:pk", get(get_one).patch(update_one).delete(delete_one))
        .with_state(state)
}
