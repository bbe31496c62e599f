//! Shared state of one mounted route group.

use crate::routes::RouteGroup;
use crate::session::SessionProvider;
use std::sync::Arc;

#[derive(Clone)]
pub struct CrudState {
    pub group: Arc<RouteGroup>,
    pub provider: Arc<dyn SessionProvider>,
    /// Ceiling for `limit`; None means unbounded.
    pub max_limit: Option<u64>,
}
