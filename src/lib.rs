//! crudapi: generated REST CRUD endpoints for declared relational data models.

pub mod case;
pub mod error;
pub mod handlers;
pub mod model;
pub mod openapi;
pub mod pagination;
pub mod routes;
pub mod schema;
pub mod service;
pub mod session;
pub mod settings;
pub mod sql;
pub mod state;
pub mod store;

pub use error::{AppError, FieldError, ModelError, SchemaDerivationError, SettingsError, ValidationError};
pub use model::{load_from_path, FieldDef, FieldDefault, FieldKind, ModelDefinition, ModelRegistry};
pub use pagination::PaginationRequest;
pub use routes::{build_route_groups, build_router, common_routes, crud_router, crud_routes, RouteGroup};
pub use schema::{DerivedSchema, ModelSchemas, Purpose};
pub use service::CrudService;
pub use session::{MemorySessionProvider, PgSessionProvider, Record, Session, SessionProvider};
pub use settings::{init_tracing, Settings};
pub use state::CrudState;
pub use store::{ensure_database_exists, ensure_tables};
